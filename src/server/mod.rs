pub mod dto;
mod employee;
pub mod response;
mod router;
mod scheduler;
pub mod validation;

pub use employee::employee_router;
pub use router::{AppState, create_router};
pub use scheduler::scheduler_router;
