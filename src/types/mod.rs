mod color;
mod interval;
mod models;

pub use color::ShiftColor;
pub use interval::{Interval, TimeRange};
pub use models::*;
