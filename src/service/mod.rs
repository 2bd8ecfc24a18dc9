//! The availability reconciliation engine.
//!
//! Each component owns an injected `Arc<dyn Store>`; none of them keep
//! state between calls.

mod catalog;
mod grid;
mod issuer;
mod ledger;
mod registry;

pub use catalog::{Catalog, NewShiftType};
pub use grid::{EmployeeAvailability, GridEntry, GridView, SchedulerGrid};
pub use issuer::{Issuer, ResolvedRequest};
pub use ledger::{Ledger, check_entry, find_conflict};
pub use registry::{EmployeePatch, NewEmployee, Registry, normalize_email};

use crate::error::{Error, Result};

/// Trims `value` and rejects it when empty.
fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
