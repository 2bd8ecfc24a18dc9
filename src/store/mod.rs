mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::NaiveDate;

use crate::error::Result;
use crate::types::*;

/// Check run against the entries already stored for one (request, day)
/// before a new entry is inserted.
pub type EntryCheck<'a> = &'a dyn Fn(&[AvailabilityEntry]) -> Result<()>;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Scheduler operations
    fn create_scheduler(&self, scheduler: &Scheduler) -> Result<()>;
    fn get_scheduler(&self, id: &str) -> Result<Option<Scheduler>>;
    fn list_schedulers(&self) -> Result<Vec<Scheduler>>;

    // Scheduler credential operations
    fn create_scheduler_token(&self, token: &SchedulerToken) -> Result<()>;
    fn get_scheduler_token_by_lookup(&self, lookup: &str) -> Result<Option<SchedulerToken>>;
    fn update_scheduler_token_last_used(&self, id: &str) -> Result<()>;

    // Employee operations
    /// Inserts the employee and re-keys the scheduler's email-keyed requests
    /// for its address to it, in one transaction.
    fn create_employee(&self, employee: &Employee) -> Result<()>;
    fn get_employee(&self, scheduler_id: &str, id: &str) -> Result<Option<Employee>>;
    /// Unscoped lookup for the token-authenticated flow.
    fn get_employee_by_id(&self, id: &str) -> Result<Option<Employee>>;
    fn list_employees(&self, scheduler_id: &str) -> Result<Vec<Employee>>;
    /// Writes the employee. Email-keyed requests for its old or new address
    /// are re-keyed to it in the same transaction.
    fn update_employee(&self, employee: &Employee) -> Result<()>;
    /// Removes the employee, every request issued to it and every entry
    /// under those requests in one transaction.
    fn delete_employee_cascade(&self, scheduler_id: &str, id: &str) -> Result<bool>;

    // Shift type operations
    fn create_shift_type(&self, shift_type: &ShiftType) -> Result<()>;
    fn get_shift_type(&self, scheduler_id: &str, id: &str) -> Result<Option<ShiftType>>;
    fn list_shift_types(&self, scheduler_id: &str) -> Result<Vec<ShiftType>>;
    fn delete_shift_type(&self, scheduler_id: &str, id: &str) -> Result<bool>;

    // Availability request operations
    /// Persists the request and returns it as stored. An email-keyed request
    /// whose address belongs to an employee of the scheduler is stored
    /// employee-keyed.
    fn create_request(&self, request: &AvailabilityRequest) -> Result<AvailabilityRequest>;
    fn get_request(&self, id: &str) -> Result<Option<AvailabilityRequest>>;
    fn list_requests(&self, scheduler_id: &str) -> Result<Vec<AvailabilityRequest>>;
    fn list_employee_requests(&self, employee: &Employee) -> Result<Vec<AvailabilityRequest>>;
    fn bind_request(&self, scheduler_id: &str, id: &str, employee_id: &str) -> Result<bool>;
    fn delete_request(&self, scheduler_id: &str, id: &str) -> Result<bool>;

    // Availability entry operations
    /// Inserts `entry` if `check` accepts the entries already stored for the
    /// same request and day. Read, check and insert share one write
    /// transaction.
    fn insert_entry_checked(&self, entry: &AvailabilityEntry, check: EntryCheck<'_>) -> Result<()>;
    fn list_request_entries(&self, request_id: &str) -> Result<Vec<AvailabilityEntry>>;
    fn list_employee_entries(&self, employee: &Employee) -> Result<Vec<AvailabilityEntry>>;
    /// Entries of every employee of the scheduler with `start <= day <= end`.
    fn list_scheduler_entries(
        &self,
        scheduler_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OwnedEntry>>;
    fn delete_entry(&self, request_id: &str, id: &str) -> Result<bool>;
}
