use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{AvailabilityEntry, AvailabilityRequest, Employee, Interval, TimeRange};

use super::issuer::lookup_request;

/// Attempts per submission when the store reports contention.
const MAX_ATTEMPTS: u32 = 3;

/// First stored entry whose interval overlaps `candidate`.
#[must_use]
pub fn find_conflict<'a>(
    candidate: &Interval,
    existing: &'a [AvailabilityEntry],
) -> Option<&'a AvailabilityEntry> {
    existing.iter().find(|e| candidate.overlaps(&e.interval()))
}

/// Rejects `candidate` when it repeats a shift type already chosen for the
/// day or overlaps any stored entry. `existing` holds the entries of the
/// same request and day.
pub fn check_entry(candidate: &AvailabilityEntry, existing: &[AvailabilityEntry]) -> Result<()> {
    if let Some(shift_type_id) = &candidate.shift_type_id {
        if existing
            .iter()
            .any(|e| e.shift_type_id.as_ref() == Some(shift_type_id))
        {
            return Err(Error::Conflict(
                "shift type already selected for this day".to_string(),
            ));
        }
    }

    if let Some(other) = find_conflict(&candidate.interval(), existing) {
        return Err(Error::Conflict(format!(
            "overlaps existing availability from {} to {}",
            other.start.format("%H:%M"),
            other.end.format("%H:%M")
        )));
    }
    Ok(())
}

/// Runs `op` again while it fails with a transient storage error.
fn with_retry<T>(mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                tracing::warn!(attempt, "Retrying availability write: {e}");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Records availability entries, keeping each request's entries on a day
/// pairwise disjoint.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn Store>,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records a free-form window on `day`.
    pub fn submit(&self, token: &str, day: NaiveDate, range: TimeRange) -> Result<AvailabilityEntry> {
        // A TimeRange built by struct literal skips `TimeRange::new`.
        if range.start >= range.end {
            return Err(Error::InvalidRange);
        }
        let request = self.authorize(token)?;
        self.record(&request, day, range, None)
    }

    /// Records the window of one of the scheduler's shift types on `day`.
    pub fn submit_shift_type(
        &self,
        token: &str,
        day: NaiveDate,
        shift_type_id: &str,
    ) -> Result<AvailabilityEntry> {
        let request = self.authorize(token)?;
        self.record_shift_type(&request, day, shift_type_id)
    }

    /// Submits several shift types for one day. Each item commits or fails
    /// on its own; the outer error covers only the token and an empty list.
    pub fn submit_shift_types(
        &self,
        token: &str,
        day: NaiveDate,
        shift_type_ids: &[String],
    ) -> Result<Vec<Result<AvailabilityEntry>>> {
        let request = self.authorize(token)?;
        if shift_type_ids.is_empty() {
            return Err(Error::Validation("at least one shift type is required".to_string()));
        }

        Ok(shift_type_ids
            .iter()
            .map(|id| self.record_shift_type(&request, day, id))
            .collect())
    }

    /// Deletes an entry recorded under `token`.
    pub fn remove(&self, entry_id: &str, token: &str) -> Result<()> {
        let request = self.authorize(token)?;
        if !self.store.delete_entry(&request.id, entry_id)? {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    pub fn list_for_request(&self, token: &str) -> Result<Vec<AvailabilityEntry>> {
        let request = self.authorize(token)?;
        self.store.list_request_entries(&request.id)
    }

    /// Everything an employee has submitted across all of their requests.
    pub fn list_for_employee(
        &self,
        scheduler_id: &str,
        employee_id: &str,
    ) -> Result<Vec<AvailabilityEntry>> {
        let employee: Employee = self
            .store
            .get_employee(scheduler_id, employee_id)?
            .ok_or(Error::NotFound)?;
        self.store.list_employee_entries(&employee)
    }

    fn authorize(&self, token: &str) -> Result<AvailabilityRequest> {
        lookup_request(self.store.as_ref(), token)?.ok_or(Error::InvalidToken)
    }

    fn record_shift_type(
        &self,
        request: &AvailabilityRequest,
        day: NaiveDate,
        shift_type_id: &str,
    ) -> Result<AvailabilityEntry> {
        let shift_type = self
            .store
            .get_shift_type(&request.scheduler_id, shift_type_id)?
            .ok_or(Error::NotFound)?;
        let range = TimeRange::new(shift_type.start_time, shift_type.end_time)?;
        self.record(request, day, range, Some(shift_type.id))
    }

    fn record(
        &self,
        request: &AvailabilityRequest,
        day: NaiveDate,
        range: TimeRange,
        shift_type_id: Option<String>,
    ) -> Result<AvailabilityEntry> {
        let interval = range.on(day);
        let entry = AvailabilityEntry {
            id: Uuid::new_v4().to_string(),
            request_id: request.id.clone(),
            day,
            start: interval.start,
            end: interval.end,
            shift_type_id,
            created_at: Utc::now(),
        };

        let check = |existing: &[AvailabilityEntry]| check_entry(&entry, existing);
        let result = with_retry(|| self.store.insert_entry_checked(&entry, &check));

        match result {
            Ok(()) => Ok(entry),
            Err(e @ Error::Conflict(_)) => {
                tracing::debug!(request_id = %request.id, %day, "Rejected availability: {e}");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
