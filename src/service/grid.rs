use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::Issuer;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{AvailabilityEntry, Employee, ShiftType};

/// Widest range a scheduler grid may cover.
const MAX_GRID_DAYS: i64 = 366;

#[derive(Debug, Clone, Serialize)]
pub struct GridEntry {
    #[serde(flatten)]
    pub entry: AvailabilityEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_type: Option<ShiftType>,
}

impl GridEntry {
    /// Start used for ordering: the shift type's start when one is bound.
    #[must_use]
    pub fn effective_start(&self) -> NaiveDateTime {
        match &self.shift_type {
            Some(st) => self.entry.day.and_time(st.start_time),
            None => self.entry.start,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeAvailability {
    pub employee: Employee,
    pub entries: Vec<GridEntry>,
}

impl EmployeeAvailability {
    pub fn entries_on(&self, day: NaiveDate) -> impl Iterator<Item = &GridEntry> {
        self.entries.iter().filter(move |e| e.entry.day == day)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerGrid {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: Vec<EmployeeAvailability>,
}

impl SchedulerGrid {
    /// Every day in the grid, inclusive of both ends.
    #[must_use]
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }
}

fn sort_entries(entries: &mut [GridEntry]) {
    entries.sort_by(|a, b| {
        (a.entry.day, a.effective_start(), &a.entry.id).cmp(&(
            b.entry.day,
            b.effective_start(),
            &b.entry.id,
        ))
    });
}

fn attach(entry: AvailabilityEntry, shift_types: &HashMap<String, ShiftType>) -> GridEntry {
    let shift_type = entry
        .shift_type_id
        .as_ref()
        .and_then(|id| shift_types.get(id))
        .cloned();
    GridEntry { entry, shift_type }
}

/// Read-only projection of the ledger for display.
#[derive(Clone)]
pub struct GridView {
    store: Arc<dyn Store>,
    issuer: Issuer,
}

impl GridView {
    pub fn new(store: Arc<dyn Store>, issuer: Issuer) -> Self {
        Self { store, issuer }
    }

    /// One row per employee of the scheduler, including those with nothing
    /// submitted in `[start, end]`.
    pub fn grid_for_scheduler(
        &self,
        scheduler_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SchedulerGrid> {
        if start > end {
            return Err(Error::Validation("start date must not be after end date".to_string()));
        }
        if (end - start).num_days() >= MAX_GRID_DAYS {
            return Err(Error::Validation(format!(
                "date range must not exceed {MAX_GRID_DAYS} days"
            )));
        }

        let shift_types = self.shift_type_index(scheduler_id)?;
        let employees = self.store.list_employees(scheduler_id)?;

        let mut by_employee: HashMap<String, Vec<GridEntry>> = HashMap::new();
        for owned in self.store.list_scheduler_entries(scheduler_id, start, end)? {
            by_employee
                .entry(owned.employee_id)
                .or_default()
                .push(attach(owned.entry, &shift_types));
        }

        let rows = employees
            .into_iter()
            .map(|employee| {
                let mut entries = by_employee.remove(&employee.id).unwrap_or_default();
                sort_entries(&mut entries);
                EmployeeAvailability { employee, entries }
            })
            .collect();

        Ok(SchedulerGrid { start, end, rows })
    }

    /// The entries recorded under one token, for the employee-facing page.
    pub fn grid_for_token(&self, token: &str) -> Result<EmployeeAvailability> {
        let resolved = self.issuer.resolve(token)?;
        let shift_types = self.shift_type_index(&resolved.request.scheduler_id)?;

        let mut entries: Vec<GridEntry> = self
            .store
            .list_request_entries(&resolved.request.id)?
            .into_iter()
            .map(|e| attach(e, &shift_types))
            .collect();
        sort_entries(&mut entries);

        Ok(EmployeeAvailability {
            employee: resolved.employee,
            entries,
        })
    }

    fn shift_type_index(&self, scheduler_id: &str) -> Result<HashMap<String, ShiftType>> {
        Ok(self
            .store
            .list_shift_types(scheduler_id)?
            .into_iter()
            .map(|st| (st.id.clone(), st))
            .collect())
    }
}
