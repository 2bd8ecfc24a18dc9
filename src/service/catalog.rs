use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use super::issuer::lookup_request;
use super::required;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{ShiftColor, ShiftType, TimeRange};

#[derive(Debug, Clone)]
pub struct NewShiftType {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub color: ShiftColor,
}

/// Named shift templates. Shift types may overlap each other freely.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn add_shift_type(&self, scheduler_id: &str, new: NewShiftType) -> Result<ShiftType> {
        let name = required(&new.name, "name")?;
        let window = TimeRange::new(new.start_time, new.end_time)?;

        let shift_type = ShiftType {
            id: Uuid::new_v4().to_string(),
            scheduler_id: scheduler_id.to_string(),
            name,
            start_time: window.start,
            end_time: window.end,
            color: new.color,
            created_at: Utc::now(),
        };

        self.store.create_shift_type(&shift_type)?;
        Ok(shift_type)
    }

    /// Entries that referenced the shift type keep their interval and lose
    /// the reference.
    pub fn remove_shift_type(&self, scheduler_id: &str, id: &str) -> Result<()> {
        if !self.store.delete_shift_type(scheduler_id, id)? {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    pub fn list_shift_types(&self, scheduler_id: &str) -> Result<Vec<ShiftType>> {
        self.store.list_shift_types(scheduler_id)
    }

    /// Catalog of the scheduler that owns `employee_id`.
    pub fn list_shift_types_for_employee_owner(&self, employee_id: &str) -> Result<Vec<ShiftType>> {
        let employee = self
            .store
            .get_employee_by_id(employee_id)?
            .ok_or(Error::NotFound)?;
        self.store.list_shift_types(&employee.scheduler_id)
    }

    pub fn list_shift_types_for_token(&self, token: &str) -> Result<Vec<ShiftType>> {
        let request = lookup_request(self.store.as_ref(), token)?.ok_or(Error::NotFound)?;
        self.store.list_shift_types(&request.scheduler_id)
    }
}
