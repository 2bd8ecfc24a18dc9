use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{Issuer, required};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Employee, Scheduler};

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub employee_number: Option<String>,
}

/// Fields to change on an employee. `employee_number: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct EmployeePatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub employee_number: Option<Option<String>>,
}

/// Lowercases and trims an address, rejecting anything without a local
/// part and a domain.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(Error::Validation(format!("invalid email address '{email}'"))),
    }
}

fn normalize_employee_number(number: Option<String>) -> Option<String> {
    number
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Owns schedulers and the employees scoped to them.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn Store>,
    issuer: Issuer,
}

impl Registry {
    pub fn new(store: Arc<dyn Store>, issuer: Issuer) -> Self {
        Self { store, issuer }
    }

    pub fn create_scheduler(&self, name: &str) -> Result<Scheduler> {
        let scheduler = Scheduler {
            id: Uuid::new_v4().to_string(),
            name: required(name, "name")?,
            created_at: Utc::now(),
        };
        self.store.create_scheduler(&scheduler)?;
        tracing::info!(scheduler_id = %scheduler.id, "Created scheduler '{}'", scheduler.name);
        Ok(scheduler)
    }

    pub fn get_scheduler(&self, id: &str) -> Result<Scheduler> {
        self.store.get_scheduler(id)?.ok_or(Error::NotFound)
    }

    pub fn add_employee(&self, scheduler_id: &str, new: NewEmployee) -> Result<Employee> {
        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            scheduler_id: scheduler_id.to_string(),
            email: normalize_email(&new.email)?,
            first_name: required(&new.first_name, "first name")?,
            last_name: required(&new.last_name, "last name")?,
            employee_number: normalize_employee_number(new.employee_number),
            created_at: now,
            updated_at: now,
        };

        self.store.create_employee(&employee)?;
        Ok(employee)
    }

    pub fn get_employee(&self, scheduler_id: &str, employee_id: &str) -> Result<Employee> {
        self.store
            .get_employee(scheduler_id, employee_id)?
            .ok_or(Error::NotFound)
    }

    pub fn update_employee(
        &self,
        scheduler_id: &str,
        employee_id: &str,
        patch: EmployeePatch,
    ) -> Result<Employee> {
        let mut employee = self.get_employee(scheduler_id, employee_id)?;

        if let Some(email) = patch.email {
            employee.email = normalize_email(&email)?;
        }
        if let Some(first_name) = patch.first_name {
            employee.first_name = required(&first_name, "first name")?;
        }
        if let Some(last_name) = patch.last_name {
            employee.last_name = required(&last_name, "last name")?;
        }
        if let Some(number) = patch.employee_number {
            employee.employee_number = normalize_employee_number(number);
        }
        employee.updated_at = Utc::now();

        self.store.update_employee(&employee)?;
        Ok(employee)
    }

    /// Deletes the employee together with its requests and their entries.
    pub fn remove_employee(&self, scheduler_id: &str, employee_id: &str) -> Result<()> {
        if !self.store.delete_employee_cascade(scheduler_id, employee_id)? {
            return Err(Error::NotFound);
        }
        tracing::info!(scheduler_id, employee_id, "Removed employee");
        Ok(())
    }

    pub fn list_employees(&self, scheduler_id: &str) -> Result<Vec<Employee>> {
        self.store.list_employees(scheduler_id)
    }

    pub fn resolve_employee_by_token(&self, token: &str) -> Result<Employee> {
        Ok(self.issuer.resolve(token)?.employee)
    }
}
