use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Interval, ShiftColor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// API credential for a scheduler session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerToken {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub scheduler_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub scheduler_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftType {
    pub id: String,
    pub scheduler_id: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub color: ShiftColor,
    pub created_at: DateTime<Utc>,
}

/// Who an availability request was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestDescriptor {
    EmployeeKeyed { employee_id: String },
    /// Legacy invitations addressed to a bare email that may not have an
    /// employee row yet.
    EmailKeyed { email: String },
}

/// An outstanding invitation to state availability. The id is the bearer
/// token handed to the employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub id: String,
    pub scheduler_id: String,
    #[serde(flatten)]
    pub descriptor: RequestDescriptor,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub id: String,
    pub request_id: String,
    pub day: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_type_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityEntry {
    #[must_use]
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end,
        }
    }
}

/// An entry tagged with the employee it was resolved to.
#[derive(Debug, Clone)]
pub struct OwnedEntry {
    pub employee_id: String,
    pub entry: AvailabilityEntry,
}
