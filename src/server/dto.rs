use serde::{Deserialize, Serialize};

use crate::types::{AvailabilityEntry, AvailabilityRequest, Employee, ShiftType};

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub employee_number: Option<String>,
}

/// Omitted fields are left unchanged. An empty `employee_number` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmployeeRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub employee_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateShiftTypeRequest {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub color: String,
}

/// Exactly one of the two lists must be non-empty.
#[derive(Debug, Default, Deserialize)]
pub struct IssueRequestsRequest {
    #[serde(default)]
    pub employee_ids: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BindRequestRequest {
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GridParams {
    pub start: String,
    pub end: String,
}

/// A free-form window (`start_time` and `end_time`), one shift type, or
/// several shift types for `day`.
#[derive(Debug, Deserialize)]
pub struct SubmitAvailabilityRequest {
    pub day: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub shift_type_id: Option<String>,
    #[serde(default)]
    pub shift_type_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct IssuedRequestResponse {
    #[serde(flatten)]
    pub request: AvailabilityRequest,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct BatchItemResponse {
    pub shift_type_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<AvailabilityEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmployeeDetailResponse {
    #[serde(flatten)]
    pub employee: Employee,
    pub requests: Vec<AvailabilityRequest>,
}

#[derive(Debug, Serialize)]
pub struct RequestPageResponse {
    pub request: AvailabilityRequest,
    pub employee: Employee,
    pub shift_types: Vec<ShiftType>,
}
