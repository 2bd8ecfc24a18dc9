use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use super::schema::SCHEMA;
use super::{EntryCheck, Store};
use crate::error::{Error, Result};
use crate::types::*;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database. Used by tests and tooling.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn local_datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Maps a unique-constraint failure on `employees` to the field that collided.
fn employee_write_error(err: rusqlite::Error) -> Error {
    if !is_unique_violation(&err) {
        return Error::from(err);
    }
    let message = err.to_string();
    if message.contains("employee_number") {
        Error::Duplicate("employee number already in use".to_string())
    } else if message.contains("email") {
        Error::Duplicate("email already in use".to_string())
    } else {
        Error::Duplicate("employee already exists".to_string())
    }
}

const EMPLOYEE_COLUMNS: &str =
    "id, scheduler_id, email, first_name, last_name, employee_number, created_at, updated_at";

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        scheduler_id: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        employee_number: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const SHIFT_TYPE_COLUMNS: &str = "id, scheduler_id, name, start_time, end_time, color, created_at";

fn shift_type_from_row(row: &Row<'_>) -> rusqlite::Result<ShiftType> {
    let color: String = row.get(5)?;
    let color = ShiftColor::parse(&color).ok_or_else(|| {
        conversion_error(
            5,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown shift color '{color}'"),
            ),
        )
    })?;

    Ok(ShiftType {
        id: row.get(0)?,
        scheduler_id: row.get(1)?,
        name: row.get(2)?,
        start_time: time_column(row, 3)?,
        end_time: time_column(row, 4)?,
        color,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

const REQUEST_COLUMNS: &str = "id, scheduler_id, employee_id, email, created_at";

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<AvailabilityRequest> {
    let employee_id: Option<String> = row.get(2)?;
    let email: Option<String> = row.get(3)?;
    let descriptor = match (employee_id, email) {
        (Some(employee_id), _) => RequestDescriptor::EmployeeKeyed { employee_id },
        (None, Some(email)) => RequestDescriptor::EmailKeyed { email },
        (None, None) => {
            return Err(conversion_error(
                2,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "availability request has neither employee nor email",
                ),
            ));
        }
    };

    Ok(AvailabilityRequest {
        id: row.get(0)?,
        scheduler_id: row.get(1)?,
        descriptor,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

const ENTRY_COLUMNS: &str = "a.id, a.request_id, a.day, a.start_at, a.end_at, a.shift_type_id, a.created_at";

/// Reads an entry whose columns start at `offset`.
fn entry_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<AvailabilityEntry> {
    Ok(AvailabilityEntry {
        id: row.get(offset)?,
        request_id: row.get(offset + 1)?,
        day: date_column(row, offset + 2)?,
        start: local_datetime_column(row, offset + 3)?,
        end: local_datetime_column(row, offset + 4)?,
        shift_type_id: row.get(offset + 5)?,
        created_at: parse_datetime(&row.get::<_, String>(offset + 6)?),
    })
}

fn query_entries<P: rusqlite::Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> Result<Vec<AvailabilityEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM availability_entries a {filter} ORDER BY a.day, a.start_at"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, |row| entry_from_row(row, 0))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Requests keyed to one employee.
const EMPLOYEE_REQUEST_FILTER: &str = "scheduler_id = ?1 AND employee_id = ?2";

/// Re-keys the scheduler's email-keyed requests for `email` to `employee_id`.
fn claim_email_requests(
    conn: &Connection,
    scheduler_id: &str,
    employee_id: &str,
    email: &str,
) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE availability_requests SET employee_id = ?1, email = NULL
         WHERE scheduler_id = ?2 AND employee_id IS NULL AND email = ?3",
        params![employee_id, scheduler_id, email],
    )?;
    Ok(rows)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Scheduler operations

    fn create_scheduler(&self, scheduler: &Scheduler) -> Result<()> {
        self.conn().execute(
            "INSERT INTO schedulers (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![
                scheduler.id,
                scheduler.name,
                format_datetime(&scheduler.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_scheduler(&self, id: &str) -> Result<Option<Scheduler>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, created_at FROM schedulers WHERE id = ?1",
            params![id],
            |row| {
                Ok(Scheduler {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_schedulers(&self) -> Result<Vec<Scheduler>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM schedulers ORDER BY name")?;

        let rows = stmt.query_map([], |row| {
            Ok(Scheduler {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Scheduler credential operations

    fn create_scheduler_token(&self, token: &SchedulerToken) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO scheduler_tokens (id, token_hash, token_lookup, scheduler_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.scheduler_id,
                format_datetime(&token.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_scheduler_token_by_lookup(&self, lookup: &str) -> Result<Option<SchedulerToken>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, scheduler_id, created_at, last_used_at
             FROM scheduler_tokens WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(SchedulerToken {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    scheduler_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    last_used_at: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_scheduler_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE scheduler_tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Employee operations

    fn create_employee(&self, employee: &Employee) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO employees (id, scheduler_id, email, first_name, last_name, employee_number, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                employee.id,
                employee.scheduler_id,
                employee.email,
                employee.first_name,
                employee.last_name,
                employee.employee_number,
                format_datetime(&employee.created_at),
                format_datetime(&employee.updated_at),
            ],
        )
        .map_err(employee_write_error)?;

        let claimed =
            claim_email_requests(&tx, &employee.scheduler_id, &employee.id, &employee.email)?;
        tx.commit()?;

        if claimed > 0 {
            tracing::debug!(employee_id = %employee.id, claimed, "Re-keyed email requests");
        }
        Ok(())
    }

    fn get_employee(&self, scheduler_id: &str, id: &str) -> Result<Option<Employee>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1 AND scheduler_id = ?2"),
            params![id, scheduler_id],
            employee_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_employee_by_id(&self, id: &str) -> Result<Option<Employee>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"),
            params![id],
            employee_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_employees(&self, scheduler_id: &str) -> Result<Vec<Employee>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE scheduler_id = ?1
             ORDER BY last_name, first_name, id"
        ))?;

        let rows = stmt.query_map(params![scheduler_id], employee_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_employee(&self, employee: &Employee) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT email FROM employees WHERE id = ?1 AND scheduler_id = ?2",
                params![employee.id, employee.scheduler_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(previous) = previous else {
            return Err(Error::NotFound);
        };

        tx.execute(
            "UPDATE employees SET email = ?1, first_name = ?2, last_name = ?3, employee_number = ?4, updated_at = ?5
             WHERE id = ?6 AND scheduler_id = ?7",
            params![
                employee.email,
                employee.first_name,
                employee.last_name,
                employee.employee_number,
                format_datetime(&employee.updated_at),
                employee.id,
                employee.scheduler_id,
            ],
        )
        .map_err(employee_write_error)?;

        claim_email_requests(&tx, &employee.scheduler_id, &employee.id, &previous)?;
        claim_email_requests(&tx, &employee.scheduler_id, &employee.id, &employee.email)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_employee_cascade(&self, scheduler_id: &str, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM employees WHERE id = ?1 AND scheduler_id = ?2",
                params![id, scheduler_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Ok(false);
        }

        tx.execute(
            &format!(
                "DELETE FROM availability_entries WHERE request_id IN
                 (SELECT id FROM availability_requests WHERE {EMPLOYEE_REQUEST_FILTER})"
            ),
            params![scheduler_id, id],
        )?;
        tx.execute(
            &format!("DELETE FROM availability_requests WHERE {EMPLOYEE_REQUEST_FILTER}"),
            params![scheduler_id, id],
        )?;
        tx.execute(
            "DELETE FROM employees WHERE id = ?1 AND scheduler_id = ?2",
            params![id, scheduler_id],
        )?;

        tx.commit()?;
        Ok(true)
    }

    // Shift type operations

    fn create_shift_type(&self, shift_type: &ShiftType) -> Result<()> {
        self.conn().execute(
            "INSERT INTO shift_types (id, scheduler_id, name, start_time, end_time, color, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                shift_type.id,
                shift_type.scheduler_id,
                shift_type.name,
                shift_type.start_time.format(TIME_FORMAT).to_string(),
                shift_type.end_time.format(TIME_FORMAT).to_string(),
                shift_type.color.as_str(),
                format_datetime(&shift_type.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_shift_type(&self, scheduler_id: &str, id: &str) -> Result<Option<ShiftType>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SHIFT_TYPE_COLUMNS} FROM shift_types WHERE id = ?1 AND scheduler_id = ?2"),
            params![id, scheduler_id],
            shift_type_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_shift_types(&self, scheduler_id: &str) -> Result<Vec<ShiftType>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SHIFT_TYPE_COLUMNS} FROM shift_types WHERE scheduler_id = ?1
             ORDER BY start_time, name"
        ))?;

        let rows = stmt.query_map(params![scheduler_id], shift_type_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_shift_type(&self, scheduler_id: &str, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM shift_types WHERE id = ?1 AND scheduler_id = ?2",
            params![id, scheduler_id],
        )?;
        Ok(rows > 0)
    }

    // Availability request operations

    fn create_request(&self, request: &AvailabilityRequest) -> Result<AvailabilityRequest> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let descriptor = match &request.descriptor {
            RequestDescriptor::EmailKeyed { email } => tx
                .query_row(
                    "SELECT id FROM employees WHERE scheduler_id = ?1 AND email = ?2",
                    params![request.scheduler_id, email],
                    |row| row.get(0),
                )
                .optional()?
                .map_or_else(
                    || request.descriptor.clone(),
                    |employee_id| RequestDescriptor::EmployeeKeyed { employee_id },
                ),
            RequestDescriptor::EmployeeKeyed { .. } => request.descriptor.clone(),
        };
        let (employee_id, email) = match &descriptor {
            RequestDescriptor::EmployeeKeyed { employee_id } => (Some(employee_id.as_str()), None),
            RequestDescriptor::EmailKeyed { email } => (None, Some(email.as_str())),
        };

        tx.execute(
            "INSERT INTO availability_requests (id, scheduler_id, employee_id, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.id,
                request.scheduler_id,
                employee_id,
                email,
                format_datetime(&request.created_at),
            ],
        )?;
        tx.commit()?;

        Ok(AvailabilityRequest {
            descriptor,
            ..request.clone()
        })
    }

    fn get_request(&self, id: &str) -> Result<Option<AvailabilityRequest>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM availability_requests WHERE id = ?1"),
            params![id],
            request_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_requests(&self, scheduler_id: &str) -> Result<Vec<AvailabilityRequest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM availability_requests WHERE scheduler_id = ?1
             ORDER BY created_at DESC, id"
        ))?;

        let rows = stmt.query_map(params![scheduler_id], request_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_employee_requests(&self, employee: &Employee) -> Result<Vec<AvailabilityRequest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM availability_requests WHERE {EMPLOYEE_REQUEST_FILTER}
             ORDER BY created_at, id"
        ))?;

        let rows = stmt.query_map(params![employee.scheduler_id, employee.id], request_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn bind_request(&self, scheduler_id: &str, id: &str, employee_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE availability_requests SET employee_id = ?1, email = NULL
             WHERE id = ?2 AND scheduler_id = ?3",
            params![employee_id, id, scheduler_id],
        )?;
        Ok(rows > 0)
    }

    fn delete_request(&self, scheduler_id: &str, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM availability_requests WHERE id = ?1 AND scheduler_id = ?2",
            params![id, scheduler_id],
        )?;
        Ok(rows > 0)
    }

    // Availability entry operations

    fn insert_entry_checked(&self, entry: &AvailabilityEntry, check: EntryCheck<'_>) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = query_entries(
            &tx,
            "WHERE a.request_id = ?1 AND a.day = ?2",
            params![entry.request_id, entry.day.format(DATE_FORMAT).to_string()],
        )?;

        check(existing.as_slice())?;

        tx.execute(
            "INSERT INTO availability_entries (id, request_id, day, start_at, end_at, shift_type_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.request_id,
                entry.day.format(DATE_FORMAT).to_string(),
                entry.start.format(DATETIME_FORMAT).to_string(),
                entry.end.format(DATETIME_FORMAT).to_string(),
                entry.shift_type_id,
                format_datetime(&entry.created_at),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_request_entries(&self, request_id: &str) -> Result<Vec<AvailabilityEntry>> {
        let conn = self.conn();
        query_entries(&conn, "WHERE a.request_id = ?1", params![request_id])
    }

    fn list_employee_entries(&self, employee: &Employee) -> Result<Vec<AvailabilityEntry>> {
        let conn = self.conn();
        query_entries(
            &conn,
            &format!(
                "WHERE a.request_id IN
                 (SELECT id FROM availability_requests WHERE {EMPLOYEE_REQUEST_FILTER})"
            ),
            params![employee.scheduler_id, employee.id],
        )
    }

    fn list_scheduler_entries(
        &self,
        scheduler_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OwnedEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT e.id, {ENTRY_COLUMNS}
             FROM availability_entries a
             JOIN availability_requests r ON r.id = a.request_id
             JOIN employees e ON e.id = r.employee_id AND e.scheduler_id = r.scheduler_id
             WHERE r.scheduler_id = ?1 AND a.day >= ?2 AND a.day <= ?3
             ORDER BY a.day, a.start_at"
        ))?;

        let rows = stmt.query_map(
            params![
                scheduler_id,
                start.format(DATE_FORMAT).to_string(),
                end.format(DATE_FORMAT).to_string(),
            ],
            |row| {
                Ok(OwnedEntry {
                    employee_id: row.get(0)?,
                    entry: entry_from_row(row, 1)?,
                })
            },
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_entry(&self, request_id: &str, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM availability_entries WHERE id = ?1 AND request_id = ?2",
            params![id, request_id],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn scheduler(store: &SqliteStore, id: &str) {
        store
            .create_scheduler(&Scheduler {
                id: id.to_string(),
                name: format!("{id} org"),
                created_at: Utc::now(),
            })
            .unwrap();
    }

    fn employee(id: &str, scheduler_id: &str, email: &str, number: Option<&str>) -> Employee {
        Employee {
            id: id.to_string(),
            scheduler_id: scheduler_id.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: id.to_string(),
            employee_number: number.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(id: &str, scheduler_id: &str, descriptor: RequestDescriptor) -> AvailabilityRequest {
        AvailabilityRequest {
            id: id.to_string(),
            scheduler_id: scheduler_id.to_string(),
            descriptor,
            created_at: Utc::now(),
        }
    }

    fn entry(id: &str, request_id: &str, start: u32, end: u32) -> AvailabilityEntry {
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        AvailabilityEntry {
            id: id.to_string(),
            request_id: request_id.to_string(),
            day,
            start: day.and_hms_opt(start, 0, 0).unwrap(),
            end: day.and_hms_opt(end, 0, 0).unwrap(),
            shift_type_id: None,
            created_at: Utc::now(),
        }
    }

    fn accept(_: &[AvailabilityEntry]) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = open();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"schedulers".to_string()));
        assert!(tables.contains(&"scheduler_tokens".to_string()));
        assert!(tables.contains(&"employees".to_string()));
        assert!(tables.contains(&"shift_types".to_string()));
        assert!(tables.contains(&"availability_requests".to_string()));
        assert!(tables.contains(&"availability_entries".to_string()));
    }

    #[test]
    fn test_employee_crud() {
        let (_temp, store) = open();
        scheduler(&store, "s1");

        let mut e = employee("e1", "s1", "e@x.com", Some("42"));
        store.create_employee(&e).unwrap();

        let fetched = store.get_employee("s1", "e1").unwrap().unwrap();
        assert_eq!(fetched.email, "e@x.com");
        assert_eq!(fetched.employee_number.as_deref(), Some("42"));
        assert!(store.get_employee("other", "e1").unwrap().is_none());

        e.first_name = "Renamed".to_string();
        store.update_employee(&e).unwrap();
        let renamed = store.get_employee("s1", "e1").unwrap().unwrap();
        assert_eq!(renamed.first_name, "Renamed");

        assert!(store.delete_employee_cascade("s1", "e1").unwrap());
        assert!(store.get_employee_by_id("e1").unwrap().is_none());
    }

    #[test]
    fn test_employee_uniqueness_is_per_scheduler() {
        let (_temp, store) = open();
        scheduler(&store, "s1");
        scheduler(&store, "s2");

        store.create_employee(&employee("e1", "s1", "e@x.com", Some("7"))).unwrap();

        let dup_email = store.create_employee(&employee("e2", "s1", "e@x.com", None));
        assert!(matches!(dup_email, Err(Error::Duplicate(m)) if m.contains("email")));

        let dup_number = store.create_employee(&employee("e3", "s1", "f@x.com", Some("7")));
        assert!(matches!(dup_number, Err(Error::Duplicate(m)) if m.contains("number")));

        store.create_employee(&employee("e4", "s2", "e@x.com", Some("7"))).unwrap();
    }

    #[test]
    fn test_missing_employee_numbers_do_not_collide() {
        let (_temp, store) = open();
        scheduler(&store, "s1");

        store.create_employee(&employee("e1", "s1", "a@x.com", None)).unwrap();
        store.create_employee(&employee("e2", "s1", "b@x.com", None)).unwrap();
        assert_eq!(store.list_employees("s1").unwrap().len(), 2);
    }

    #[test]
    fn test_cascade_removes_requests_and_entries() {
        let (_temp, store) = open();
        scheduler(&store, "s1");
        store.create_employee(&employee("e1", "s1", "e@x.com", None)).unwrap();

        store
            .create_request(&request(
                "r1",
                "s1",
                RequestDescriptor::EmployeeKeyed {
                    employee_id: "e1".to_string(),
                },
            ))
            .unwrap();
        store
            .create_request(&request(
                "r2",
                "s1",
                RequestDescriptor::EmailKeyed {
                    email: "e@x.com".to_string(),
                },
            ))
            .unwrap();
        store.insert_entry_checked(&entry("a1", "r1", 9, 10), &accept).unwrap();
        store.insert_entry_checked(&entry("a2", "r2", 11, 12), &accept).unwrap();

        assert!(store.delete_employee_cascade("s1", "e1").unwrap());
        assert!(store.get_request("r1").unwrap().is_none());
        assert!(store.get_request("r2").unwrap().is_none());
        assert!(store.list_request_entries("r1").unwrap().is_empty());
        assert!(store.list_request_entries("r2").unwrap().is_empty());

        assert!(!store.delete_employee_cascade("s1", "e1").unwrap());
    }

    #[test]
    fn test_rejected_check_writes_nothing() {
        let (_temp, store) = open();
        scheduler(&store, "s1");
        store
            .create_request(&request(
                "r1",
                "s1",
                RequestDescriptor::EmailKeyed {
                    email: "e@x.com".to_string(),
                },
            ))
            .unwrap();

        store.insert_entry_checked(&entry("a1", "r1", 9, 10), &accept).unwrap();

        let reject = |existing: &[AvailabilityEntry]| -> Result<()> {
            assert_eq!(existing.len(), 1);
            Err(Error::Conflict("overlap".to_string()))
        };
        let result = store.insert_entry_checked(&entry("a2", "r1", 9, 11), &reject);
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(store.list_request_entries("r1").unwrap().len(), 1);
    }

    #[test]
    fn test_deleting_shift_type_nullifies_entries() {
        let (_temp, store) = open();
        scheduler(&store, "s1");
        store
            .create_shift_type(&ShiftType {
                id: "st1".to_string(),
                scheduler_id: "s1".to_string(),
                name: "Morning".to_string(),
                start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                color: ShiftColor::Yellow,
                created_at: Utc::now(),
            })
            .unwrap();
        store
            .create_request(&request(
                "r1",
                "s1",
                RequestDescriptor::EmailKeyed {
                    email: "e@x.com".to_string(),
                },
            ))
            .unwrap();

        let mut bound = entry("a1", "r1", 8, 12);
        bound.shift_type_id = Some("st1".to_string());
        store.insert_entry_checked(&bound, &accept).unwrap();

        let fetched = store.get_shift_type("s1", "st1").unwrap().unwrap();
        assert_eq!(fetched.color, ShiftColor::Yellow);

        assert!(store.delete_shift_type("s1", "st1").unwrap());
        let entries = store.list_request_entries("r1").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].shift_type_id.is_none());
    }

    #[test]
    fn test_bind_request_switches_descriptor() {
        let (_temp, store) = open();
        scheduler(&store, "s1");
        store.create_employee(&employee("e1", "s1", "e@x.com", None)).unwrap();
        store
            .create_request(&request(
                "r1",
                "s1",
                RequestDescriptor::EmailKeyed {
                    email: "legacy@x.com".to_string(),
                },
            ))
            .unwrap();

        assert!(!store.bind_request("s2", "r1", "e1").unwrap());
        assert!(store.bind_request("s1", "r1", "e1").unwrap());

        let fetched = store.get_request("r1").unwrap().unwrap();
        assert_eq!(
            fetched.descriptor,
            RequestDescriptor::EmployeeKeyed {
                employee_id: "e1".to_string()
            }
        );
    }

    #[test]
    fn test_employee_writes_claim_email_requests() {
        let (_temp, store) = open();
        scheduler(&store, "s1");
        scheduler(&store, "s2");
        let by_email = |id: &str, scheduler_id: &str, email: &str| {
            store
                .create_request(&request(
                    id,
                    scheduler_id,
                    RequestDescriptor::EmailKeyed {
                        email: email.to_string(),
                    },
                ))
                .unwrap()
        };
        let keyed_to = |employee_id: &str| RequestDescriptor::EmployeeKeyed {
            employee_id: employee_id.to_string(),
        };

        by_email("r1", "s1", "a@x.com");
        by_email("r2", "s2", "a@x.com");
        let mut e = employee("e1", "s1", "a@x.com", None);
        store.create_employee(&e).unwrap();
        assert_eq!(store.get_request("r1").unwrap().unwrap().descriptor, keyed_to("e1"));
        assert!(matches!(
            store.get_request("r2").unwrap().unwrap().descriptor,
            RequestDescriptor::EmailKeyed { .. }
        ));

        // Issued while the address has an owner.
        assert_eq!(by_email("r3", "s1", "a@x.com").descriptor, keyed_to("e1"));

        by_email("r4", "s1", "b@x.com");
        e.email = "b@x.com".to_string();
        store.update_employee(&e).unwrap();
        assert_eq!(store.get_request("r4").unwrap().unwrap().descriptor, keyed_to("e1"));
        assert_eq!(store.list_employee_requests(&e).unwrap().len(), 3);

        assert!(store.delete_employee_cascade("s1", "e1").unwrap());
        store.create_employee(&employee("e2", "s1", "a@x.com", None)).unwrap();
        let e2 = store.get_employee("s1", "e2").unwrap().unwrap();
        assert!(store.list_employee_requests(&e2).unwrap().is_empty());
        assert!(store.get_request("r1").unwrap().is_none());
    }

    #[test]
    fn test_update_missing_employee_is_not_found() {
        let (_temp, store) = open();
        scheduler(&store, "s1");
        let result = store.update_employee(&employee("ghost", "s1", "g@x.com", None));
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn test_scheduler_entries_follow_employee_keys() {
        let (_temp, store) = open();
        scheduler(&store, "s1");
        store.create_employee(&employee("e1", "s1", "e@x.com", None)).unwrap();
        store
            .create_request(&request(
                "r1",
                "s1",
                RequestDescriptor::EmployeeKeyed {
                    employee_id: "e1".to_string(),
                },
            ))
            .unwrap();
        let r2 = store
            .create_request(&request(
                "r2",
                "s1",
                RequestDescriptor::EmailKeyed {
                    email: "e@x.com".to_string(),
                },
            ))
            .unwrap();
        assert_eq!(
            r2.descriptor,
            RequestDescriptor::EmployeeKeyed {
                employee_id: "e1".to_string()
            }
        );
        store
            .create_request(&request(
                "r3",
                "s1",
                RequestDescriptor::EmailKeyed {
                    email: "nobody@x.com".to_string(),
                },
            ))
            .unwrap();
        store.insert_entry_checked(&entry("a1", "r1", 9, 10), &accept).unwrap();
        store.insert_entry_checked(&entry("a2", "r2", 13, 14), &accept).unwrap();
        store.insert_entry_checked(&entry("a3", "r3", 9, 10), &accept).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let owned = store.list_scheduler_entries("s1", day, day).unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|o| o.employee_id == "e1"));

        let next = day.succ_opt().unwrap();
        assert!(store.list_scheduler_entries("s1", next, next).unwrap().is_empty());

        let e1 = store.get_employee("s1", "e1").unwrap().unwrap();
        assert_eq!(store.list_employee_entries(&e1).unwrap().len(), 2);
        assert_eq!(store.list_employee_requests(&e1).unwrap().len(), 2);
    }

    #[test]
    fn test_token_lookup_collision() {
        let (_temp, store) = open();
        scheduler(&store, "s1");

        let token1 = SchedulerToken {
            id: "token-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup12".to_string(),
            scheduler_id: "s1".to_string(),
            created_at: Utc::now(),
            last_used_at: None,
        };
        store.create_scheduler_token(&token1).unwrap();

        let token2 = SchedulerToken {
            id: "token-2".to_string(),
            token_hash: "hash2".to_string(),
            ..token1
        };

        let result = store.create_scheduler_token(&token2);
        assert!(matches!(result, Err(Error::TokenLookupCollision)));
    }
}
