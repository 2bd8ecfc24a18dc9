pub const SCHEMA: &str = r#"
-- Schedulers own every other record
CREATE TABLE IF NOT EXISTS schedulers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Scheduler API credentials
CREATE TABLE IF NOT EXISTS scheduler_tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,
    token_lookup TEXT NOT NULL,
    scheduler_id TEXT NOT NULL REFERENCES schedulers(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    last_used_at TEXT
);

CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY,
    scheduler_id TEXT NOT NULL REFERENCES schedulers(id) ON DELETE CASCADE,
    email TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    employee_number TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(scheduler_id, email),
    UNIQUE(scheduler_id, employee_number)
);

CREATE TABLE IF NOT EXISTS shift_types (
    id TEXT PRIMARY KEY,
    scheduler_id TEXT NOT NULL REFERENCES schedulers(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    color TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Exactly one of employee_id and email is set
CREATE TABLE IF NOT EXISTS availability_requests (
    id TEXT PRIMARY KEY,
    scheduler_id TEXT NOT NULL REFERENCES schedulers(id) ON DELETE CASCADE,
    employee_id TEXT REFERENCES employees(id) ON DELETE CASCADE,
    email TEXT,
    created_at TEXT DEFAULT (datetime('now')),

    CHECK ((employee_id IS NULL) <> (email IS NULL))
);

CREATE TABLE IF NOT EXISTS availability_entries (
    id TEXT PRIMARY KEY,
    request_id TEXT NOT NULL REFERENCES availability_requests(id) ON DELETE CASCADE,
    day TEXT NOT NULL,
    start_at TEXT NOT NULL,
    end_at TEXT NOT NULL,
    shift_type_id TEXT REFERENCES shift_types(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),

    CHECK (start_at < end_at)
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_scheduler_tokens_lookup ON scheduler_tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_scheduler_tokens_scheduler ON scheduler_tokens(scheduler_id);
CREATE INDEX IF NOT EXISTS idx_employees_scheduler ON employees(scheduler_id);
CREATE INDEX IF NOT EXISTS idx_shift_types_scheduler ON shift_types(scheduler_id);
CREATE INDEX IF NOT EXISTS idx_requests_scheduler ON availability_requests(scheduler_id);
CREATE INDEX IF NOT EXISTS idx_requests_employee ON availability_requests(employee_id);
CREATE INDEX IF NOT EXISTS idx_requests_email ON availability_requests(scheduler_id, email);
CREATE INDEX IF NOT EXISTS idx_entries_request_day ON availability_entries(request_id, day);
CREATE INDEX IF NOT EXISTS idx_entries_shift_type ON availability_entries(shift_type_id);
"#;
