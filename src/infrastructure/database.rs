use super::store::{DepartmentStore, DocumentStore, StoreError};
use crate::domain::{
    timestamp, DakDocument, Department, DepartmentRef, Direction, DocumentInsert, DocumentPatch,
};
use chrono::{DateTime, Datelike, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

const DOCUMENT_SELECT: &str = "SELECT d.id, d.dak_number, d.reference_number, d.type, d.subject,
        d.sender, d.sender_address, d.receiver, d.receiver_address, d.department_id,
        d.branch, d.priority, d.status, d.date_received, d.date_sent, d.due_date,
        d.content, d.remarks, d.created_by, d.assigned_to, d.created_at, d.updated_at,
        dep.name, dep.code
     FROM dak_documents d
     LEFT JOIN departments dep ON dep.id = d.department_id";

#[derive(Error, Debug)]
#[error("invalid timestamp: {0}")]
struct BadTimestamp(String);

/// Embedded store standing in for the hosted backend: it owns the schema,
/// mints document numbers and joins departments itself.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS departments (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                code TEXT UNIQUE NOT NULL,
                head_name TEXT,
                head_email TEXT,
                branch TEXT NOT NULL DEFAULT 'main',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS dak_documents (
                id TEXT PRIMARY KEY,
                dak_number TEXT UNIQUE NOT NULL,
                reference_number TEXT,
                type TEXT NOT NULL CHECK (type IN ('inward', 'outward')),
                subject TEXT NOT NULL,
                sender TEXT NOT NULL,
                sender_address TEXT,
                receiver TEXT,
                receiver_address TEXT,
                department_id TEXT REFERENCES departments(id),
                branch TEXT NOT NULL DEFAULT 'main',
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'received',
                date_received TEXT NOT NULL,
                date_sent TEXT,
                due_date TEXT,
                content TEXT,
                remarks TEXT,
                created_by TEXT,
                assigned_to TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_dak_created_at ON dak_documents(created_at);
            CREATE INDEX IF NOT EXISTS idx_departments_name ON departments(name);",
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn insert_department(&self, dept: &Department) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO departments (id, name, code, head_name, head_email, branch, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &dept.id,
                &dept.name,
                &dept.code,
                &dept.head_name,
                &dept.head_email,
                &dept.branch,
                dept.is_active,
                timestamp::format(&dept.created_at),
                timestamp::format(&dept.updated_at),
            ],
        )
        .map_err(constraint_error)?;

        Ok(())
    }

    pub fn find_document(&self, id: &str) -> Result<DakDocument, StoreError> {
        let conn = self.lock()?;
        Self::select_by_id(&conn, id)
    }

    pub fn count_documents(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM dak_documents", [], |row| row.get(0))?;

        Ok(count as usize)
    }

    fn select_by_id(conn: &Connection, id: &str) -> Result<DakDocument, StoreError> {
        let doc = conn
            .query_row(
                &format!("{} WHERE d.id = ?1", DOCUMENT_SELECT),
                params![id],
                Self::row_to_document,
            )
            .optional()?;

        doc.ok_or(StoreError::NotFound)
    }

    /// `IN/2026/00001`, numbered per direction and calendar year.
    fn next_dak_number(
        conn: &Connection,
        direction: Direction,
        now: &DateTime<Utc>,
    ) -> Result<String, rusqlite::Error> {
        let prefix = match direction {
            Direction::Inward => "IN",
            Direction::Outward => "OUT",
        };
        let series = format!("{}/{}/", prefix, now.year());

        let issued: i64 = conn.query_row(
            "SELECT COUNT(*) FROM dak_documents WHERE dak_number LIKE ?1",
            params![format!("{}%", series)],
            |row| row.get(0),
        )?;

        Ok(format!("{}{:05}", series, issued + 1))
    }

    fn row_to_document(row: &rusqlite::Row) -> Result<DakDocument, rusqlite::Error> {
        let department_name: Option<String> = row.get(22)?;
        let department_code: Option<String> = row.get(23)?;

        Ok(DakDocument {
            id: row.get(0)?,
            dak_number: row.get(1)?,
            reference_number: row.get(2)?,
            direction: parse_text(row, 3)?,
            subject: row.get(4)?,
            sender: row.get(5)?,
            sender_address: row.get(6)?,
            receiver: row.get(7)?,
            receiver_address: row.get(8)?,
            department_id: row.get(9)?,
            branch: row.get(10)?,
            priority: parse_text(row, 11)?,
            status: parse_text(row, 12)?,
            date_received: parse_timestamp(row, 13)?,
            date_sent: parse_optional_timestamp(row, 14)?,
            due_date: parse_optional_timestamp(row, 15)?,
            content: row.get(16)?,
            remarks: row.get(17)?,
            created_by: row.get(18)?,
            assigned_to: row.get(19)?,
            created_at: parse_timestamp(row, 20)?,
            updated_at: parse_timestamp(row, 21)?,
            departments: match (department_name, department_code) {
                (Some(name), Some(code)) => Some(DepartmentRef { name, code }),
                _ => None,
            },
        })
    }

    fn row_to_department(row: &rusqlite::Row) -> Result<Department, rusqlite::Error> {
        Ok(Department {
            id: row.get(0)?,
            name: row.get(1)?,
            code: row.get(2)?,
            head_name: row.get(3)?,
            head_email: row.get(4)?,
            branch: row.get(5)?,
            is_active: row.get(6)?,
            created_at: parse_timestamp(row, 7)?,
            updated_at: parse_timestamp(row, 8)?,
        })
    }
}

impl DocumentStore for SqliteStore {
    async fn list_documents(&self, limit: usize) -> Result<Vec<DakDocument>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY d.created_at DESC, d.rowid DESC LIMIT ?1",
            DOCUMENT_SELECT
        ))?;

        let docs = stmt
            .query_map(params![limit as i64], Self::row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    async fn insert_document(&self, row: &DocumentInsert) -> Result<DakDocument, StoreError> {
        let mut conn = self.lock()?;
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        let tx = conn.transaction()?;
        let dak_number = Self::next_dak_number(&tx, row.direction, &now)?;

        tx.execute(
            "INSERT INTO dak_documents (
                id, dak_number, reference_number, type, subject, sender, sender_address,
                receiver, receiver_address, department_id, branch, priority, status,
                date_received, date_sent, due_date, content, remarks, created_by, assigned_to,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                       ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                &id,
                &dak_number,
                &row.reference_number,
                row.direction.as_str(),
                &row.subject,
                &row.sender,
                &row.sender_address,
                &row.receiver,
                &row.receiver_address,
                &row.department_id,
                &row.branch,
                row.priority.as_str(),
                row.status.as_str(),
                timestamp::format(&row.date_received),
                row.date_sent.as_ref().map(timestamp::format),
                row.due_date.as_ref().map(timestamp::format),
                &row.content,
                &row.remarks,
                &row.created_by,
                &row.assigned_to,
                timestamp::format(&now),
                timestamp::format(&now),
            ],
        )
        .map_err(constraint_error)?;
        tx.commit()?;

        log::debug!("Stored document {} as {}", id, dak_number);
        Self::select_by_id(&conn, &id)
    }

    async fn update_document(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> Result<DakDocument, StoreError> {
        let columns = patch.to_columns()?;
        let conn = self.lock()?;

        let mut assignments = Vec::with_capacity(columns.len() + 1);
        let mut values = Vec::with_capacity(columns.len() + 2);
        for (column, value) in columns {
            values.push(json_to_sql(value));
            assignments.push(format!("{} = ?{}", column, values.len()));
        }
        values.push(Value::Text(timestamp::format(&Utc::now())));
        assignments.push(format!("updated_at = ?{}", values.len()));
        values.push(Value::Text(id.to_string()));

        let changed = conn
            .execute(
                &format!(
                    "UPDATE dak_documents SET {} WHERE id = ?{}",
                    assignments.join(", "),
                    values.len()
                ),
                params_from_iter(values),
            )
            .map_err(constraint_error)?;

        if changed == 0 {
            return Err(StoreError::NotFound);
        }

        Self::select_by_id(&conn, id)
    }
}

impl DepartmentStore for SqliteStore {
    async fn list_active_departments(&self) -> Result<Vec<Department>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, code, head_name, head_email, branch, is_active, created_at, updated_at
             FROM departments
             WHERE is_active = 1
             ORDER BY name ASC",
        )?;

        let departments = stmt
            .query_map([], Self::row_to_department)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(departments)
    }
}

fn constraint_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Constraint(message.unwrap_or_else(|| failure.to_string()))
        }
        other => StoreError::Sqlite(other),
    }
}

fn json_to_sql(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Integer(b as i64),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Real(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}

fn parse_text<T>(row: &rusqlite::Row, idx: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    timestamp::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(BadTimestamp(raw)))
    })
}

fn parse_optional_timestamp(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(raw) => timestamp::parse(&raw).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(BadTimestamp(raw)))
        }),
        None => Ok(None),
    }
}
