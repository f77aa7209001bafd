//! Reference driver over SQLite.
//!
//! Implements the handle family on top of `rusqlite`. Result sets are read fully
//! when a query executes, so a result set stays usable after its statement or
//! connection is closed.

use crate::api::{
    CallableStatement, Capability, Connection, DataSource, PreparedStatement, ResultSet,
    Statement, Wrapper, unwrap_self,
};
use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use rusqlite::OpenFlags;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use std::any::Any;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Shared = Arc<Mutex<rusqlite::Connection>>;

fn lock(conn: &Shared) -> MutexGuard<'_, rusqlite::Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

fn flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

/// Connection factory for one SQLite database.
#[derive(Debug)]
pub struct SqliteDataSource {
    target: String,
    // Keeps a shared in-memory database alive between connections.
    anchor: Option<Mutex<rusqlite::Connection>>,
}

impl SqliteDataSource {
    /// Shared in-memory database called `name`, alive as long as the data source.
    ///
    /// Every connection obtained from it sees the same tables.
    pub fn memory(name: &str) -> SqlResult<Self> {
        let target = format!("file:{name}?mode=memory&cache=shared");
        let anchor = rusqlite::Connection::open_with_flags(&target, flags())?;
        Ok(Self {
            target,
            anchor: Some(Mutex::new(anchor)),
        })
    }

    /// Database file at `path`, created if missing.
    pub fn open(path: impl Into<PathBuf>) -> SqlResult<Self> {
        let path = path.into();
        let target = path.to_string_lossy().into_owned();
        // Fail early on unopenable paths.
        rusqlite::Connection::open_with_flags(&target, flags())?;
        Ok(Self {
            target,
            anchor: None,
        })
    }

    /// Run semicolon-separated `sql` outside of any wrapped handle.
    pub fn execute_batch(&self, sql: &str) -> SqlResult<()> {
        match &self.anchor {
            Some(anchor) => anchor
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .execute_batch(sql)?,
            None => rusqlite::Connection::open_with_flags(&self.target, flags())?
                .execute_batch(sql)?,
        }
        Ok(())
    }
}

impl Wrapper for SqliteDataSource {
    fn unwrap_ref(&self, capability: Capability) -> SqlResult<&dyn Any> {
        unwrap_self(self, capability)
    }
}

impl DataSource for SqliteDataSource {
    fn get_connection(&self) -> SqlResult<Box<dyn Connection>> {
        let conn = rusqlite::Connection::open_with_flags(&self.target, flags())?;
        Ok(Box::new(SqliteConnection {
            conn: Arc::new(Mutex::new(conn)),
            closed: false,
        }))
    }
}

#[derive(Debug)]
pub struct SqliteConnection {
    conn: Shared,
    closed: bool,
}

impl SqliteConnection {
    fn open_conn(&self) -> SqlResult<&Shared> {
        if self.closed {
            return Err(SqlError::Closed("connection"));
        }
        Ok(&self.conn)
    }

    /// Run `f` against the underlying `rusqlite` connection.
    pub fn with_raw<R>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<R>,
    ) -> SqlResult<R> {
        let conn = self.open_conn()?;
        Ok(f(&lock(conn))?)
    }
}

impl Wrapper for SqliteConnection {
    fn unwrap_ref(&self, capability: Capability) -> SqlResult<&dyn Any> {
        unwrap_self(self, capability)
    }
}

impl Connection for SqliteConnection {
    fn create_statement(&mut self) -> SqlResult<Box<dyn Statement>> {
        let conn = self.open_conn()?.clone();
        Ok(Box::new(SqliteStatement {
            conn,
            closed: false,
        }))
    }

    fn prepare_statement(&mut self, sql: &str) -> SqlResult<Box<dyn PreparedStatement>> {
        let conn = self.open_conn()?.clone();
        // Surface syntax errors at prepare time.
        let param_count = lock(&conn).prepare_cached(sql)?.parameter_count();
        Ok(Box::new(SqlitePreparedStatement {
            conn,
            sql: sql.to_string(),
            param_count,
            params: Vec::new(),
            closed: false,
        }))
    }

    fn prepare_call(&mut self, _sql: &str) -> SqlResult<Box<dyn CallableStatement>> {
        Err(SqlError::unsupported("SQLite has no stored procedures"))
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SqliteStatement {
    conn: Shared,
    closed: bool,
}

impl SqliteStatement {
    fn check_open(&self) -> SqlResult<()> {
        if self.closed {
            return Err(SqlError::Closed("statement"));
        }
        Ok(())
    }
}

impl Wrapper for SqliteStatement {
    fn unwrap_ref(&self, capability: Capability) -> SqlResult<&dyn Any> {
        unwrap_self(self, capability)
    }
}

impl Statement for SqliteStatement {
    fn execute_query(&mut self, sql: &str) -> SqlResult<Box<dyn ResultSet>> {
        self.check_open()?;
        Ok(Box::new(query(&self.conn, sql, &[])?))
    }

    fn execute_update(&mut self, sql: &str) -> SqlResult<u64> {
        self.check_open()?;
        update(&self.conn, sql, &[])
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SqlitePreparedStatement {
    conn: Shared,
    sql: String,
    param_count: usize,
    params: Vec<Value>,
    closed: bool,
}

impl SqlitePreparedStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn check_open(&self) -> SqlResult<()> {
        if self.closed {
            return Err(SqlError::Closed("prepared statement"));
        }
        Ok(())
    }
}

impl Wrapper for SqlitePreparedStatement {
    fn unwrap_ref(&self, capability: Capability) -> SqlResult<&dyn Any> {
        unwrap_self(self, capability)
    }
}

impl PreparedStatement for SqlitePreparedStatement {
    fn set_value(&mut self, index: usize, value: Value) -> SqlResult<()> {
        self.check_open()?;
        if index == 0 {
            return Err(SqlError::driver("parameter indexes start at 1"));
        }
        if index > self.param_count {
            return Err(SqlError::driver(format!(
                "parameter index {index} out of range, statement has {} parameters",
                self.param_count
            )));
        }
        if self.params.len() < index {
            self.params.resize(index, Value::Null);
        }
        self.params[index - 1] = value;
        Ok(())
    }

    fn execute_query(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        self.check_open()?;
        Ok(Box::new(query(&self.conn, &self.sql, &self.params)?))
    }

    fn execute_update(&mut self) -> SqlResult<u64> {
        self.check_open()?;
        update(&self.conn, &self.sql, &self.params)
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.closed = true;
        Ok(())
    }
}

fn query(conn: &Shared, sql: &str, params: &[Value]) -> SqlResult<SqliteResultSet> {
    let conn = lock(conn);
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    let mut buffered = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            values.push(Value::from(row.get_ref(index)?));
        }
        buffered.push(values);
    }

    Ok(SqliteResultSet {
        columns,
        rows: buffered,
        cursor: None,
        closed: false,
    })
}

fn update(conn: &Shared, sql: &str, params: &[Value]) -> SqlResult<u64> {
    let conn = lock(conn);
    let mut stmt = conn.prepare_cached(sql)?;
    let changed = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
    Ok(changed as u64)
}

/// Fully read query result.
#[derive(Debug)]
pub struct SqliteResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    cursor: Option<usize>,
    closed: bool,
}

impl SqliteResultSet {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn current(&self) -> SqlResult<&[Value]> {
        if self.closed {
            return Err(SqlError::Closed("result set"));
        }
        self.cursor
            .and_then(|cursor| self.rows.get(cursor))
            .map(Vec::as_slice)
            .ok_or_else(|| SqlError::driver("result set is not positioned on a row"))
    }
}

impl Wrapper for SqliteResultSet {
    fn unwrap_ref(&self, capability: Capability) -> SqlResult<&dyn Any> {
        unwrap_self(self, capability)
    }
}

impl ResultSet for SqliteResultSet {
    fn next(&mut self) -> SqlResult<bool> {
        if self.closed {
            return Err(SqlError::Closed("result set"));
        }
        let next = self.cursor.map_or(0, |cursor| cursor + 1);
        // Stays one past the end once exhausted.
        self.cursor = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn get_value(&self, index: usize) -> SqlResult<Value> {
        let row = self.current()?;
        row.get(index)
            .cloned()
            .ok_or_else(|| SqlError::ColumnNotFound(index.to_string()))
    }

    fn get_value_by_name(&self, column: &str) -> SqlResult<Value> {
        let index = self
            .columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))
            .ok_or_else(|| SqlError::ColumnNotFound(column.to_string()))?;
        self.get_value(index)
    }

    fn column_count(&self) -> SqlResult<usize> {
        Ok(self.columns.len())
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.closed = true;
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::Blob(v.to_vec()),
        }
    }
}
