//! Metric names.
//!
//! A metric name is `category.name[.[sql]][.suffix]`, for example
//! `prepared_statement.orders.[select * from orders where id = ?].exec`.
//! SQL text is normalized by [`sql_id`] so that statements differing only in case or
//! whitespace share a timer.

use crate::api::{
    CallableStatement, Capability, Connection, DataSource, PreparedStatement, ResultSet,
    Statement,
};
use std::fmt;
use std::sync::Arc;

/// Suffix of timers measuring statement executions.
pub const EXEC_SUFFIX: &str = "exec";

/// Kind of wrapped object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    DataSource,
    Connection,
    Statement,
    PreparedStatement,
    CallableStatement,
    ResultSet,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DataSource => "data_source",
            Category::Connection => "connection",
            Category::Statement => "statement",
            Category::PreparedStatement => "prepared_statement",
            Category::CallableStatement => "callable_statement",
            Category::ResultSet => "result_set",
        }
    }

    /// Capability a proxy of this category impersonates.
    pub fn capability(&self) -> Capability {
        match self {
            Category::DataSource => Capability::of::<Box<dyn DataSource>>(),
            Category::Connection => Capability::of::<Box<dyn Connection>>(),
            Category::Statement => Capability::of::<Box<dyn Statement>>(),
            Category::PreparedStatement => Capability::of::<Box<dyn PreparedStatement>>(),
            Category::CallableStatement => Capability::of::<Box<dyn CallableStatement>>(),
            Category::ResultSet => Capability::of::<Box<dyn ResultSet>>(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Normalized, bracketed form of `sql`: lowercase, single line, whitespace runs
/// collapsed to one space, optionally truncated to `max_len` bytes.
pub fn sql_id(sql: &str, max_len: Option<usize>) -> String {
    let mut normalized = String::with_capacity(sql.len());
    for word in sql.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(word);
    }
    let normalized = normalized.to_lowercase();
    let key = match max_len {
        Some(max) => truncate_sql_bytes(&normalized, max),
        None => &normalized,
    };
    format!("[{key}]")
}

/// Name prefix handed from a wrapped object to the objects it produces.
///
/// Holds the instance name given when the data source was wrapped and, once a
/// statement is bound to SQL text, the normalized SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamingContext {
    name: Arc<str>,
    sql_id: Option<Arc<str>>,
}

impl NamingContext {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            sql_id: None,
        }
    }

    /// Context for a child bound to the normalized SQL `sql_id`.
    pub fn with_sql_id(&self, sql_id: impl Into<Arc<str>>) -> Self {
        Self {
            name: self.name.clone(),
            sql_id: Some(sql_id.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_id(&self) -> Option<&str> {
        self.sql_id.as_deref()
    }

    /// `category.name[.sql_id]`
    pub fn metric_name(&self, category: Category) -> MetricName {
        let mut name = MetricName(category.as_str().to_string());
        name.push(&self.name);
        if let Some(sql_id) = &self.sql_id {
            name.push(sql_id);
        }
        name
    }
}

/// Dot-separated timer name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricName(String);

impl MetricName {
    /// Append `.part`; empty parts are skipped.
    fn push(&mut self, part: &str) {
        if part.is_empty() {
            return;
        }
        if !self.0.is_empty() {
            self.0.push('.');
        }
        self.0.push_str(part);
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.push(suffix);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MetricName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
