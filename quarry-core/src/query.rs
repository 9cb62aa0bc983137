use crate::{
    AsValue, Result, Value, statement_state_error,
    stream::{BoxStream, StreamExt},
};
use std::sync::Arc;

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend specific last inserted identifier when available.
    pub last_affected_id: Option<i64>,
}

/// Shared reference counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(names: RowNames, values: Row) -> Self {
        Self {
            labels: names,
            values,
        }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values()[i])
    }
}

/// Items emitted by `Executor::run`, combining rows and modify results.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Row(RowLabeled),
    Affected(RowsAffected),
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}

/// Forward only cursor over the rows of a running statement.
///
/// Modify results met while advancing are accumulated into [`ValueSource::rows_affected`].
pub struct ValueSource<'a> {
    stream: BoxStream<'a, Result<QueryResult>>,
    current: Option<RowLabeled>,
    affected: RowsAffected,
}

impl<'a> ValueSource<'a> {
    pub fn new(stream: BoxStream<'a, Result<QueryResult>>) -> Self {
        Self {
            stream,
            current: None,
            affected: Default::default(),
        }
    }

    /// Moves to the next row, `false` once the results are exhausted.
    pub async fn next(&mut self) -> Result<bool> {
        while let Some(item) = self.stream.next().await {
            match item? {
                QueryResult::Row(row) => {
                    self.current = Some(row);
                    return Ok(true);
                }
                QueryResult::Affected(affected) => self.affected.extend([affected]),
            }
        }
        self.current = None;
        Ok(false)
    }

    pub fn row(&self) -> Option<&RowLabeled> {
        self.current.as_ref()
    }

    /// Typed value of `column` in the current row.
    pub fn get_value<T: AsValue>(&self, column: &str) -> Result<T> {
        let Some(row) = &self.current else {
            return Err(statement_state_error(format!(
                "Reading column `{column}` with no current row"
            )));
        };
        let Some(value) = row.get_column(column) else {
            return Err(statement_state_error(format!(
                "Column `{column}` is not part of the result"
            )));
        };
        T::try_from_value(value.clone())
    }

    pub fn rows_affected(&self) -> RowsAffected {
        self.affected
    }
}
