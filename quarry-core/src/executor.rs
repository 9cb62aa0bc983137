use crate::{
    Driver, QueryResult, Result, RowLabeled, RowsAffected, Statement, ValueSource,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

/// Runs statements. Takes `&self` so a leased connection can be shared by its holders.
pub trait Executor: Send + Sync {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// General method to send any statement and return any result type (either row or count)
    fn run(&self, statement: Statement) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the statement and returns the rows.
    fn fetch(&self, statement: Statement) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(statement).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the statement and return the total number of rows affected.
    fn execute(&self, statement: Statement) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(statement)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }

    /// Cursor over the rows produced by the statement.
    fn value_source(&self, statement: Statement) -> ValueSource<'_> {
        ValueSource::new(self.run(statement).boxed())
    }
}
