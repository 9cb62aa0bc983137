use crate::{ConnectionString, Executor, Result};
use std::future::{self, Future};

pub trait Connection: Executor + Sized + 'static {
    /// Opens a connection to the database named by `url`.
    fn connect(url: &ConnectionString) -> impl Future<Output = Result<Self>> + Send;

    /// Closes the connection, consuming it.
    fn disconnect(self) -> impl Future<Output = Result<()>> + Send {
        future::ready(Ok(()))
    }
}
