mod context;
mod generic;
mod postgres;
mod sql_server;
mod sql_writer;

pub use context::*;
pub use generic::*;
pub use postgres::*;
pub use sql_server::*;
pub use sql_writer::*;
