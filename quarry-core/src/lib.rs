mod as_value;
mod cell;
mod command;
mod config;
mod connection;
mod driver;
mod entity;
mod error;
mod executor;
mod expression;
mod key_strategy;
mod lease;
mod mapping;
mod query;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context as ErrorContext;
pub use as_value::*;
pub use cell::*;
pub use command::*;
pub use config::*;
pub use connection::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use expression::*;
pub use key_strategy::*;
pub use lease::*;
pub use mapping::*;
pub use query::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
