mod collection;

pub use collection::*;
pub use quarry_core::*;
