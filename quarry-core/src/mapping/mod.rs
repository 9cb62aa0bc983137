mod declaration;
mod registry;
mod resolved;
mod rule;

pub use declaration::*;
pub use registry::*;
pub use resolved::*;
pub use rule::*;
