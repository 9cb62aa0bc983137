mod build;
mod compiler;
mod expr;
mod op;
mod rules;
mod scope;

pub use compiler::*;
pub use expr::*;
pub use op::*;
pub use rules::*;
pub use scope::*;
