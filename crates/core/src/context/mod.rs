//! Script variable context.
//!
//! A `Context` holds the variables a script reads and writes through
//! `context.getVariableAsync`, `context.setVariableAsync` and
//! `context.deleteVariableAsync`. Each variable may carry a TTL in
//! milliseconds; expired variables are evicted lazily when read.

mod manager;
mod repository;
mod types;

pub use manager::{Context, ContextError};
pub use repository::VariableRepository;
pub use types::{VariableEntry, VariableName};
