//! Steps, position maps and transactions.

pub mod map;
pub mod step;
mod structure;
pub mod transaction;

pub use map::{Assoc, MapRange, Mapping, StepMap};
pub use step::{Step, StepResult};
pub use transaction::Transaction;
