pub mod alert;
pub mod measurement;
pub mod position;
pub mod spec;

pub use alert::*;
pub use measurement::*;
pub use position::*;
pub use spec::*;

/// Identifier of a measured target (a CD feature of one process step)
pub type TargetId = i64;
