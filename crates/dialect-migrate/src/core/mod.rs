//! Core abstractions shared by the converter, the executor and the drivers.
//!
//! - [`vendor`]: The closed set of SQL dialects
//! - [`traits`]: The connection seam the executor runs statements through

pub mod traits;
pub mod vendor;

pub use traits::{FailureKind, ScriptConnection, StatementError};
pub use vendor::Vendor;
