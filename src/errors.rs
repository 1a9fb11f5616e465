//! Crate-wide error re-exports.
//!
//! Each subsystem owns its own `thiserror`-derived error enum at its
//! boundary, keeping failure domains separated rather than collapsed into
//! one God-enum. This module is a convenience re-export point.

pub use crate::compiler::CompileError;
pub use crate::encode::EncodeError;
pub use crate::graph::{BuildError, ValidationError};
pub use crate::scheduler::{DispatchError, EdgePolicyViolation};

/// Generic alias used where a function's concrete error type is already
/// clear from context; most APIs spell out their own `Result<T, XError>`.
pub type Result<T> = std::result::Result<T, BuildError>;
