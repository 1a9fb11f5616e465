//! Pass Scheduler / Executor: topological execution, transient lifetime
//! analysis, edge-policy enforcement, and per-node GPU timing.

mod error;
mod executor;
mod kernel;
mod pass_kind;

pub use error::{DispatchError, EdgePolicyViolation};
pub use executor::{Executor, FrameMetadata, FrameOutput};
pub use kernel::{Kernel, KernelRegistry};
pub use pass_kind::{PassKind, classify};
