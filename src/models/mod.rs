pub mod notification;
pub mod registry;
pub mod stats;
pub mod target;

pub use notification::{NotificationSpec, Severity};
pub use registry::Registry;
pub use stats::{MemoryUsage, ProcessInfo};
pub use target::{Target, TargetState, TrackedTarget};
