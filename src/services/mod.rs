pub mod interval_gate;
pub mod liveness;
pub mod notifier;
pub mod pid_file;
pub mod process_inspector;
pub mod sampler;
pub mod scheduler;

pub use process_inspector::SysinfoInspector;
pub use sampler::Sampler;
