pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::ScanOrchestrator;
pub use scheduler::{configure_scan_jobs, ScanCallback};
