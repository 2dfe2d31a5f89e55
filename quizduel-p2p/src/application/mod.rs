mod config;
mod connection_manager;
mod events;
mod heartbeat;
mod progression;
mod reliable;
pub mod runtime;

pub use config::SyncConfig;
pub use connection_manager::ConnectionManager;
pub use events::{ConnectionEvent, SessionEvent};
pub use heartbeat::HeartbeatMonitor;
pub use progression::ProgressionController;
pub use reliable::{PendingMessage, ReliableChannel, Receipt, Sweep};
pub use runtime::{GameLoop, IntervalTimer};
