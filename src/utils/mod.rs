pub mod graceful_shutdown;

pub use graceful_shutdown::{ShutdownReason, shutdown_signal};
