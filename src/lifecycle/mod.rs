//! Process lifecycle: signal-driven interruption of an arbitration session

mod shutdown;

pub use shutdown::ShutdownSignal;
