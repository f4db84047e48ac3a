pub mod classify;
pub mod run;

// Re-export command functions for convenience
pub use classify::classify;
pub use run::{run, RunParams};
