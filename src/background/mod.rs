pub mod controller;
pub mod placement;
pub mod runtime;
pub mod scheduler;

pub use controller::{BackgroundController, BackgroundStatus, SharedController};
pub use runtime::EngineSettings;
