use crate::background::SharedController;

pub mod background;
pub mod catalog;
pub mod events;

// Type alias for our application state
pub type AppState = SharedController;
