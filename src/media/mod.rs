//! Media fetching and the preload coordinator

pub mod loader;
pub mod preload;

pub use loader::DefaultMediaLoader;
pub use preload::{PreloadCache, Preloader};
