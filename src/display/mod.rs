pub mod easing;
pub mod render_loop;
pub mod renderer;
pub mod surface;
pub mod view;

pub use renderer::ItemFrame;
