pub mod active_item;
pub mod catalog;
pub mod viewport;
