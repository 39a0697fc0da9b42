pub mod colors;
pub mod path;
pub mod table;

pub use colors::color_for_status;
