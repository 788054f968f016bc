pub mod explain;
pub mod parse;
pub mod resources;
