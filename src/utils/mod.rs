pub mod filename;
pub mod logging;
pub mod process;
pub mod text;
