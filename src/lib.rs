pub mod domain;
pub mod error;
pub mod services;
pub mod settings;
pub mod utils;

pub use error::BackupError;
