pub mod command;
pub mod compression;
pub mod driver;
pub mod factory;
pub mod mysql;
pub mod postgres;
pub mod sqlite;
