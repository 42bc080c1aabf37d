//! Database initialization, migrations and shared row models

pub mod init;
pub mod migrations;
pub mod models;

pub use init::init_database;
