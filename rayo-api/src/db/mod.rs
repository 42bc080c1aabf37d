//! Database operations for rayo-api

pub mod blogs;
pub mod credentials;
pub mod keywords;
pub mod projects;
pub mod tasks;
