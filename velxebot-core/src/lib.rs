// src/lib.rs

pub mod auth;
pub mod db;
pub mod platforms;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod test_utils;
pub mod utils;

pub use db::Database;
pub use velxebot_common::error::Error;
pub use velxebot_common::models;
