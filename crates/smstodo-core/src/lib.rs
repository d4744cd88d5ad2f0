pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod phone;
pub mod signature;
pub mod sms;
pub mod store;

pub use error::{Result, TodoError};
