pub mod config;
pub mod convert;
pub mod list;
