pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod process;
pub mod reconcile;
pub mod render;
