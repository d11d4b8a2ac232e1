pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result};
