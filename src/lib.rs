pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod grids;
pub mod kernel;
pub mod landscape;
pub mod output;
pub mod stats;
pub mod sweep;
