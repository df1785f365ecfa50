pub mod config;
pub mod habit;
pub mod serve;
pub mod stats;
