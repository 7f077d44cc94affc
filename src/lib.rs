pub mod aggregator;
pub mod analysis;
pub mod config;
pub mod error;
pub mod indicator;
pub mod model;
pub mod price_source;
pub mod server;
pub mod stats;
pub mod store;
