pub mod bench;
pub mod client;
pub mod common;
pub mod dataset;
pub mod error;
pub mod http;
pub mod race;
pub mod report;
pub mod server;
pub mod stats;
