pub mod capture_server;
pub mod config;
pub mod http_client;
pub mod output;
pub mod record_reader;
