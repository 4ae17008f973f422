pub mod config;
pub mod csv_reader;
pub mod sheets;
pub mod store;
