pub mod dataset;
pub mod fingerprint;
pub mod import_outcome;
pub mod key_column;
pub mod ports;
pub mod search;
pub mod value_objects;
