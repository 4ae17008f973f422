pub mod cache;
pub mod monitoring;
pub mod pipeline;
pub mod publish;
pub mod search;
