pub mod constants;
pub mod error;
pub mod extractors;
pub mod fetcher;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod storage;
pub mod types;
