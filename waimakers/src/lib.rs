// Library interface for waimakers modules
// This allows tests and other binaries to import modules

pub mod aggregator;
pub mod dashboard;
pub mod dates;
pub mod feed_parser;
pub mod ingestion;
pub mod press_review;
pub mod registry;
pub mod scraping;
pub mod server;
pub mod tts;
