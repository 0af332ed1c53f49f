// Library for tests to access modules

pub mod aggregator;
pub mod baseline;
pub mod config;
pub mod gate;
pub mod harness;
pub mod models;
pub mod rate;
pub mod report;
pub mod source;
pub mod stats;
pub mod trigger;
pub mod version;
pub mod worker;
