// Library for tests to access modules

pub mod baseline;
pub mod config;
pub mod delta;
pub mod error;
pub mod models;
pub mod sampler;
pub mod sources;
pub mod worker;
