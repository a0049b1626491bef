pub mod batch;
pub mod cli;
pub mod config;
pub mod convert;
pub mod engine;
pub mod logging;
pub mod report;
pub mod scan;
pub mod util;
