// The binary is a thin NDJSON driver; integration tests link this library.
pub mod cli;
pub mod config;
pub mod gate;
pub mod interaction;
pub mod logging;
pub mod mention;
pub mod pipeline;
pub mod replay;
pub mod telemetry;
