//! Shared pieces of the transmit and receive demos: link configuration,
//! logging setup and the random symbol source.

pub mod config;
pub mod generator;
pub mod logging;
