//! Application logic for the page pool load simulator.

pub mod app;
pub mod config;
pub mod errors;
pub mod simulation;
