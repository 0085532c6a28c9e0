//! Simulation configuration management
//!
//! This crate provides configuration loading and parsing:
//! - TOML configuration file parsing with strict field checking
//! - Timer, limit, admission and handover parameters
//! - Network topology and scenario script

pub mod sim_config;
pub mod toml_config;

pub use sim_config::*;
pub use toml_config::*;
