//! Subcommand implementations

pub mod archive;
pub mod config;
pub mod doctor;
pub mod ids;
pub mod latest;
pub mod output;
pub mod search;
pub mod show;
pub mod stats;
