//! Subcommand handlers

pub mod models;
pub mod polish;
