//! Clubstore CLI - Command-line interface for the club store.
//!
//! This crate provides the operator tool for checking which database driver
//! works on a host, listing tables, and running one-off statements through
//! the connection manager.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
