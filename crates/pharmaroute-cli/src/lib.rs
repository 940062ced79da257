//! PharmaRoute CLI library.
//!
//! This crate provides command-line interface utilities for the PharmaRoute
//! tools, including terminal styling and output formatting.

pub mod output;
pub mod terminal;
