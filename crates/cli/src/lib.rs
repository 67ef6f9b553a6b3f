//! Terminal helpers for freshcart command-line tools
//!
//! Provides shared CLI functionality:
//! - Status messages
//! - Distance, freshness, and price formatting
//! - Search result tables

#![warn(missing_docs)]

pub mod output;
pub mod table;

pub use table::render_results;
