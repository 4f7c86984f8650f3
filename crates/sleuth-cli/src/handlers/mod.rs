//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - A page-level function that works on any [`sleuth::Page`]
//! - Tests against static pages

pub mod config;
pub mod extract;
pub mod inputs;
pub mod links;
pub mod resolve;

// Re-export handlers for convenient access
pub use config::{execute_config, render_config};
pub use extract::{execute_extract, extract_facts, Lookup};
pub use inputs::{execute_inputs, find_zip_input};
pub use links::{check_page_links, execute_links};
pub use resolve::{build_scope, build_synonyms, execute_resolve, resolve_control};
