// Public API
pub mod cli;
pub mod commands;

// Core domain types
pub mod config;
pub mod error;
pub mod manifest;
pub mod requirement;
mod ui;

// Re-export main types
pub use config::Config;
pub use error::{Finding, MalformedReason, ParseError, ParseErrors};
pub use manifest::{parse, render, Line, Manifest, ParseOutcome, Section};
pub use requirement::{Entry, Operator};
