//! Scraper and attribution engine for Transfermarkt player match statistics.
//!
//! The engine (`minute`, `scanner`, `match_report`, `performance`,
//! `attribution`) is pure and performs no I/O. The remaining modules fetch
//! documents, cache match reports and persist results.

pub mod attribution;
pub mod cache;
pub mod collector;
pub mod config;
pub mod error;
pub mod fetch;
pub mod match_report;
pub mod matches;
pub mod metrics;
pub mod minute;
pub mod output;
pub mod performance;
pub mod scanner;
pub mod types;
pub mod utils;
pub mod vocabulary;

pub use attribution::{attribute, attribute_goals, derive_starting_and_window};
pub use error::{EngineError, FetchError};
pub use match_report::{extract_goal_events, extract_substitution_minutes};
pub use performance::{PerformancePage, PerformanceTable};
pub use types::{AttributionResult, GoalEvent, MatchDocument, PerformanceRow};
