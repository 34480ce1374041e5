//! Conformance testing harness for vstdio.
//!
//! This crate provides:
//! - Fixtures: JSON scripts of stream and renderer operations with the
//!   outcome expected from each step
//! - Runner: replays a fixture set against a fresh `Stdio` per case
//! - Report generation: markdown + JSON conformance reports

#![forbid(unsafe_code)]

pub mod diff;
pub mod error;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod verify;

pub use error::HarnessError;
pub use fixtures::{ArgValue, FixtureCase, FixtureSet, Step};
pub use report::ConformanceReport;
pub use runner::TestRunner;
pub use verify::{VerificationResult, VerificationSummary};
