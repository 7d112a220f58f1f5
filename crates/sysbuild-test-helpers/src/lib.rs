//! Test utilities and fixtures for sysbuild
//!
//! This crate provides shared test helpers that can be used by
//! integration tests (tests/ directory) of the core and CLI crates.

pub mod fixtures;
pub mod mocks;

pub use fixtures::ProjectFixture;
pub use mocks::{Invocation, MockToolchain};
