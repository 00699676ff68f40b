//! Integration test suite for patchup
//!
//! End-to-end tests exercising the command pipeline, the update session
//! strategies and the CLI surface against real temporary installation roots.
//! Network and archive collaborators are the in-memory fakes from
//! `patchup::test_utils`, except where a test deliberately targets the real
//! HTTP stack's failure behavior.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **install**: full-content installation, staging cleanup, cancellation
//! - **download**: package download, reuse and checksum verification
//! - **uninstall**: removal of registered files and stale records
//! - **validate**: read-only integrity audits
//! - **session**: strategy selection and end-to-end session runs
//! - **cli**: the patchup binary's surface

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod download;
mod install;
mod session;
mod uninstall;
mod validate;
