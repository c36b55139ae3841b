//! Integration test suite for runseq.
//!
//! # Test Categories
//!
//! - `sequence_e2e`: Group ordering, abort, and cleanup against a fake host
//! - `validation`: Configuration errors raised before anything starts
//! - `process_host`: Real shell commands through the process scheduler

mod fixtures;

mod process_host;
mod validation;
