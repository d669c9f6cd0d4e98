//! The `utils` module provides a collection of utility functions and common
//! definitions used across the relay.
//!
//! It centralizes the error types shared by the dispatchers and collaborators,
//! and the tracing setup used by the binary.

pub mod error;
pub mod logging;
