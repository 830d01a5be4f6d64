//! PyO3 FFI bindings
//!
//! This module provides the Python interface to the Rust basin model.
//!
//! The boundary is kept minimal: configuration and hydrology cross it as
//! JSON strings, parameters as a list of floats, and results come back as
//! plain tuples.

pub mod model;
