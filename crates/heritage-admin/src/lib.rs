//! # Heritage Admin Library
//!
//! Resource definitions and service wiring for the heritage game's content backend.
//! Exposed as a library so integration tests can drive the services against mock
//! transports.

pub mod lifecycle;
pub mod model;
pub mod services;
