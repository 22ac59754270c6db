//! Test harness utilities for exercising connection establishment.
//!
//! This module provides a scriptable transport engine and a handful of
//! endpoints shared by the integration tests.

#![allow(dead_code, unused_imports)]

mod endpoints;
mod engine;

pub use endpoints::{CountingEndpoint, DeclaredChat, DeclaredEcho, Undeclared};
pub use engine::{Behavior, MockEngine, Recorded, Rejected};

pub const ECHO_URL: &str = "ws://localhost:8025/echo";
