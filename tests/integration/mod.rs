//! Integration tests for the echo function.
//!
//! These tests send requests through the full router (request-id, metrics,
//! compression and CORS layers included) and check the echoed JSON.

pub mod common;
pub mod server_test;
