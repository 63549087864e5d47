//! Test fixtures shared by Midras integration tests.

pub mod fixtures;
