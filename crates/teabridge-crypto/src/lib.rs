//! Cryptography utilities for Teabridge

pub mod password;

pub use password::*;
