//! Core types for Teabridge

mod identity;
mod result;

pub use identity::*;
pub use result::*;
