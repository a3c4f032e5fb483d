//! Core stage abstractions
//!
//! This module defines the capability contracts every pipeline stage
//! implements and the error type shared by stages and the assembler.

pub mod error;
pub mod stage;

pub use error::*;
pub use stage::*;
