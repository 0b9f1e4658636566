#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Harness primitives: types, errors, reward economics.

pub mod economics;
pub mod error;
pub mod types;
