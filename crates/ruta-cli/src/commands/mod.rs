//! CLI command implementations.

pub mod common;
pub mod inspect;
pub mod platforms;
pub mod simulate;
pub mod validate;
