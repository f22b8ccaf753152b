//! Command implementations for the Sluice CLI

pub mod run;
pub mod validate;
