#![warn(unused_crate_dependencies)]

pub mod cli;
pub mod commands;
pub mod runtime;
pub mod tracing;
