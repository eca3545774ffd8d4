//! Types shared between the session/sync core and whatever front end drives it

#![warn(unused_crate_dependencies)]

pub mod account;
pub mod const_config;
pub mod errors;
mod macros;
pub mod req_args;
pub mod session;
pub mod telemetry;
pub mod uac;
pub mod user_config;

