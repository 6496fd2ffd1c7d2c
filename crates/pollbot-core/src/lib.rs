//! Core pieces shared by the polling bot crates.
//!
//! This crate is framework-agnostic: the remote API transport lives in
//! `pollbot-telegram`, the polling loop in `pollbot-runtime`.

pub mod config;
pub mod cursor;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod utils;

pub use errors::{Error, Result};
