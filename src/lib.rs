//! Accessbar, an embeddable accessibility bar for pages it does not own.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod bridge_handler;
pub mod database;
pub mod dom;
pub mod embed;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;
