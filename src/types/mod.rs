// Accessbar shared type definitions
// Each submodule defines types used across the widget.

pub mod config;
pub mod errors;
pub mod feature;
pub mod preferences;
