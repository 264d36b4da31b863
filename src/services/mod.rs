// Accessbar services
// Services hold the behavior around the preference store: persistence, self-exclusion, DOM effects,
// reading overlays, page text extraction, speech gating and the remote feature API.

pub mod effect_engine;
pub mod effects;
pub mod feature_api;
pub mod frame;
pub mod overlays;
pub mod page_text;
pub mod persistence;
pub mod request_sequencer;
pub mod self_exclusion;
pub mod speech;
