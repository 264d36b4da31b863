//! Accessbar bridge server: cross-frame messages over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Call:     {"id":1, "method":"prefs.set", "params":{"key":"fontSize","value":20}}
//! Message:  {"type":"setFontSize", "payload":20}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Notices the widget posts to its parent frame (`embed-ready`) are written as their own lines.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Instant;

use accessbar::bridge_handler::{handle_method, route};
use accessbar::database::kv_store::SqliteStorage;
use accessbar::dom::Document;
use accessbar::embed::bridge::ParentFrame;
use accessbar::embed::AccessibilityBarEmbed;
use accessbar::services::persistence::{KeyValueStorage, MemoryStorage};
use accessbar::types::config::WidgetConfig;

use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Simple rate limiter: max messages per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the message is allowed, false if throttled.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

/// The embedding frame, reached through stdout.
struct StdoutFrame;

impl ParentFrame for StdoutFrame {
    fn post_message(&mut self, message: &Value) {
        emit(message);
    }
}

fn emit(value: &Value) {
    let mut out = io::stdout().lock();
    if writeln!(out, "{}", value).and_then(|_| out.flush()).is_err() {
        warn!("stdout closed");
    }
}

/// Page the widget mounts into: `ACCESSBAR_PAGE` when set, an empty document otherwise.
fn load_page() -> Document {
    let Ok(path) = std::env::var("ACCESSBAR_PAGE") else {
        return Document::new_html();
    };
    match std::fs::read_to_string(&path).map_err(|e| e.to_string()).and_then(|html| {
        Document::parse_html(&html).map_err(|e| e.to_string())
    }) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(%path, error = %err, "could not load page, using an empty document");
            Document::new_html()
        }
    }
}

fn main() {
    // stdout carries the protocol; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = WidgetConfig::from_env();
    let storage: Box<dyn KeyValueStorage> = match SqliteStorage::open(config.database_path()) {
        Ok(storage) => Box::new(storage),
        Err(err) => {
            warn!(error = %err, "durable preference store unavailable, using memory");
            Box::new(MemoryStorage::new())
        }
    };
    let embed = Mutex::new(
        AccessibilityBarEmbed::new(load_page(), config, storage).with_parent(Box::new(StdoutFrame)),
    );

    // Signal ready
    emit(&json!({"event":"ready","version":env!("CARGO_PKG_VERSION")}));
    info!("bridge ready");

    // Pointer moves arrive at display rate; anything far beyond that is a runaway sender
    let mut rate_limiter = RateLimiter::new(500);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() { continue; }

        let request: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&json!({"id":null,"error":format!("parse error: {}",e)}));
                continue;
            }
        };

        let (id, method, params) = route(&request);

        if !rate_limiter.check() {
            emit(&json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let response = match handle_method(&embed, &method, &params) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&response);
    }
    info!("stdin closed, bridge exiting");
}
