//! Method handler for the Accessbar bridge protocol.
//!
//! Extracted from `bridge_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches one bridge call to the mounted widget through
//! `AccessibilityBarEmbed`, the same path a parent frame's messages take.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::app::AccessibilityContext;
use crate::embed::AccessibilityBarEmbed;
use crate::managers::preference_slice::SetOutcome;
use crate::types::config::EmbedOptions;
use crate::types::preferences::PreferenceKey;

/// Wire name of a write outcome.
pub fn outcome_name(outcome: SetOutcome) -> &'static str {
    match outcome {
        SetOutcome::Committed => "committed",
        SetOutcome::Unchanged => "unchanged",
        SetOutcome::Rejected => "rejected",
    }
}

fn outcome_json(outcome: SetOutcome) -> Value {
    json!({"outcome": outcome_name(outcome)})
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

fn number_param(params: &Value, name: &str) -> Result<f64, String> {
    params
        .get(name)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| format!("missing {}", name))
}

fn key_param(params: &Value) -> Result<PreferenceKey, String> {
    let name = str_param(params, "key")?;
    PreferenceKey::from_name(name).ok_or_else(|| format!("unknown preference: {}", name))
}

/// Runs `f` against the mounted context.
fn with_context<T>(
    embed: &Mutex<AccessibilityBarEmbed>,
    f: impl FnOnce(&mut AccessibilityContext) -> T,
) -> Result<T, String> {
    let mut guard = embed.lock().map_err(|e| e.to_string())?;
    let ctx = guard.context_mut().ok_or("accessibility bar is not mounted")?;
    Ok(f(ctx))
}

/// Dispatch one bridge method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(embed: &Mutex<AccessibilityBarEmbed>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Embed API ───
        "embed.init" => {
            let options: EmbedOptions = if params.is_null() {
                EmbedOptions::default()
            } else {
                serde_json::from_value(params.clone()).map_err(|e| format!("invalid options: {}", e))?
            };
            let mut e = embed.lock().map_err(|e| e.to_string())?;
            let mounted = e.init(options).map_err(|e| e.to_string())?;
            Ok(json!({"mounted": mounted}))
        }
        "embed.message" => {
            let mut e = embed.lock().map_err(|e| e.to_string())?;
            match e.handle_message(params).map_err(|e| e.to_string())? {
                Some(outcome) => Ok(json!({"handled": true, "outcome": outcome_name(outcome)})),
                None => Ok(json!({"handled": false})),
            }
        }
        "embed.setFontSize" => {
            let size = number_param(params, "size")?;
            let mut e = embed.lock().map_err(|e| e.to_string())?;
            e.set_font_size(size).map(outcome_json).map_err(|e| e.to_string())
        }
        "embed.setFontStyle" => {
            let style = str_param(params, "style")?;
            let mut e = embed.lock().map_err(|e| e.to_string())?;
            e.set_font_style(style).map(outcome_json).map_err(|e| e.to_string())
        }
        "embed.setTextAlign" => {
            let align = str_param(params, "align")?;
            let mut e = embed.lock().map_err(|e| e.to_string())?;
            e.set_text_align(align).map(outcome_json).map_err(|e| e.to_string())
        }
        "embed.toggleHighContrast" => {
            let enabled = params.get("enabled").and_then(|v| v.as_bool()).ok_or("missing enabled")?;
            let mut e = embed.lock().map_err(|e| e.to_string())?;
            e.toggle_high_contrast(enabled).map(outcome_json).map_err(|e| e.to_string())
        }

        // ─── Preferences ───
        "prefs.get" => {
            let key = key_param(params)?;
            with_context(embed, |ctx| ctx.get(key).to_json())
        }
        "prefs.all" => with_context(embed, |ctx| ctx.to_json()),
        "prefs.set" => {
            let name = str_param(params, "key")?;
            let value = params.get("value").ok_or("missing value")?;
            let outcome = with_context(embed, |ctx| ctx.set_by_name(name, value))?;
            outcome.map(outcome_json).map_err(|e| e.to_string())
        }
        "prefs.toggle" => {
            let key = key_param(params)?;
            if key.default_value().as_bool().is_none() {
                return Err(format!("not a toggle: {}", key.name()));
            }
            with_context(embed, |ctx| outcome_json(ctx.toggle(key)))
        }
        "prefs.reset" => with_context(embed, |ctx| json!({"restored": ctx.reset_all()})),
        "font.increase" => with_context(embed, |ctx| outcome_json(ctx.increase_font_size())),
        "font.decrease" => with_context(embed, |ctx| outcome_json(ctx.decrease_font_size())),
        "font.reset" => with_context(embed, |ctx| outcome_json(ctx.reset_font_size())),
        "zoom.increase" => with_context(embed, |ctx| outcome_json(ctx.increase_page_zoom())),
        "zoom.decrease" => with_context(embed, |ctx| outcome_json(ctx.decrease_page_zoom())),
        "speech.toggleTextToSpeech" => with_context(embed, |ctx| {
            let status = ctx.toggle_text_to_speech();
            json!({"ready": status.is_ready(), "status": status.to_string()})
        }),
        "speech.toggleSpeechToText" => with_context(embed, |ctx| {
            let status = ctx.toggle_speech_to_text();
            json!({"ready": status.is_ready(), "status": status.to_string()})
        }),

        // ─── Pointer tracking ───
        "pointer.move" => {
            let x = number_param(params, "x")?;
            let y = number_param(params, "y")?;
            with_context(embed, |ctx| json!({"frames": ctx.pointer_move(x, y)}))
        }
        "frame.tick" => with_context(embed, |ctx| json!({"updated": ctx.animation_frame()})),

        // ─── Document ───
        "document.html" => {
            let e = embed.lock().map_err(|e| e.to_string())?;
            let doc = e.document().ok_or("no document")?;
            Ok(json!({"html": doc.serialize(doc.root())}))
        }
        "document.refresh" => with_context(embed, |ctx| {
            let report = ctx.refresh_effects();
            json!({"mutated": report.mutated, "skipped": report.skipped, "unchanged": report.unchanged})
        }),

        _ => Err(format!("unknown method: {}", method)),
    }
}

/// Splits one inbound line into `(id, method, params)`.
///
/// Bare cross-frame messages (`{type, payload}` without a `method`) route to `embed.message`.
pub fn route(request: &Value) -> (Value, String, Value) {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    match request.get("method").and_then(|v| v.as_str()) {
        Some(method) => {
            let params = request.get("params").cloned().unwrap_or(json!({}));
            (id, method.to_string(), params)
        }
        None => (id, "embed.message".to_string(), request.clone()),
    }
}
