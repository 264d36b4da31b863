//! Accessbar demo binary.
//!
//! Mounts the widget on a fixture page and walks through preferences, effects,
//! overlays, persistence and reset as a console demo.

use accessbar::dom::{Document, DomRect};
use accessbar::embed::AccessibilityBarEmbed;
use accessbar::services::overlays::OverlayKind;
use accessbar::types::config::{EmbedOptions, WidgetConfig};
use accessbar::types::preferences::PreferenceKey;
use tracing_subscriber::EnvFilter;

const FIXTURE_PAGE: &str = r#"<html><head><title>Fixture</title></head><body>
<header><h1>Town library</h1><nav><a href="/hours">Opening hours</a></nav></header>
<main data-accessible-content="">
<h2>Events this week</h2>
<p style="color: #333333">Story time for children starts at ten on Saturday morning.</p>
<p>The reading club meets in the east wing.</p>
<img src="/map.png" alt="Map of the east wing">
<button type="button">Reserve a seat</button>
</main>
</body></html>"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Accessbar v{} — Demo Mode                   ║", env!("CARGO_PKG_VERSION"));
    println!("║     Embeddable accessibility bar for any web page           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let page = Document::parse_html(FIXTURE_PAGE).expect("fixture page parses");
    let mut embed = AccessibilityBarEmbed::in_memory(page, WidgetConfig::default());

    demo_mount(&mut embed);
    demo_text(&mut embed);
    demo_visual(&mut embed);
    demo_overlays(&mut embed);
    demo_persistence();
    demo_reset(&mut embed);

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ Accessbar demo finished");
    println!("═══════════════════════════════════════════════════════════════");
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn demo_mount(embed: &mut AccessibilityBarEmbed) {
    section("Embed Bootstrapper");

    let mounted = embed.init(EmbedOptions::default()).expect("mount succeeds");
    println!("  First init mounted: {}", mounted);
    let again = embed.init(EmbedOptions::default()).expect("second init is a no-op");
    println!("  Second init mounted: {}", again);

    if let Some(mount) = embed.mount_info() {
        println!("  Host {:?}, shadow root {:?}, launcher {:?}", mount.host, mount.shadow_root, mount.launcher);
    }
    println!("  ✓ Embed OK");
    println!();
}

fn demo_text(embed: &mut AccessibilityBarEmbed) {
    section("Text Preferences");

    let outcome = embed.set_font_size(20.0).expect("mounted");
    println!("  setFontSize(20): {:?}", outcome);
    match embed.set_font_style("comic") {
        Ok(outcome) => println!("  setFontStyle(comic): {:?}", outcome),
        Err(err) => println!("  setFontStyle(comic) refused: {}", err),
    }
    embed.set_font_style("dyslexic").expect("known style");
    embed.set_text_align("center").expect("known alignment");

    let Some(ctx) = embed.context_mut() else { return };
    ctx.increase_font_size();
    ctx.set(PreferenceKey::CharacterSpacing, 0.1);
    println!("  fontSize = {}", ctx.prefs().get_number(PreferenceKey::FontSize));

    let doc = ctx.document();
    if let Ok(Some(p)) = doc.query_selector(doc.root(), "main p") {
        println!("  First paragraph: {}", doc.serialize(p));
    }
    println!("  ✓ Text OK");
    println!();
}

fn demo_visual(embed: &mut AccessibilityBarEmbed) {
    section("Visual Preferences and Cascade");

    let Some(ctx) = embed.context_mut() else { return };
    ctx.set(PreferenceKey::BackgroundColor, "#1E293B");
    println!(
        "  background #1E293B -> text {} / headings {}",
        ctx.prefs().get_str(PreferenceKey::TextColor),
        ctx.prefs().get_str(PreferenceKey::HeadingColor)
    );
    ctx.set(PreferenceKey::ColorBlindFilter, "deuteranopia");
    println!(
        "  filter deuteranopia -> background \"{}\", text {}",
        ctx.prefs().get_str(PreferenceKey::BackgroundColor),
        ctx.prefs().get_str(PreferenceKey::TextColor)
    );
    ctx.toggle(PreferenceKey::HighContrast);
    ctx.set(PreferenceKey::CursorSize, 3.0);

    let doc = ctx.document();
    let root = doc.document_element();
    println!("  Root element: {}", doc.serialize(root).lines().next().unwrap_or_default());
    println!("  ✓ Visual OK");
    println!();
}

fn demo_overlays(embed: &mut AccessibilityBarEmbed) {
    section("Reading Overlays");

    let Some(ctx) = embed.context_mut() else { return };
    let doc = ctx.document_mut();
    if let Ok(Some(p)) = doc.query_selector(doc.root(), "main p") {
        let _ = doc.set_rect(p, DomRect::new(0.0, 100.0, 800.0, 48.0));
    }

    ctx.set(PreferenceKey::ReadingRuler, true);
    ctx.set(PreferenceKey::ReadingMask, true);
    ctx.set(PreferenceKey::Magnifier, true);

    let mut opened = 0;
    for step in 0..10 {
        opened += ctx.pointer_move(40.0 + step as f64, 120.0);
    }
    let updated = ctx.animation_frame();
    println!("  10 pointer moves opened {} frames, one tick updated {} overlays", opened, updated);
    for kind in OverlayKind::ALL {
        println!("    {:<10} active={}", kind.name(), ctx.overlays().is_active(kind));
    }
    if let Some(text) = ctx.overlays().lens_text() {
        println!("  Lens shows: \"{}\"", text);
    }
    println!("  ✓ Overlays OK");
    println!();
}

fn demo_persistence() {
    use accessbar::app::AccessibilityContext;
    section("Durable Persistence (SQLite)");

    let dir = std::env::temp_dir().join(format!("accessbar-demo-{}", std::process::id()));
    let config = WidgetConfig { data_dir: Some(dir.clone()), ..WidgetConfig::default() };
    if std::fs::create_dir_all(&dir).is_err() {
        println!("  Skipped: temp dir unavailable");
        return;
    }

    {
        let mut ctx = AccessibilityContext::open(Document::new_html(), config.clone());
        ctx.set(PreferenceKey::DarkMode, true);
        ctx.set(PreferenceKey::LineHeight, 1.8);
        ctx.set(PreferenceKey::PageSummary, true);
        println!("  Wrote darkMode, lineHeight and pageSummary");
    }
    let ctx = AccessibilityContext::open(Document::new_html(), config);
    println!(
        "  Reloaded: darkMode={} lineHeight={} pageSummary={} (session only)",
        ctx.prefs().get_bool(PreferenceKey::DarkMode),
        ctx.prefs().get_number(PreferenceKey::LineHeight),
        ctx.prefs().get_bool(PreferenceKey::PageSummary)
    );
    let _ = std::fs::remove_dir_all(&dir);
    println!("  ✓ Persistence OK");
    println!();
}

fn demo_reset(embed: &mut AccessibilityBarEmbed) {
    section("Reset");

    let Some(ctx) = embed.context_mut() else { return };
    let restored = ctx.reset_all();
    let doc = ctx.document();
    println!("  Restored {} DOM changes", restored);
    if let Ok(Some(p)) = doc.query_selector(doc.root(), "main p") {
        println!("  First paragraph: {}", doc.serialize(p));
    }
    println!("  fontSize = {}", ctx.prefs().get_number(PreferenceKey::FontSize));
    println!("  ✓ Reset OK");
}
