//! JavaScript injected into the page after each load.
//!
//! Every snippet is idempotent: running it twice leaves the page in the same
//! state, so a re-injection after an appearance change or a reload is safe.

use crate::websites::Website;

/// Element id of the user CSS `<style>` tag.
pub const CSS_STYLE_ID: &str = "plash-css";

/// Element id of the color inversion `<style>` tag.
pub const INVERT_STYLE_ID: &str = "plash-invert";

const INVERT_CSS: &str = "html { filter: invert(1) hue-rotate(180deg) !important; } \
img, video, picture, canvas, iframe, svg image, [style*=\"background-image\"] \
{ filter: invert(1) hue-rotate(180deg) !important; }";

/// Page-independent inputs for the injection script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionContext {
    /// The system appearance is dark.
    pub dark_appearance: bool,
    /// Audio and video elements should be muted.
    pub mute_audio: bool,
}

/// Builds the full script for a freshly loaded page.
#[must_use]
pub fn build_injection(website: &Website, ctx: InjectionContext) -> String {
    let mut parts = Vec::with_capacity(5);

    parts.push(style_script(CSS_STYLE_ID, website.css.trim()));
    parts.push(invert_script(website.invert_colors.applies(ctx.dark_appearance)));

    if website.use_print_styles {
        parts.push(print_styles_script().to_string());
    }

    if ctx.mute_audio {
        parts.push(mute_script().to_string());
    }

    let javascript = website.javascript.trim();
    if !javascript.is_empty() {
        parts.push(user_script(javascript));
    }

    parts.join("\n")
}

/// Adds or removes the inversion style without touching anything else.
#[must_use]
pub fn invert_script(enabled: bool) -> String {
    style_script(INVERT_STYLE_ID, if enabled { INVERT_CSS } else { "" })
}

/// Upserts a `<style>` element with the given id. Empty CSS removes it.
fn style_script(id: &str, css: &str) -> String {
    let id = json_string(id);
    if css.is_empty() {
        return format!("(() => {{ document.getElementById({id})?.remove(); }})();");
    }

    let css = json_string(css);
    format!(
        "(() => {{ \
let style = document.getElementById({id}); \
if (!style) {{ style = document.createElement('style'); style.id = {id}; \
(document.head || document.documentElement).appendChild(style); }} \
style.textContent = {css}; \
}})();"
    )
}

/// Makes rules and stylesheets that target `print` also apply on screen.
const fn print_styles_script() -> &'static str {
    "(() => { \
for (const sheet of Array.from(document.styleSheets)) { \
try { \
if (sheet.media && sheet.media.mediaText.includes('print')) { sheet.media.appendMedium('screen'); } \
for (const rule of Array.from(sheet.cssRules || [])) { \
if (rule.media && rule.media.mediaText.includes('print')) { rule.media.appendMedium('screen'); } \
} \
} catch (_) {} \
} \
for (const link of document.querySelectorAll('link[rel=\"stylesheet\"][media]')) { \
if (link.media.includes('print')) { link.media = 'all'; } \
} \
})();"
}

/// Mutes current media elements and any added later.
const fn mute_script() -> &'static str {
    "(() => { \
const mute = (el) => { el.muted = true; el.volume = 0; }; \
document.querySelectorAll('audio, video').forEach(mute); \
if (window.__plashMuteObserver) { return; } \
window.__plashMuteObserver = new MutationObserver((records) => { \
for (const record of records) { \
for (const node of record.addedNodes) { \
if (node instanceof HTMLMediaElement) { mute(node); } \
else if (node.querySelectorAll) { node.querySelectorAll('audio, video').forEach(mute); } \
} \
} \
}); \
window.__plashMuteObserver.observe(document.documentElement, { childList: true, subtree: true }); \
})();"
}

/// Wraps user JavaScript so a throwing script cannot break the injection.
fn user_script(javascript: &str) -> String {
    format!("try {{\n{javascript}\n}} catch (error) {{ console.error('Plash custom JavaScript:', error); }}")
}

fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
