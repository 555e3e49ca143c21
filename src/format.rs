use crate::types::DocumentSource;
use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use once_cell::sync::Lazy;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options
});

const TURN_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

/// Answers come back as markdown; raw HTML in them is dropped.
pub fn markdown_to_html(md: &str) -> String {
    let adapter = SyntectAdapter::new(Some("base16-ocean.dark"));
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&adapter);
    markdown_to_html_with_plugins(md, &MARKDOWN_OPTIONS, &plugins)
}

pub fn format_turn_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(TURN_TIME_FORMAT).ok()
}

pub fn format_elapsed(elapsed_ms: f64) -> String {
    let secs = elapsed_ms / 1000.0;
    if secs >= 10.0 {
        format!("{secs:.0}s")
    } else if secs >= 1.0 {
        format!("{secs:.1}s")
    } else {
        format!("{elapsed_ms:.0} ms")
    }
}

pub fn source_label(source: &DocumentSource) -> String {
    let name = if source.document_name.is_empty() {
        format!("Source {}", source.id)
    } else {
        source.document_name.clone()
    };
    match source.page {
        Some(page) => format!("{name}, page {page}"),
        None => name,
    }
}

/// Script copying `text` to the browser clipboard.
pub fn clipboard_script(text: &str) -> String {
    // A JSON string literal is also a valid JS string literal.
    let literal = serde_json::Value::String(text.to_string()).to_string();
    format!("navigator.clipboard.writeText({literal});")
}

/// Script scrolling the element with `element_id` to its last line.
pub fn scroll_to_bottom_script(element_id: &str) -> String {
    let literal = serde_json::Value::String(element_id.to_string()).to_string();
    format!(
        "const el = document.getElementById({literal}); if (el) {{ el.scrollTop = el.scrollHeight; }}"
    )
}
