//! # Note previews
//!
//! Rendering a block document is asynchronous, and the content can change or the
//! preview can disappear before a render finishes. [`PreviewGuard`] hands out
//! generation tickets; [`render_preview`] only returns a result whose ticket is
//! still current.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

#[derive(Clone, Debug, Default)]
pub struct PreviewGuard {
    generation: Arc<AtomicU64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreviewTicket(u64);

impl PreviewGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new ticket. Every older ticket stops being current.
    pub fn ticket(&self) -> PreviewTicket {
        PreviewTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: PreviewTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Invalidate every outstanding ticket.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Preview {
    /// The document has no blocks.
    Empty,
    Rendered(String),
    Failed,
}

/// Render `content` (a serialized block array) with `renderer`.
///
/// Returns `None` when a newer render or [`PreviewGuard::cancel`] superseded this one.
pub async fn render_preview<F, Fut, E>(content: &str, guard: &PreviewGuard, renderer: F) -> Option<Preview>
where
    F: FnOnce(Vec<Value>) -> Fut,
    Fut: Future<Output = Result<String, E>>,
    E: std::fmt::Display,
{
    let ticket = guard.ticket();
    let blocks = match serde_json::from_str::<Vec<Value>>(content) {
        Ok(blocks) if blocks.is_empty() => return Some(Preview::Empty),
        Ok(blocks) => blocks,
        Err(err) => {
            tracing::debug!(error = %err, "note content is not a block array");
            return Some(Preview::Failed);
        }
    };

    let preview = match renderer(blocks).await {
        Ok(html) => Preview::Rendered(html),
        Err(err) => {
            tracing::debug!(error = %err, "preview render failed");
            Preview::Failed
        }
    };
    guard.is_current(ticket).then_some(preview)
}

/// Text of a block document, one line per block, children after their parent.
///
/// Content that is not a block array is returned unchanged.
pub fn plain_text(content: &str) -> String {
    let Ok(blocks) = serde_json::from_str::<Vec<Value>>(content) else {
        return content.to_string();
    };
    let mut lines = Vec::new();
    collect_lines(&blocks, &mut lines);
    lines.join("\n")
}

fn collect_lines(blocks: &[Value], lines: &mut Vec<String>) {
    for block in blocks {
        let mut text = String::new();
        inline_text(block.get("content").unwrap_or(&Value::Null), &mut text);
        if !text.is_empty() {
            lines.push(text);
        }
        if let Some(children) = block.get("children").and_then(Value::as_array) {
            collect_lines(children, lines);
        }
    }
}

fn inline_text(content: &Value, out: &mut String) {
    match content {
        Value::String(s) => out.push_str(s),
        Value::Array(items) => items.iter().for_each(|item| inline_text(item, out)),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            // Links nest their text one level down.
            if let Some(inner) = map.get("content") {
                inline_text(inner, out);
            }
        }
        _ => {}
    }
}
