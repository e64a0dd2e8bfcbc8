//! Offset pagination with opaque cursors.
//!
//! A cursor is base64 of the JSON object `{"o": offset}`. Offsets are not stable
//! against concurrent inserts or deletes: items may be skipped or repeated between
//! pages. Callers merge by id.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
    /// Takes precedence over `page`.
    #[serde(default)]
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn first(page_size: i64) -> Self {
        PageRequest {
            page: None,
            page_size: Some(page_size),
            cursor: None,
        }
    }

    pub fn effective_page_size(&self) -> usize {
        match self.page_size {
            Some(n) => n.max(1) as usize,
            None => DEFAULT_PAGE_SIZE,
        }
    }

    /// Offset this request starts at.
    pub fn offset(&self) -> usize {
        if let Some(cursor) = &self.cursor {
            return decode_cursor(cursor);
        }
        match self.page {
            Some(page) if page > 1 => (page as usize - 1).saturating_mul(self.effective_page_size()),
            _ => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct CursorPayload {
    o: u64,
}

pub fn encode_cursor(offset: usize) -> String {
    let payload = format!("{{\"o\":{}}}", offset);
    STANDARD.encode(payload.as_bytes())
}

/// Offset encoded in `cursor`. Anything that does not decode is treated as 0.
pub fn decode_cursor(cursor: &str) -> usize {
    let decoded = STANDARD
        .decode(cursor.trim())
        .ok()
        .and_then(|bytes| serde_json::from_slice::<CursorPayload>(&bytes).ok());
    match decoded {
        Some(payload) => payload.o as usize,
        None => {
            tracing::debug!(cursor = %cursor, "malformed cursor; starting from offset 0");
            0
        }
    }
}

/// Cut one page out of a fully materialized list.
pub fn paginate<T>(items: Vec<T>, request: &PageRequest) -> Page<T> {
    let page_size = request.effective_page_size();
    let total = items.len();
    let offset = request.offset().min(total);
    let items: Vec<T> = items.into_iter().skip(offset).take(page_size).collect();
    let end = offset + items.len();
    let has_more = end < total;
    Page {
        items,
        total,
        page: offset / page_size + 1,
        page_size,
        has_more,
        next_cursor: has_more.then(|| encode_cursor(end)),
    }
}
