//! CSV rendering for the admin export.
//!
//! Four fixed columns, so this is a pair of pure helpers rather than a full
//! CSV dependency: fields containing a comma, quote, or newline are wrapped
//! in double quotes with internal quotes doubled.

use crate::store::Entry;
use std::borrow::Cow;

const HEADER: &str = "first_name,last_name,email,created_at";

/// Quote a single field if it contains a comma, quote, or newline.
#[must_use]
pub fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Render entries as a CSV document with the fixed header row.
#[must_use]
pub fn render_entries(entries: &[Entry]) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(HEADER.to_string());
    for entry in entries {
        lines.push(format!(
            "{},{},{},{}",
            quote_field(&entry.first_name),
            quote_field(&entry.last_name),
            quote_field(&entry.email),
            quote_field(&entry.created_at.to_rfc3339()),
        ));
    }
    lines.join("\n")
}
