//! Captured form of a tracing event.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level};

/// A severe event captured for alerting. Built once per event, never stored.
#[derive(Debug, Clone)]
pub struct AlertRecord {
    pub level: Level,
    pub message: String,
    /// Structured fields other than `message`, in emission order.
    pub fields: Vec<(String, String)>,
    pub target: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl AlertRecord {
    /// Capture an event as it is being emitted.
    pub fn from_event(event: &Event<'_>) -> Self {
        let metadata = event.metadata();
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        Self {
            level: *metadata.level(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            target: metadata.target().to_string(),
            file: metadata.file().map(str::to_string),
            line: metadata.line(),
            timestamp: Utc::now(),
        }
    }

    /// Single-line rendering:
    /// `2026-01-02 03:04:05,678 ERROR: message key=value [in src/lib.rs:42]`
    pub fn format_line(&self) -> String {
        let mut out = format!(
            "{} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level,
            self.message
        );

        for (key, value) in &self.fields {
            out.push(' ');
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }

        match (&self.file, self.line) {
            (Some(file), Some(line)) => out.push_str(&format!(" [in {}:{}]", file, line)),
            (Some(file), None) => out.push_str(&format!(" [in {}]", file)),
            _ => out.push_str(&format!(" [in {}]", self.target)),
        }

        out
    }

    /// HTML body: the formatted line, escaped, inside a `<pre>` block.
    pub fn to_html(&self) -> String {
        format!("<pre>{}</pre>", escape_html(&self.format_line()))
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }
}
