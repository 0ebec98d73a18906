//! Input classification and limits shared by client and server.

use chrono::{DateTime, TimeZone};

use crate::error::{GraphvcError, GraphvcResult};

/// Shorter text inputs rarely describe a funding event.
pub const MIN_INPUT_CHARS: usize = 200;

/// Content sent to the extraction model is capped at this many characters.
pub const MAX_CONTENT_CHARS: usize = 32_000;

const MAX_TITLE_CHARS: usize = 60;

/// True when the input should be scraped rather than analyzed as text.
pub fn is_url(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.starts_with("https://") || trimmed.starts_with("http://")
}

/// Reject text inputs too short to analyze.
pub fn validate_input_length(text: &str) -> GraphvcResult<&str> {
    let actual = text.trim().chars().count();
    if actual < MIN_INPUT_CHARS {
        return Err(GraphvcError::InputTooShort {
            min: MIN_INPUT_CHARS,
            actual,
        });
    }
    Ok(text)
}

/// Truncate to [`MAX_CONTENT_CHARS`] characters.
pub fn cap_content(text: &str) -> &str {
    truncate_chars(text, MAX_CONTENT_CHARS)
}

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Display title for a generated graph.
///
/// URLs become `domain · Mon D`; text becomes its first 60 characters.
pub fn auto_title<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let trimmed = input.trim();

    if is_url(trimmed) {
        let domain = url::Url::parse(trimmed)
            .ok()
            .and_then(|u| {
                u.host_str().map(|host| match u.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                })
            })
            .unwrap_or_else(|| trimmed.to_string());
        let domain = domain.strip_prefix("www.").unwrap_or(&domain).to_string();
        return format!("{} · {}", domain, now.format("%b %-d"));
    }

    let head = truncate_chars(trimmed, MAX_TITLE_CHARS);
    if head.len() < trimmed.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}
