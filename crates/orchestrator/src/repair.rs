//! Structured output recovery
//!
//! Text generators asked for JSON still wrap it in prose, fence it as
//! markdown, leave trailing commas, use single quotes, or stop mid-object.
//! `repair` runs a fixed sequence of strategies and accepts the first
//! candidate that actually parses:
//!
//! 1. the raw text as-is
//! 2. the text from the first `{` or `[` on (drops reasoning preamble)
//! 3. the body of a fenced code block
//! 4. the first balanced object, then the first balanced array
//! 5. trailing commas removed
//! 6. single-quoted keys and values rewritten with double quotes
//! 7. unclosed strings, objects and arrays closed
//! 8. everything between the first `{` and the last `}`

use serde::de::IgnoredAny;
use tracing::debug;

/// Upper bound on start positions tried when looking for a balanced value.
const MAX_BALANCED_SCAN: usize = 32;

/// No strategy produced parseable JSON. Carries the untouched input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no repair strategy produced valid JSON")]
pub struct RepairFailed {
    pub original: String,
}

/// Coerce `raw` into text that parses as JSON.
pub fn repair(raw: &str) -> Result<String, RepairFailed> {
    if is_valid(raw) {
        return Ok(raw.to_string());
    }

    let body = strip_preamble(raw);
    if let Some(found) = accept("strip_preamble", body) {
        return Ok(found);
    }

    let base = fenced_block(raw).or(body).unwrap_or_else(|| raw.trim());
    if let Some(found) = accept("fenced_block", Some(base)) {
        return Ok(found);
    }

    let mut first_balanced = None;
    for (open, close) in [('{', '}'), ('[', ']')] {
        for candidate in balanced_values(base, open, close) {
            first_balanced.get_or_insert(candidate);
            if let Some(found) = accept("balanced_extract", Some(candidate)) {
                return Ok(found);
            }
        }
    }

    let working = first_balanced.unwrap_or(base);
    let without_commas = strip_trailing_commas(working);
    if let Some(found) = accept("trailing_commas", Some(&without_commas)) {
        return Ok(found);
    }

    let quoted = normalize_single_quotes(&without_commas);
    if let Some(found) = accept("single_quotes", Some(&quoted)) {
        return Ok(found);
    }

    let closed = close_truncated(&quoted);
    if let Some(found) = accept("close_truncated", Some(&closed)) {
        return Ok(found);
    }
    if let Some(found) = accept("close_truncated", Some(&strip_trailing_commas(&closed))) {
        return Ok(found);
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}'))
        && start < end
    {
        let span = &raw[start..=end];
        if let Some(found) = accept("brace_span", Some(span)) {
            return Ok(found);
        }
        if let Some(found) = accept("brace_span", Some(&strip_trailing_commas(span))) {
            return Ok(found);
        }
    }

    Err(RepairFailed {
        original: raw.to_string(),
    })
}

/// Repair `raw` and parse the result.
pub fn parse_repaired(raw: &str) -> Result<serde_json::Value, RepairFailed> {
    let repaired = repair(raw)?;
    serde_json::from_str(&repaired).map_err(|_| RepairFailed {
        original: raw.to_string(),
    })
}

fn is_valid(text: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(text).is_ok()
}

fn accept(strategy: &'static str, candidate: Option<&str>) -> Option<String> {
    let candidate = candidate?;
    if is_valid(candidate) {
        debug!(strategy, "structured output repaired");
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Text from the first `{` or `[` onwards.
fn strip_preamble(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    Some(text[start..].trim_end())
}

/// Contents of the first ``` fence. An unterminated fence yields everything
/// after the opening line, which lets truncated fenced output reach the
/// later strategies.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body_start = match after.find('\n') {
        Some(nl) if after[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => nl + 1,
        _ => 0,
    };
    let body = &after[body_start..];
    let inner = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    let inner = inner.trim();
    (!inner.is_empty()).then_some(inner)
}

/// Every balanced `open..close` span, trying successive start positions.
fn balanced_values(text: &str, open: char, close: char) -> impl Iterator<Item = &str> {
    text.match_indices(open)
        .take(MAX_BALANCED_SCAN)
        .filter_map(move |(start, _)| balanced_at(text, start, open, close))
}

/// The balanced span starting at `start`, ignoring brackets inside strings.
fn balanced_at(text: &str, start: usize, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop commas that directly precede `}` or `]`, outside string literals.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    out
}

/// Rewrite single-quoted strings as double-quoted ones. Double-quoted
/// strings, including apostrophes inside them, pass through untouched.
fn normalize_single_quotes(text: &str) -> String {
    #[derive(PartialEq)]
    enum Quote {
        None,
        Double,
        Single,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = Quote::None;
    let mut escaped = false;
    for c in text.chars() {
        match state {
            Quote::None => match c {
                '"' => {
                    state = Quote::Double;
                    out.push(c);
                }
                '\'' => {
                    state = Quote::Single;
                    out.push('"');
                }
                _ => out.push(c),
            },
            Quote::Double => {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => state = Quote::None,
                    _ => {}
                }
                out.push(c);
            }
            Quote::Single => {
                if escaped {
                    escaped = false;
                    if c != '\'' {
                        out.push('\\');
                    }
                    out.push(c);
                    continue;
                }
                match c {
                    '\\' => escaped = true,
                    '\'' => {
                        state = Quote::None;
                        out.push('"');
                    }
                    '"' => out.push_str("\\\""),
                    _ => out.push(c),
                }
            }
        }
    }
    out
}

/// Close whatever the generator left open: a dangling string, then every
/// unmatched `{`/`[` (counted outside string literals) in reverse order.
fn close_truncated(text: &str) -> String {
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                if closers.last() == Some(&c) {
                    closers.pop();
                }
            }
            _ => {}
        }
    }

    let mut out = text.trim_end().to_string();
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    } else {
        if out.ends_with(',') {
            out.pop();
        }
        if out.ends_with(':') {
            out.push_str(" null");
        }
    }
    out.extend(closers.iter().rev());
    out
}
