//! Placeholder expansion: rewrite a SQL template and a tree of parameter
//! values into flat SQL (one `?` per bind slot) plus a flattened bind list.

mod scanner;

use scanner::{
    State, is_block_comment_end, is_block_comment_start, is_line_comment_start, scan_identifier,
};

use crate::error::DaoError;
use crate::types::ParamValue;

/// One piece of a scanned template: literal text, a `?`, or a `:name` token.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Positional,
    Named(String),
}

/// Split a template into literal text and placeholder tokens.
///
/// Placeholders inside quoted strings and comments are literal text; the
/// scan is a lightweight state machine, not a SQL parser.
fn scan_template(sql: &str) -> Vec<Segment> {
    let bytes = sql.as_bytes();
    let mut segments = Vec::new();
    let mut state = State::Normal;
    let mut seg_start = 0;
    let mut idx = 0;

    fn push_text(segments: &mut Vec<Segment>, text: &str) {
        if !text.is_empty() {
            segments.push(Segment::Text(text.to_string()));
        }
    }

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b'?' => {
                    push_text(&mut segments, &sql[seg_start..idx]);
                    segments.push(Segment::Positional);
                    seg_start = idx + 1;
                }
                b':' => {
                    if let Some((end, name)) = scan_identifier(bytes, idx + 1) {
                        push_text(&mut segments, &sql[seg_start..idx]);
                        segments.push(Segment::Named(name.to_string()));
                        seg_start = end;
                        idx = end - 1;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
        }
        idx += 1;
    }

    push_text(&mut segments, &sql[seg_start..]);
    segments
}

/// Render the placeholder run for one top-level value, appending the atomic
/// values it contributes to `out`.
///
/// A sequence fans out into `?, ?, ...`; anything else binds one slot. An
/// empty sequence is rejected: it would render an empty group such as
/// `in ()`, which most dialects refuse.
fn holder_for(value: &ParamValue, out: &mut Vec<ParamValue>) -> Result<String, DaoError> {
    match value {
        ParamValue::Seq(items) => {
            if items.is_empty() {
                return Err(DaoError::TemplateError(
                    "empty sequence cannot expand into a placeholder run".to_string(),
                ));
            }
            out.extend(items.iter().cloned());
            Ok(vec!["?"; items.len()].join(", "))
        }
        other => {
            out.push(other.clone());
            Ok("?".to_string())
        }
    }
}

/// Rewrite `sql` so every placeholder is a single atomic bind slot and
/// return it with the matching flattened bind list.
///
/// `values` follows the shapes of [`ParamValue`]: a single `Named` set for
/// `:name` templates, a single `Seq` (or a plain slice) of positional
/// values for `?` templates, or a single atomic value for a one-placeholder
/// template. Surplus values are ignored; surplus placeholders, mixed
/// placeholder styles, and empty sequence fan-outs are template errors.
///
/// # Errors
///
/// Returns [`DaoError::TemplateError`] on malformed placeholder usage.
pub fn expand(sql: &str, values: &[ParamValue]) -> Result<(String, Vec<ParamValue>), DaoError> {
    let segments = scan_template(sql);
    let positional = segments
        .iter()
        .filter(|s| matches!(s, Segment::Positional))
        .count();
    let named = segments
        .iter()
        .filter(|s| matches!(s, Segment::Named(_)))
        .count();

    if positional > 0 && named > 0 {
        return Err(DaoError::TemplateError(
            "template mixes `?` and `:name` placeholders".to_string(),
        ));
    }

    if named > 0 {
        return expand_named(sql, &segments, values);
    }
    if positional == 0 {
        // No placeholders: the text passes through and supplied values are
        // simply unused.
        return Ok((sql.to_string(), Vec::new()));
    }
    expand_positional(sql, &segments, positional, values)
}

fn expand_named(
    sql: &str,
    segments: &[Segment],
    values: &[ParamValue],
) -> Result<(String, Vec<ParamValue>), DaoError> {
    static EMPTY: &[(String, ParamValue)] = &[];
    let pairs: &[(String, ParamValue)] = match values {
        [] => EMPTY,
        [ParamValue::Named(pairs)] => pairs,
        _ => {
            return Err(DaoError::TemplateError(
                "named template requires a single Named parameter set".to_string(),
            ));
        }
    };

    let mut out_sql = String::with_capacity(sql.len() + 16);
    let mut out_values = Vec::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out_sql.push_str(text),
            Segment::Named(name) => {
                // Each occurrence resolves independently; a missing name
                // binds a single null slot.
                let value = pairs
                    .iter()
                    .find(|(n, _)| n == name)
                    .map_or(&ParamValue::Null, |(_, v)| v);
                out_sql.push_str(&holder_for(value, &mut out_values)?);
            }
            Segment::Positional => unreachable!("mixed templates are rejected above"),
        }
    }
    Ok((out_sql, out_values))
}

fn expand_positional(
    sql: &str,
    segments: &[Segment],
    placeholders: usize,
    values: &[ParamValue],
) -> Result<(String, Vec<ParamValue>), DaoError> {
    let top: &[ParamValue] = match values {
        [ParamValue::Seq(items)] => items,
        [ParamValue::Named(_)] => {
            return Err(DaoError::TemplateError(
                "positional template given a named parameter set".to_string(),
            ));
        }
        other => other,
    };

    let mut out_sql = String::with_capacity(sql.len() + 16);
    let mut out_values = Vec::new();

    // One placeholder fed a multi-element list fans the whole list out in
    // place: `id in (?)` with [1, 2, 3] becomes `id in (?, ?, ?)`.
    if placeholders == 1 && top.len() > 1 {
        let whole = ParamValue::Seq(top.to_vec());
        for segment in segments {
            match segment {
                Segment::Text(text) => out_sql.push_str(text),
                Segment::Positional => out_sql.push_str(&holder_for(&whole, &mut out_values)?),
                Segment::Named(_) => unreachable!("mixed templates are rejected above"),
            }
        }
        return Ok((out_sql, out_values));
    }

    let mut remaining = top.iter();
    for segment in segments {
        match segment {
            Segment::Text(text) => out_sql.push_str(text),
            Segment::Positional => {
                let value = remaining.next().ok_or_else(|| {
                    DaoError::TemplateError(format!(
                        "template has {placeholders} placeholders but only {} values",
                        top.len()
                    ))
                })?;
                out_sql.push_str(&holder_for(value, &mut out_values)?);
            }
            Segment::Named(_) => unreachable!("mixed templates are rejected above"),
        }
    }
    Ok((out_sql, out_values))
}
