//! Whitespace control
//!
//! Pure text transforms run before any directive is expanded:
//!
//! 1. [`apply_tag_trimming`] honors the `-` markers of `{{- -}}`, `{%- -%}`
//!    and `{#- -#}` (always on)
//! 2. [`apply_global_whitespace`] applies `lstrip_blocks` / `trim_blocks` to
//!    control tags
//!
//! [`dedent`] is applied separately to block, branch and loop bodies.

use crate::config::WhitespaceOptions;

const OPENERS: [&str; 3] = ["{{-", "{%-", "{#-"];
const CLOSERS: [&str; 3] = ["-}}", "-%}", "-#}"];

/// Remove the `-` trim markers and the whitespace they consume
///
/// An opening marker eats the spaces and tabs before the tag on the same
/// line. A closing marker eats the spaces and tabs after the tag plus at most
/// one line break.
pub fn apply_tag_trimming(source: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(idx) = find_marker(rest) {
        output.push_str(&rest[..idx]);
        let marker = &rest[idx..idx + 3];

        if OPENERS.contains(&marker) {
            let kept = output.trim_end_matches([' ', '\t']).len();
            output.truncate(kept);
            output.push_str(&marker[..2]);
            rest = &rest[idx + 3..];
        } else {
            output.push_str(&marker[1..]);
            let after = rest[idx + 3..].trim_start_matches([' ', '\t']);
            let after = after.strip_prefix('\r').unwrap_or(after);
            rest = after.strip_prefix('\n').unwrap_or(after);
        }
    }

    output.push_str(rest);
    output
}

/// Position of the next trim marker (opening or closing)
fn find_marker(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    (0..bytes.len().saturating_sub(2)).find(|&i| {
        let window = &bytes[i..i + 3];
        OPENERS.iter().chain(CLOSERS.iter()).any(|m| m.as_bytes() == window)
    })
}

/// Apply the global control-tag transforms
///
/// - `lstrip_blocks`: indentation before a `{%` that starts a line is removed
/// - `trim_blocks`: the line break right after a `%}` is removed (spaces and
///   tabs between the tag and the break go with it)
pub fn apply_global_whitespace(source: &str, options: WhitespaceOptions) -> String {
    let mut text = source.to_string();
    if options.lstrip_blocks {
        text = lstrip_control_tags(&text);
    }
    if options.trim_blocks {
        text = trim_after_control_tags(&text);
    }
    text
}

fn lstrip_control_tags(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let stripped = line.trim_start_matches([' ', '\t']);
        if stripped.len() < line.len() && stripped.starts_with("{%") {
            output.push_str(stripped);
        } else {
            output.push_str(line);
        }
    }
    output
}

fn trim_after_control_tags(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find("%}") {
        output.push_str(&rest[..idx + 2]);
        let after = &rest[idx + 2..];
        let spaced = after.trim_start_matches([' ', '\t']);
        let line_end = spaced
            .strip_prefix("\r\n")
            .or_else(|| spaced.strip_prefix('\n'));
        rest = line_end.unwrap_or(after);
    }

    output.push_str(rest);
    output
}

/// Strip the common indentation of a body
///
/// One leading line break and the trailing blank run are dropped first, then
/// every line loses the smallest leading space/tab run found among the
/// non-blank lines. A body with no non-blank line is returned unchanged.
pub fn dedent(text: &str) -> String {
    let body = text.strip_prefix('\n').unwrap_or(text);
    let content_end = body.trim_end().len();
    let body = match body[content_end..].find('\n') {
        Some(offset) => &body[..content_end + offset],
        None => body,
    };

    let lines: Vec<&str> = body.split('\n').collect();
    let indents = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| matches!(c, ' ' | '\t')).count());
    let Some(min_indent) = indents.min() else {
        return text.to_string();
    };

    lines
        .iter()
        .map(|line| match line.char_indices().nth(min_indent) {
            Some((offset, _)) => &line[offset..],
            // Blank line shorter than the indent
            None => "",
        })
        .collect::<Vec<_>>()
        .join("\n")
}
