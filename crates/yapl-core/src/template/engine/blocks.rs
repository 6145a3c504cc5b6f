//! Block matching utilities (finding closing tags for nesting constructs)
//!
//! All matchers scan a token slice forward from an opener and track the
//! nesting depth of same-kind openers. A closer at depth zero is the match.

use std::ops::Range;

use super::tokenize::{Token, TokenKind};

/// Paired directives without branch alternatives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pair {
    /// `for` / `endfor`
    Loop,
    /// `block` / `endblock`
    Block,
}

impl Pair {
    fn opens(self, kind: &TokenKind) -> bool {
        match self {
            Pair::Loop => matches!(kind, TokenKind::For { .. }),
            Pair::Block => matches!(kind, TokenKind::Block { .. }),
        }
    }

    fn closes(self, kind: &TokenKind) -> bool {
        match self {
            Pair::Loop => matches!(kind, TokenKind::EndFor),
            Pair::Block => matches!(kind, TokenKind::EndBlock),
        }
    }
}

/// Find the index of the token closing `tokens[open]`
///
/// # Nesting
///
/// Respects nested constructs of the same type.
pub(crate) fn find_block_end(tokens: &[Token], open: usize, pair: Pair) -> Option<usize> {
    let mut depth = 0;

    for (offset, token) in tokens.get(open + 1..)?.iter().enumerate() {
        if pair.opens(&token.kind) {
            // Found nested start tag, increase depth
            depth += 1;
        } else if pair.closes(&token.kind) {
            if depth == 0 {
                return Some(open + 1 + offset);
            }
            depth -= 1;
        }
    }

    // No matching closing tag found
    None
}

/// One `if` / `elseif` / `else` branch
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Clause {
    /// `None` for the final `else`
    pub condition: Option<String>,
    /// Byte range of the branch body
    pub body: Range<usize>,
}

/// A matched `if ... endif` construct
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Conditional {
    pub clauses: Vec<Clause>,
    /// Index of the `endif` token
    pub end: usize,
}

/// Match the conditional opened by `tokens[open]` and split its clauses
///
/// Only depth-zero `elseif` / `else` tags start a new clause. Once the
/// `else` clause has started, further `elseif` / `else` tags at depth zero
/// are plain text of the else body.
pub(crate) fn match_conditional(tokens: &[Token], open: usize) -> Option<Conditional> {
    let opener = tokens.get(open)?;
    let TokenKind::If { condition } = &opener.kind else {
        return None;
    };

    let mut clauses = Vec::new();
    let mut condition = Some(condition.clone());
    let mut body_start = opener.end();
    let mut seen_else = false;
    let mut depth = 0;

    for (offset, token) in tokens[open + 1..].iter().enumerate() {
        match &token.kind {
            TokenKind::If { .. } => depth += 1,
            TokenKind::EndIf if depth > 0 => depth -= 1,
            TokenKind::EndIf => {
                clauses.push(Clause {
                    condition,
                    body: body_start..token.start,
                });
                return Some(Conditional {
                    clauses,
                    end: open + 1 + offset,
                });
            }
            TokenKind::ElseIf { condition: next } if depth == 0 && !seen_else => {
                clauses.push(Clause {
                    condition: condition.take(),
                    body: body_start..token.start,
                });
                condition = Some(next.clone());
                body_start = token.end();
            }
            TokenKind::Else if depth == 0 && !seen_else => {
                clauses.push(Clause {
                    condition: condition.take(),
                    body: body_start..token.start,
                });
                seen_else = true;
                body_start = token.end();
            }
            _ => {}
        }
    }

    None
}

/// A matched `block ... endblock`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockSpan {
    pub name: String,
    /// Byte range from the opener through the closer
    pub span: Range<usize>,
    /// Byte range of the body
    pub body: Range<usize>,
}

/// Collect top-level blocks in source order
///
/// Nested blocks belong to the body of their enclosing block. An opener
/// without a closer is skipped.
pub(crate) fn block_spans(tokens: &[Token]) -> Vec<BlockSpan> {
    collect_block_spans(tokens, false)
}

/// Collect every matched block, nested ones included, in opener order
pub(crate) fn all_block_spans(tokens: &[Token]) -> Vec<BlockSpan> {
    collect_block_spans(tokens, true)
}

fn collect_block_spans(tokens: &[Token], include_nested: bool) -> Vec<BlockSpan> {
    let mut spans = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        if let TokenKind::Block { name } = &tokens[idx].kind {
            if let Some(end) = find_block_end(tokens, idx, Pair::Block) {
                spans.push(BlockSpan {
                    name: name.clone(),
                    span: tokens[idx].start..tokens[end].end(),
                    body: tokens[idx].end()..tokens[end].start,
                });
                if !include_nested {
                    idx = end + 1;
                    continue;
                }
            }
        }
        idx += 1;
    }

    spans
}

/// Byte ranges of the top-level matched `for ... endfor` constructs
pub(crate) fn loop_regions(tokens: &[Token]) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        if matches!(tokens[idx].kind, TokenKind::For { .. }) {
            if let Some(end) = find_block_end(tokens, idx, Pair::Loop) {
                regions.push(tokens[idx].start..tokens[end].end());
                idx = end + 1;
                continue;
            }
        }
        idx += 1;
    }

    regions
}

/// Tokens that do not sit inside any of `regions`
///
/// Directives inside a loop body are expanded per iteration, so earlier
/// passes must not see them.
pub(crate) fn outside_regions(tokens: Vec<Token>, regions: &[Range<usize>]) -> Vec<Token> {
    if regions.is_empty() {
        return tokens;
    }
    tokens
        .into_iter()
        .filter(|token| !regions.iter().any(|region| region.contains(&token.start)))
        .collect()
}
