//! Tokenization for template engine
//!
//! Provides O(n) tokenization of `{{ }}`, `{% %}` and `{# #}` tags using a
//! state machine. The stream runs on text whose `-` trim markers were
//! already applied.

use crate::path::parse_quoted_list;
use crate::template::expr::is_simple_path;

/// Directive classification
///
/// Keywords match on the whole first word of the tag, so `elseif` is never
/// mistaken for `else`. A tag with a known keyword but malformed arguments is
/// `Other` and stays literal text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// {{ path }} or {{ path | default("text") }}
    Placeholder {
        path: String,
        default: Option<String>,
    },

    /// {{ super() }}
    Super,

    /// {% if condition %}
    If { condition: String },

    /// {% elseif condition %}
    ElseIf { condition: String },

    /// {% else %}
    Else,

    /// {% endif %}
    EndIf,

    /// {% for var in source %}
    For { var: String, source: String },

    /// {% endfor %}
    EndFor,

    /// {% block name %}
    Block { name: String },

    /// {% endblock %} or {% endblock name %}
    EndBlock,

    /// {% include "ref" %} or {% include "ref" with {...} %}
    Include {
        reference: String,
        with: Option<String>,
    },

    /// {% extends "ref" %}
    Extends { reference: String },

    /// {% mixin "a", "b" %}
    Mixin { references: Vec<String> },

    /// {# ... #}
    Comment,

    /// Anything else between delimiters (left untouched)
    Other,
}

/// A single tag with position and classification
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    /// Token classification
    pub kind: TokenKind,
    /// Absolute byte position of the opening delimiter
    pub start: usize,
    /// Total length in bytes including both delimiters
    pub length: usize,
    /// Line number where token starts
    pub line: usize,
}

impl Token {
    /// Byte position just past the closing delimiter
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Delimiter pair of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
    /// `{{ }}`
    Variable,
    /// `{% %}`
    Tag,
    /// `{# #}`
    Comment,
}

impl Delimiter {
    fn from_second_byte(byte: u8) -> Option<Self> {
        match byte {
            b'{' => Some(Delimiter::Variable),
            b'%' => Some(Delimiter::Tag),
            b'#' => Some(Delimiter::Comment),
            _ => None,
        }
    }

    /// First byte of the closing delimiter (the second is always `}`)
    fn close_byte(self) -> u8 {
        match self {
            Delimiter::Variable => b'}',
            Delimiter::Tag => b'%',
            Delimiter::Comment => b'#',
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Tokenization state machine (explicit for testability)
///
/// # State Transitions
///
/// ```text
/// Normal ──{──> SeenLBrace ──{ % #──> InToken ──close──> SeenClose ──}──> [Yield Token] → Normal
///   │               │                    │                   │
///   │ (not {)       │ (other)            │ (other)           │ (other)
///   └──────────────>└───────────────────>└──────────────────>└─────────> InToken
///
/// Opener without closer at EOF → rewind to the second opener byte,
/// and treat later openers of that delimiter as text
/// ```
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScanState {
    /// Normal text scanning
    Normal,

    /// Seen `{`, checking for `{`, `%` or `#`
    SeenLBrace {
        /// Position of the `{` character
        pos: usize,
    },

    /// Inside a tag, scanning until its closing delimiter
    InToken {
        /// Byte position of the opening delimiter
        start: usize,
        /// Byte position where token content starts
        content_start: usize,
        /// Line of the opening delimiter
        start_line: usize,
        delimiter: Delimiter,
    },

    /// Seen the first byte of the closing delimiter, checking for `}`
    SeenClose {
        /// Byte position of the opening delimiter
        start: usize,
        /// Byte position where token content starts
        content_start: usize,
        /// Line of the opening delimiter
        start_line: usize,
        /// Position of the first closing byte
        close_pos: usize,
        delimiter: Delimiter,
    },
}

/// Iterator over tokens in a template string
///
/// # Example
///
/// ```ignore
/// // Internal use only, not part of public API
/// let text = "Hello {{ name }}{% if a %}!{% endif %}";
/// for token in TokenStream::new(text) {
///     println!("Token at {}: {:?}", token.start, token.kind);
/// }
/// ```
///
/// # Performance
///
/// Each byte is visited a bounded number of times: at most once per
/// delimiter kind is a rewind needed, after which that kind can no longer
/// open a token.
pub(crate) struct TokenStream<'a> {
    /// Zero-copy byte slice of template text
    bytes: &'a [u8],
    /// Current byte position
    pos: usize,
    /// State machine state
    state: ScanState,
    /// Current line number
    line: usize,
    /// Step count for O(n) protection
    step_count: usize,
    /// Delimiters known to have no closer past the current position
    unclosed: [bool; 3],
}

impl<'a> TokenStream<'a> {
    /// Create a new TokenStream from template text
    pub fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            state: ScanState::Normal,
            line: 1,
            step_count: 0,
            unclosed: [false; 3],
        }
    }

    /// Classify token content into TokenKind
    fn classify_content(&self, delimiter: Delimiter, content: &str) -> TokenKind {
        let trimmed = content.trim();
        match delimiter {
            Delimiter::Comment => TokenKind::Comment,
            Delimiter::Variable => classify_variable(trimmed),
            Delimiter::Tag => classify_tag(trimmed),
        }
    }

    /// Process Normal state: scan for opening braces
    fn process_normal_state(&mut self, byte: u8) {
        if byte == b'{' {
            self.state = ScanState::SeenLBrace { pos: self.pos };
        } else if byte == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
    }

    /// Process SeenLBrace state: check for the second opening byte
    ///
    /// Returns true if position was advanced, false if byte should be reprocessed
    fn process_seen_lbrace(&mut self, byte: u8, lbrace_pos: usize) -> bool {
        match Delimiter::from_second_byte(byte) {
            Some(delimiter) if !self.unclosed[delimiter.index()] => {
                self.state = ScanState::InToken {
                    start: lbrace_pos,
                    content_start: self.pos + 1,
                    start_line: self.line,
                    delimiter,
                };
                self.pos += 1;
                true
            }
            _ => {
                // Just a single {, not a token
                self.state = ScanState::Normal;
                false
            }
        }
    }

    /// Process InToken state: scan for the closing delimiter
    fn process_in_token(&mut self, byte: u8) {
        if let ScanState::InToken {
            start,
            content_start,
            start_line,
            delimiter,
        } = self.state
        {
            if byte == delimiter.close_byte() {
                self.state = ScanState::SeenClose {
                    start,
                    content_start,
                    start_line,
                    close_pos: self.pos,
                    delimiter,
                };
            } else if byte == b'\n' {
                self.line += 1;
            }
        }
        self.pos += 1;
    }

    /// Process SeenClose state: check for `}` to complete the token
    ///
    /// Returns (Option<Token>, should_reprocess)
    fn process_seen_close(&mut self, byte: u8) -> (Option<Token>, bool) {
        let ScanState::SeenClose {
            start,
            content_start,
            start_line,
            close_pos,
            delimiter,
        } = self.state
        else {
            return (None, false);
        };

        if byte == b'}' {
            let content = std::str::from_utf8(&self.bytes[content_start..close_pos]).unwrap_or("");
            let token = Token {
                kind: self.classify_content(delimiter, content),
                start,
                length: self.pos + 1 - start,
                line: start_line,
            };
            self.state = ScanState::Normal;
            self.pos += 1;
            (Some(token), false)
        } else {
            // Just a lone closing byte inside content
            self.state = ScanState::InToken {
                start,
                content_start,
                start_line,
                delimiter,
            };
            (None, true)
        }
    }

    /// Handle EOF inside a tag: rewind past its opener
    ///
    /// Returns false when there is nothing left to scan.
    fn recover_unclosed(&mut self) -> bool {
        match self.state {
            ScanState::InToken {
                start,
                start_line,
                delimiter,
                ..
            }
            | ScanState::SeenClose {
                start,
                start_line,
                delimiter,
                ..
            } => {
                self.unclosed[delimiter.index()] = true;
                // `{{%` may still open a tag at the second byte
                self.pos = start + 1;
                self.line = start_line;
                self.state = ScanState::Normal;
                true
            }
            ScanState::Normal | ScanState::SeenLBrace { .. } => false,
        }
    }

    /// Record step for O(n) performance verification in tests
    #[cfg(test)]
    #[inline]
    fn record_test_step() {
        test_counter::inc();
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        const MAX_STEPS_MULTIPLIER: usize = 8;
        let max_steps = self
            .bytes
            .len()
            .saturating_mul(MAX_STEPS_MULTIPLIER)
            .saturating_add(8);

        loop {
            self.step_count += 1;
            if self.step_count > max_steps {
                return None;
            }
            if self.pos >= self.bytes.len() {
                if self.recover_unclosed() {
                    continue;
                }
                return None;
            }

            let byte = self.bytes[self.pos];
            #[cfg(test)]
            Self::record_test_step();

            match self.state {
                ScanState::Normal => self.process_normal_state(byte),
                ScanState::SeenLBrace { pos } => {
                    if !self.process_seen_lbrace(byte, pos) {
                        continue;
                    }
                }
                ScanState::InToken { .. } => self.process_in_token(byte),
                ScanState::SeenClose { .. } => {
                    let (token, reprocess) = self.process_seen_close(byte);
                    if let Some(token) = token {
                        return Some(token);
                    }
                    if reprocess {
                        continue;
                    }
                }
            }
        }
    }
}

/// Tokenize a whole text
pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    TokenStream::new(text).collect()
}

fn classify_variable(content: &str) -> TokenKind {
    if is_super_call(content) {
        return TokenKind::Super;
    }

    let (path, filter) = match content.split_once('|') {
        Some((path, filter)) => (path.trim_end(), Some(filter.trim_start())),
        None => (content, None),
    };
    if !is_simple_path(path) {
        return TokenKind::Other;
    }

    let default = match filter {
        None => None,
        Some(filter) => match parse_default_filter(filter) {
            Some(text) => Some(text.to_string()),
            None => return TokenKind::Other,
        },
    };

    TokenKind::Placeholder {
        path: path.to_string(),
        default,
    }
}

/// `super()` with optional spaces inside the parentheses
fn is_super_call(content: &str) -> bool {
    content
        .strip_prefix("super(")
        .and_then(|rest| rest.strip_suffix(')'))
        .is_some_and(|inner| inner.trim().is_empty())
}

/// `default("text")` or `default('text')`
fn parse_default_filter(filter: &str) -> Option<&str> {
    let args = filter.strip_prefix("default(")?.strip_suffix(')')?;
    let quote = args.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let inner = args[1..].strip_suffix(quote)?;
    (!inner.contains(quote)).then_some(inner)
}

fn classify_tag(content: &str) -> TokenKind {
    let (keyword, rest) = match content.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (content, ""),
    };

    match keyword {
        "if" if is_condition(rest) => TokenKind::If {
            condition: rest.to_string(),
        },
        "elseif" if is_condition(rest) => TokenKind::ElseIf {
            condition: rest.to_string(),
        },
        "else" if rest.is_empty() => TokenKind::Else,
        "endif" if rest.is_empty() => TokenKind::EndIf,
        "for" => parse_for_header(rest).unwrap_or(TokenKind::Other),
        "endfor" if rest.is_empty() => TokenKind::EndFor,
        "block" if is_block_name(rest) => TokenKind::Block {
            name: rest.to_string(),
        },
        "endblock" if rest.is_empty() || is_block_name(rest) => TokenKind::EndBlock,
        "include" => parse_include_args(rest).unwrap_or(TokenKind::Other),
        "extends" => match parse_quoted(rest) {
            Some((reference, tail)) if tail.is_empty() => TokenKind::Extends {
                reference: reference.to_string(),
            },
            _ => TokenKind::Other,
        },
        "mixin" if is_quoted_list(rest) => TokenKind::Mixin {
            references: parse_quoted_list(rest),
        },
        _ => TokenKind::Other,
    }
}

fn is_condition(text: &str) -> bool {
    !text.is_empty() && !text.contains('%')
}

/// `[a-zA-Z0-9_:-]+`
fn is_block_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'-'))
}

/// `var in source`
fn parse_for_header(rest: &str) -> Option<TokenKind> {
    let (var, tail) = rest.split_once(char::is_whitespace)?;
    let valid_var = !var.is_empty() && var.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    let source = tail.trim_start().strip_prefix("in")?;
    if !valid_var || !source.starts_with(char::is_whitespace) {
        return None;
    }
    let source = source.trim();
    is_condition(source).then(|| TokenKind::For {
        var: var.to_string(),
        source: source.to_string(),
    })
}

/// `"ref"` or `"ref" with {...}`
fn parse_include_args(rest: &str) -> Option<TokenKind> {
    let (reference, tail) = parse_quoted(rest)?;
    let with = if tail.is_empty() {
        None
    } else {
        let object = tail.strip_prefix("with")?;
        if !object.starts_with(char::is_whitespace) {
            return None;
        }
        let object = object.trim();
        if !(object.starts_with('{') && object.ends_with('}')) {
            return None;
        }
        Some(object.to_string())
    };
    Some(TokenKind::Include {
        reference: reference.to_string(),
        with,
    })
}

/// Leading non-empty double-quoted string and the trimmed remainder
fn parse_quoted(text: &str) -> Option<(&str, &str)> {
    let after_quote = text.strip_prefix('"')?;
    let close = after_quote.find('"')?;
    if close == 0 {
        return None;
    }
    Some((&after_quote[..close], after_quote[close + 1..].trim()))
}

/// `"a"` or `"a", "b", ...`
fn is_quoted_list(text: &str) -> bool {
    let mut rest = text;
    loop {
        let Some((_, tail)) = parse_quoted(rest) else {
            return false;
        };
        if tail.is_empty() {
            return true;
        }
        match tail.strip_prefix(',') {
            Some(next) => rest = next.trim_start(),
            None => return false,
        }
    }
}
