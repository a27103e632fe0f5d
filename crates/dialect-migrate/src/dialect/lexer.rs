//! Lightweight SQL tokenizer.
//!
//! Just enough lexing to find type declarations and DDL clause shapes
//! without a full parser. Tokens borrow from the input and concatenate back
//! to it exactly, so untouched regions keep their original formatting.

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword, dotted names included (`spirit.biosample`).
    Word,
    /// Numeric literal.
    Number,
    /// Single-quoted string literal, quotes included.
    Literal,
    /// Double-quoted identifier, quotes included.
    QuotedIdent,
    Whitespace,
    /// `--` line comment (without its newline) or `/* */` block comment.
    Comment,
    LParen,
    RParen,
    Comma,
    /// Any other punctuation; `||` is kept as a single token.
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// Case-insensitive keyword/identifier match.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(word)
    }

    /// Whitespace or comment.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// Split `sql` into tokens covering every byte of the input.
pub fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        let kind = if b.is_ascii_whitespace() {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            TokenKind::Whitespace
        } else if b == b'-' && next == Some(b'-') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            TokenKind::Comment
        } else if b == b'/' && next == Some(b'*') {
            i += 2;
            while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            TokenKind::Comment
        } else if b == b'\'' {
            i = scan_quoted(bytes, i, b'\'');
            TokenKind::Literal
        } else if b == b'"' {
            i = scan_quoted(bytes, i, b'"');
            TokenKind::QuotedIdent
        } else if is_word_start(b) {
            while i < bytes.len() && is_word_part(bytes[i]) {
                i += 1;
            }
            TokenKind::Word
        } else if b.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            TokenKind::Number
        } else {
            match b {
                b'(' => {
                    i += 1;
                    TokenKind::LParen
                }
                b')' => {
                    i += 1;
                    TokenKind::RParen
                }
                b',' => {
                    i += 1;
                    TokenKind::Comma
                }
                b'|' if next == Some(b'|') => {
                    i += 2;
                    TokenKind::Symbol
                }
                _ => {
                    // one full character, multi-byte safe
                    let width = sql[i..].chars().next().map(char::len_utf8).unwrap_or(1);
                    i += width;
                    TokenKind::Symbol
                }
            }
        };

        tokens.push(Token {
            kind,
            text: &sql[start..i],
        });
    }

    tokens
}

/// Concatenate token texts.
pub fn render(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.text).collect()
}

/// Index of the `)` matching the `(` at `open`, if any.
pub fn matching_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split tokens on top-level commas.
pub fn split_top_level<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<&'t [Token<'a>]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

/// Index of the next non-trivia token at or after `from`.
pub fn next_significant(tokens: &[Token<'_>], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|&i| !tokens[i].is_trivia())
}

fn scan_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            // doubled quote is an escaped quote
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_word_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'#' | b'.') || b >= 0x80
}
