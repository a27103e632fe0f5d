//! Type declaration rewriting.
//!
//! Finds canonical type declarations (`NUMBER(p,s)`, `VARCHAR2(n CHAR)`,
//! `CLOB`, ...) outside literals and comments and replaces each with the
//! target type chosen by the rule table.
//!
//! Parenthesized types (`NUMBER`, `VARCHAR2`, `NVARCHAR2`, `RAW`) are
//! recognized anywhere. Bare type words (`NUMBER`, `CLOB`, `LONG`, `ROWID`,
//! ...) are only treated as types in the column-definition position of DDL,
//! since they are also plausible column names. Oracle-only types the target
//! cannot represent fail translation there instead of passing through.

use crate::core::Vendor;
use crate::error::{MigrateError, Result};

use super::lexer::{
    matching_paren, next_significant, render, split_top_level, tokenize, Token, TokenKind,
};
use super::rules::{ConstructKind, NumberMapping, NumericClass, Rule, RuleTable, MAX_NUMBER_PRECISION};

/// Rewrite every recognized type declaration in `statement` for `target`.
pub(crate) fn rewrite_types(statement: &str, target: Vendor, rules: &RuleTable) -> Result<String> {
    let tokens = tokenize(statement);
    let is_ddl = next_significant(&tokens, 0)
        .map(|i| tokens[i].is_word("create") || tokens[i].is_word("alter"))
        .unwrap_or(false);

    let mut out = String::with_capacity(statement.len());
    let mut prev: Option<Token<'_>> = None;
    let mut prev2: Option<Token<'_>> = None;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];

        if let Some(kind) = type_construct(&token) {
            let open = next_significant(&tokens, i + 1)
                .filter(|&j| kind.takes_arguments() && tokens[j].kind == TokenKind::LParen);

            if let Some(open) = open {
                let close = matching_paren(&tokens, open).ok_or_else(|| {
                    MigrateError::translation(
                        statement,
                        kind.label(),
                        target.name(),
                        "unbalanced parentheses in type declaration",
                    )
                })?;
                let args: Vec<String> = split_top_level(&tokens[open + 1..close])
                    .into_iter()
                    .map(|part| render(part).trim().to_string())
                    .collect();
                let decl = TypeDecl {
                    kind,
                    word: token.text,
                    original: render(&tokens[i..=close]),
                    args: Some(args),
                };
                out.push_str(&decl.translate(target, rules, statement)?);

                prev2 = prev;
                prev = Some(tokens[close]);
                i = close + 1;
                continue;
            }

            if kind.allows_bare_type() && is_ddl && in_column_position(prev, prev2) {
                // LONG RAW is two words
                let (kind, end) = match next_significant(&tokens, i + 1) {
                    Some(j) if kind == ConstructKind::LongType && tokens[j].is_word("raw") => {
                        (ConstructKind::LongRawType, j)
                    }
                    _ => (kind, i),
                };
                let decl = TypeDecl {
                    kind,
                    word: token.text,
                    original: render(&tokens[i..=end]),
                    args: None,
                };
                out.push_str(&decl.translate(target, rules, statement)?);

                prev2 = prev;
                prev = Some(tokens[end]);
                i = end + 1;
                continue;
            }
        }

        out.push_str(token.text);
        if !token.is_trivia() {
            prev2 = prev;
            prev = Some(token);
        }
        i += 1;
    }

    Ok(out)
}

/// Apply the letter case of `source` (all-uppercase or not) to `replacement`.
pub(crate) fn match_case(source: &str, replacement: &str) -> String {
    let has_upper = source.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = source.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && !has_lower {
        replacement.to_uppercase()
    } else {
        replacement.to_string()
    }
}

fn type_construct(token: &Token<'_>) -> Option<ConstructKind> {
    if token.kind != TokenKind::Word {
        return None;
    }
    ConstructKind::from_type_word(token.text)
}

/// `name <type>` right after `(`, `,`, `ADD`, `MODIFY` or `COLUMN`.
fn in_column_position(prev: Option<Token<'_>>, prev2: Option<Token<'_>>) -> bool {
    let Some(name) = prev else {
        return false;
    };
    if !matches!(name.kind, TokenKind::Word | TokenKind::QuotedIdent) {
        return false;
    }
    match prev2 {
        Some(t) => {
            matches!(t.kind, TokenKind::LParen | TokenKind::Comma)
                || t.is_word("add")
                || t.is_word("modify")
                || t.is_word("column")
        }
        None => false,
    }
}

/// One type declaration found in a statement.
struct TypeDecl<'a> {
    kind: ConstructKind,
    /// Type keyword as written (drives output case).
    word: &'a str,
    /// Full declaration text including arguments.
    original: String,
    /// Trimmed arguments, `None` for a bare type.
    args: Option<Vec<String>>,
}

impl TypeDecl<'_> {
    fn translate(&self, target: Vendor, rules: &RuleTable, statement: &str) -> Result<String> {
        let rule = rules.require(self.kind, target, statement)?;
        let fail = |reason: String| {
            MigrateError::translation(statement, self.kind.label(), target.name(), reason)
        };

        let translated = match rule {
            Rule::Keep => return Ok(self.original.clone()),
            Rule::Numeric(types) => match &self.args {
                None => types.unbounded.to_string(),
                Some(args) => {
                    let (precision, scale) = parse_precision(args).map_err(fail)?;
                    numeric_type(rules.number_mapping(), types.integer, types.bigint, types.decimal, precision, scale)
                }
            },
            Rule::WithLength(name) => {
                let length = parse_length(self.args.as_deref()).map_err(fail)?;
                format!("{}({})", name, length)
            }
            Rule::Fixed(name) => name.to_string(),
            other => {
                return Err(fail(format!("rule '{}' does not apply to a type", other)));
            }
        };

        Ok(match_case(self.word, &translated))
    }
}

fn numeric_type(
    mapping: &NumberMapping,
    integer: &str,
    bigint: &str,
    decimal: &str,
    precision: u32,
    scale: u32,
) -> String {
    match mapping.classify(precision, scale) {
        NumericClass::Integer => integer.to_string(),
        NumericClass::BigInt => bigint.to_string(),
        NumericClass::Decimal if scale > 0 => format!("{}({},{})", decimal, precision, scale),
        NumericClass::Decimal => format!("{}({})", decimal, precision),
    }
}

/// Parse `p` or `p,s` (`*` means maximum precision).
fn parse_precision(args: &[String]) -> std::result::Result<(u32, u32), String> {
    let (p, s) = match args {
        [p] => (p.as_str(), None),
        [p, s] => (p.as_str(), Some(s.as_str())),
        _ => return Err(format!("expected NUMBER(p) or NUMBER(p,s), got {} arguments", args.len())),
    };

    let precision = if p == "*" {
        MAX_NUMBER_PRECISION
    } else {
        p.parse::<u32>()
            .map_err(|_| format!("invalid precision '{}'", p))?
    };
    if precision == 0 || precision > MAX_NUMBER_PRECISION {
        return Err(format!(
            "precision {} is outside 1..={}",
            precision, MAX_NUMBER_PRECISION
        ));
    }

    let scale = match s {
        None => 0,
        Some(s) => s.parse::<u32>().map_err(|_| format!("invalid scale '{}'", s))?,
    };
    if scale > precision {
        return Err(format!("scale {} exceeds precision {}", scale, precision));
    }

    Ok((precision, scale))
}

/// Parse `n`, `n CHAR` or `n BYTE`.
fn parse_length(args: Option<&[String]>) -> std::result::Result<u32, String> {
    let arg = match args {
        Some([arg]) => arg,
        Some(args) => return Err(format!("expected a single length, got {} arguments", args.len())),
        None => return Err("missing length".to_string()),
    };

    let mut parts = arg.split_whitespace();
    let length = parts
        .next()
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| format!("invalid length '{}'", arg))?;

    match parts.next() {
        None => {}
        Some(q) if q.eq_ignore_ascii_case("char") || q.eq_ignore_ascii_case("byte") => {}
        Some(q) => return Err(format!("unknown length qualifier '{}'", q)),
    }
    if parts.next().is_some() {
        return Err(format!("invalid length '{}'", arg));
    }

    Ok(length)
}
