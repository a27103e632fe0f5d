//! Statement splitting for migration scripts.
//!
//! A script is split on `;` delimiters that sit outside single-quoted
//! literals and comments. A delimiter written as `\;` is never a boundary and
//! is kept verbatim, since unescaping it is vendor business.
//!
//! ```
//! use dialect_migrate::script::split;
//!
//! let stmts = split("create schema s;\n\n  update s.t set v = replace(v, ';', '\\;');");
//! assert_eq!(stmts.len(), 2);
//! assert_eq!(stmts[1], "update s.t set v = replace(v, ';', '\\;')");
//! ```

use crate::dialect::lexer::{tokenize, TokenKind};

/// Scanner position relative to quoting and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Literal,
    LineComment,
    BlockComment,
}

/// Split a script into trimmed statements, in source order.
///
/// Empty and comment-only statements are dropped. Comments that precede a
/// statement stay attached to it.
pub fn split(script: &str) -> Vec<String> {
    let bytes = script.as_bytes();
    let mut statements = Vec::new();
    let mut scan = Scan::Code;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match scan {
            Scan::Code => match b {
                b'\'' => scan = Scan::Literal,
                b'-' if next == Some(b'-') => {
                    scan = Scan::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    scan = Scan::BlockComment;
                    i += 1;
                }
                b';' if !is_escaped(bytes, i) => {
                    push_statement(&mut statements, &script[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
            // a doubled quote closes and reopens, so it stays inside
            Scan::Literal => {
                if b == b'\'' {
                    scan = Scan::Code;
                }
            }
            Scan::LineComment => {
                if b == b'\n' {
                    scan = Scan::Code;
                }
            }
            Scan::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    scan = Scan::Code;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    push_statement(&mut statements, &script[start..]);
    statements
}

/// Whether the script ends with a statement delimiter (ignoring trailing
/// whitespace and comments).
pub fn ends_with_delimiter(script: &str) -> bool {
    let code = strip_comments(script);
    code.trim_end().ends_with(';')
}

/// Whether `text` contains anything besides whitespace and comments.
pub fn has_code(text: &str) -> bool {
    !strip_comments(text).trim().is_empty()
}

/// Remove `--` and `/* */` comments that sit outside literals.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut scan = Scan::Code;
    let mut copy_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match scan {
            Scan::Code => match b {
                b'\'' => scan = Scan::Literal,
                b'-' if next == Some(b'-') => {
                    out.push_str(&text[copy_from..i]);
                    scan = Scan::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    out.push_str(&text[copy_from..i]);
                    scan = Scan::BlockComment;
                    i += 1;
                }
                _ => {}
            },
            Scan::Literal => {
                if b == b'\'' {
                    scan = Scan::Code;
                }
            }
            Scan::LineComment => {
                if b == b'\n' {
                    scan = Scan::Code;
                    copy_from = i;
                }
            }
            Scan::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    scan = Scan::Code;
                    i += 1;
                    copy_from = i + 1;
                    out.push(' ');
                }
            }
        }
        i += 1;
    }

    if scan == Scan::Code || scan == Scan::Literal {
        out.push_str(&text[copy_from.min(text.len())..]);
    }
    out
}

fn is_escaped(bytes: &[u8], i: usize) -> bool {
    i > 0 && bytes[i - 1] == b'\\'
}

/// Join statements with `;` delimiters so that [`split`] gives them back.
///
/// A statement ending in a `--` comment gets its delimiter on the next line.
pub fn join<S: AsRef<str>>(statements: &[S], trailing_delimiter: bool) -> String {
    let mut out = String::new();
    for (i, statement) in statements.iter().enumerate() {
        let statement = statement.as_ref();
        out.push_str(statement);
        let last = i + 1 == statements.len();
        if last && !trailing_delimiter {
            break;
        }
        if ends_in_line_comment(statement) {
            out.push('\n');
        }
        out.push(';');
        if !last {
            out.push('\n');
        }
    }
    out
}

fn ends_in_line_comment(statement: &str) -> bool {
    tokenize(statement)
        .iter()
        .rev()
        .find(|t| t.kind != TokenKind::Whitespace)
        .map_or(false, |t| t.kind == TokenKind::Comment && t.text.starts_with("--"))
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if has_code(trimmed) {
        statements.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let stmts = split("create schema test;\ncreate table test.t (id number(19));\n");
        assert_eq!(
            stmts,
            vec!["create schema test", "create table test.t (id number(19))"]
        );
    }

    #[test]
    fn test_escaped_delimiter_inside_function_is_one_statement() {
        let script = r"update test2.spirit_property set value = concat('VALUE=', replace(replace(value, '\', '\\'), ';', '\;'));";
        let stmts = split(script);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].ends_with(r"';', '\;'))"));
    }

    #[test]
    fn test_escaped_delimiter_outside_literal_is_kept() {
        let stmts = split(r"select 1 \; select 2; select 3");
        assert_eq!(stmts, vec![r"select 1 \; select 2", "select 3"]);
    }

    #[test]
    fn test_delimiter_inside_literal_is_not_a_boundary() {
        let stmts = split("insert into t values ('a;b'); insert into t values ('it''s;')");
        assert_eq!(
            stmts,
            vec!["insert into t values ('a;b')", "insert into t values ('it''s;')"]
        );
    }

    #[test]
    fn test_empty_statements_dropped() {
        assert!(split("").is_empty());
        assert!(split(" ;;\n ; ").is_empty());
        assert_eq!(split("a;;b;").len(), 2);
    }

    #[test]
    fn test_internal_formatting_preserved() {
        let stmts = split("\n\n    create table t (\n      id number(19)\n    );\n");
        assert_eq!(stmts, vec!["create table t (\n      id number(19)\n    )"]);
    }

    #[test]
    fn test_comments_attach_to_next_statement() {
        let script = "-- first; not a boundary\ncreate schema a;\n/* it's ; */ create schema b;\n-- trailing";
        let stmts = split(script);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "-- first; not a boundary\ncreate schema a");
        assert_eq!(stmts[1], "/* it's ; */ create schema b");
    }

    #[test]
    fn test_ends_with_delimiter() {
        assert!(ends_with_delimiter("a;\n"));
        assert!(ends_with_delimiter("a; -- done"));
        assert!(!ends_with_delimiter("number(19)"));
    }

    #[test]
    fn test_join_keeps_boundaries_after_line_comments() {
        let stmts = split("create table a (id integer) -- first table\n;\ncreate table b (id integer);");
        assert_eq!(stmts.len(), 2);

        let joined = join(&stmts, true);
        assert_eq!(
            joined,
            "create table a (id integer) -- first table\n;\ncreate table b (id integer);"
        );
        assert_eq!(split(&joined), stmts);

        assert_eq!(join(&["a", "b -- done"], true), "a;\nb -- done\n;");
        assert_eq!(join(&["a", "b /* done */"], false), "a;\nb /* done */");
        assert_eq!(join::<&str>(&[], true), "");
    }

    #[test]
    fn test_strip_comments_keeps_literals() {
        assert_eq!(strip_comments("a -- x\nb"), "a \nb");
        assert_eq!(strip_comments("'--not' /* c */x"), "'--not'  x");
    }
}
