//! DDL clause reshaping.
//!
//! Recognizes `CREATE SCHEMA`, `ALTER TABLE ... ADD CONSTRAINT` and the
//! column list forms of `ALTER TABLE ... ADD` / `MODIFY`, and renders them
//! according to the target's rule. Runs after type rewriting, so column
//! definitions already carry target types.

use crate::core::Vendor;
use crate::error::{MigrateError, Result};
use crate::script;

use super::lexer::{
    matching_paren, next_significant, render, split_top_level, tokenize, Token, TokenKind,
};
use super::rules::{ConstructKind, Rule, RuleTable};
use super::types::match_case;

/// Words that turn `ADD` into a table constraint rather than a column.
const CONSTRAINT_WORDS: &[&str] = &["constraint", "primary", "foreign", "unique", "check"];

/// Column attributes that `ALTER COLUMN ... TYPE` cannot carry.
const ATTRIBUTE_WORDS: &[&str] = &[
    "not",
    "null",
    "default",
    "constraint",
    "primary",
    "unique",
    "check",
    "references",
];

/// Reshape the DDL clause in `statement` for `target`, if it has one.
pub(crate) fn rewrite_clauses(statement: &str, target: Vendor, rules: &RuleTable) -> Result<String> {
    let tokens = tokenize(statement);
    let sig: Vec<usize> = (0..tokens.len()).filter(|&i| !tokens[i].is_trivia()).collect();
    let word_at = |n: usize, word: &str| sig.get(n).map_or(false, |&i| tokens[i].is_word(word));

    if word_at(0, "create") && word_at(1, "schema") {
        return keep_only(ConstructKind::CreateSchema, statement, target, rules);
    }

    if !(word_at(0, "alter") && word_at(1, "table")) {
        return Ok(statement.to_string());
    }

    // skip over the table name, which may be quoted and dotted (`s."T"`
    // lexes as the word `s.` followed by a quoted identifier)
    let mut n = 3;
    while n < sig.len() && (tokens[sig[n]].text == "." || tokens[sig[n - 1]].text.ends_with('.')) {
        n += 1;
    }
    let Some(&keyword_at) = sig.get(n) else {
        return Ok(statement.to_string());
    };

    let kind = if tokens[keyword_at].is_word("add") {
        let parenthesized = sig.get(n + 1).map_or(false, |&i| tokens[i].kind == TokenKind::LParen);
        let first_item = if parenthesized { n + 2 } else { n + 1 };
        if CONSTRAINT_WORDS.iter().any(|w| word_at(first_item, w)) {
            let kept = keep_only(ConstructKind::AddConstraint, statement, target, rules)?;
            if !parenthesized {
                return Ok(kept);
            }
            // `ADD (CONSTRAINT ...)` is Oracle-only; one ADD per constraint
            let clause = ColumnClause::parse(&tokens, keyword_at).ok_or_else(|| {
                MigrateError::translation(
                    statement,
                    ConstructKind::AddConstraint.label(),
                    target.name(),
                    "missing constraint definition",
                )
            })?;
            return Ok(clause.statement_each(clause.keyword));
        }
        ConstructKind::AddColumns
    } else if tokens[keyword_at].is_word("modify") {
        ConstructKind::ModifyColumns
    } else {
        return Ok(statement.to_string());
    };

    let rule = rules.require(kind, target, statement)?;
    if rule == Rule::Keep {
        return Ok(statement.to_string());
    }

    let clause = ColumnClause::parse(&tokens, keyword_at).ok_or_else(|| {
        MigrateError::translation(statement, kind.label(), target.name(), "missing column definition")
    })?;
    clause.render(rule, kind, statement, target)
}

/// Constructs that can only be kept or refused.
fn keep_only(
    kind: ConstructKind,
    statement: &str,
    target: Vendor,
    rules: &RuleTable,
) -> Result<String> {
    match rules.require(kind, target, statement)? {
        Rule::Keep => Ok(statement.to_string()),
        other => Err(MigrateError::translation(
            statement,
            kind.label(),
            target.name(),
            format!("rule '{}' does not apply", other),
        )),
    }
}

/// `<head> ADD|MODIFY (<columns>) <tail>`.
#[derive(Debug)]
struct ColumnClause<'a> {
    /// Everything before the keyword, trailing whitespace trimmed.
    head: String,
    /// The keyword as written.
    keyword: &'a str,
    columns: Vec<String>,
    tail: String,
}

impl<'a> ColumnClause<'a> {
    fn parse(tokens: &[Token<'a>], keyword_at: usize) -> Option<Self> {
        let head = render(&tokens[..keyword_at]).trim_end().to_string();
        let keyword = tokens[keyword_at].text;

        let mut first = next_significant(tokens, keyword_at + 1)?;
        // tolerate a redundant COLUMN keyword
        if tokens[first].is_word("column") {
            first = next_significant(tokens, first + 1)?;
        }

        let (columns, tail) = if tokens[first].kind == TokenKind::LParen {
            let close = matching_paren(tokens, first)?;
            let columns = split_top_level(&tokens[first + 1..close])
                .into_iter()
                .map(|part| render(part).trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            (columns, render(&tokens[close + 1..]).trim().to_string())
        } else {
            (vec![render(&tokens[first..]).trim().to_string()], String::new())
        };

        if columns.is_empty() {
            return None;
        }

        Some(Self {
            head,
            keyword,
            columns,
            tail,
        })
    }

    fn render(&self, rule: Rule, kind: ConstructKind, statement: &str, target: Vendor) -> Result<String> {
        let rendered = match rule {
            Rule::Keep => statement.to_string(),
            Rule::PerColumn(keyword) => {
                let keyword = keyword
                    .map(|k| match_case(self.keyword, k))
                    .unwrap_or_else(|| self.keyword.to_string());
                let list: Vec<String> = self
                    .columns
                    .iter()
                    .map(|c| format!("{} {}", keyword, c))
                    .collect();
                self.with_tail(format!("{} {}", self.head, list.join(", ")))
            }
            Rule::AlterColumnType => {
                let alter = match_case(self.keyword, "alter column");
                let type_kw = match_case(self.keyword, "type");
                let mut list = Vec::with_capacity(self.columns.len());
                for column in &self.columns {
                    let (name, definition) = split_column(column).ok_or_else(|| {
                        MigrateError::translation(
                            statement,
                            kind.label(),
                            target.name(),
                            format!("column '{}' has no type", column),
                        )
                    })?;
                    if let Some(attr) = column_attribute(&definition) {
                        return Err(MigrateError::translation(
                            statement,
                            kind.label(),
                            target.name(),
                            format!(
                                "cannot change '{}' together with the column type of '{}'",
                                attr, name
                            ),
                        ));
                    }
                    list.push(format!("{} {} {} {}", alter, name, type_kw, definition));
                }
                self.with_tail(format!("{} {}", self.head, list.join(", ")))
            }
            Rule::StatementPerColumn(keyword) => {
                self.statement_each(&match_case(self.keyword, keyword))
            }
            other => {
                return Err(MigrateError::translation(
                    statement,
                    kind.label(),
                    target.name(),
                    format!("rule '{}' does not apply to a column clause", other),
                ));
            }
        };
        Ok(rendered)
    }

    /// One `<head> <keyword> <item> <tail>` statement per list item.
    fn statement_each(&self, keyword: &str) -> String {
        let statements: Vec<String> = self
            .columns
            .iter()
            .map(|c| self.with_tail(format!("{} {} {}", self.head, keyword, c)))
            .collect();
        script::join(&statements, false)
    }

    fn with_tail(&self, mut sql: String) -> String {
        if !self.tail.is_empty() {
            sql.push(' ');
            sql.push_str(&self.tail);
        }
        sql
    }
}

/// Split `name definition...` at the first significant token.
fn split_column(column: &str) -> Option<(String, String)> {
    let tokens = tokenize(column);
    let name_at = next_significant(&tokens, 0)?;
    let rest = render(&tokens[name_at + 1..]).trim().to_string();
    if rest.is_empty() {
        return None;
    }
    Some((tokens[name_at].text.to_string(), rest))
}

fn column_attribute(definition: &str) -> Option<String> {
    tokenize(definition)
        .into_iter()
        .find(|t| ATTRIBUTE_WORDS.iter().any(|w| t.is_word(w)))
        .map(|t| t.text.to_string())
}
