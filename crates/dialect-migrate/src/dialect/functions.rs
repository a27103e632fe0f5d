//! Function, pseudo-column and operator rewriting (`NVL`, `SYSDATE`, `||`).

use crate::core::Vendor;
use crate::error::{MigrateError, Result};

use super::lexer::{next_significant, tokenize, TokenKind};
use super::rules::{ConstructKind, Rule, RuleTable};
use super::types::match_case;

pub(crate) fn rewrite_functions(statement: &str, target: Vendor, rules: &RuleTable) -> Result<String> {
    let tokens = tokenize(statement);
    let mut out = String::with_capacity(statement.len());

    for (i, token) in tokens.iter().enumerate() {
        let followed_by_paren = || {
            next_significant(&tokens, i + 1)
                .map(|j| tokens[j].kind == TokenKind::LParen)
                .unwrap_or(false)
        };

        let kind = match token.kind {
            TokenKind::Word if token.is_word("nvl") && followed_by_paren() => {
                Some(ConstructKind::NvlFunction)
            }
            TokenKind::Word if token.is_word("sysdate") && !followed_by_paren() => {
                Some(ConstructKind::Sysdate)
            }
            TokenKind::Symbol if token.text == "||" => Some(ConstructKind::ConcatOperator),
            _ => None,
        };

        let Some(kind) = kind else {
            out.push_str(token.text);
            continue;
        };

        match rules.require(kind, target, statement)? {
            Rule::Keep => out.push_str(token.text),
            Rule::Rename(name) | Rule::Fixed(name) => out.push_str(&match_case(token.text, name)),
            other => {
                return Err(MigrateError::translation(
                    statement,
                    kind.label(),
                    target.name(),
                    format!("rule '{}' does not apply", other),
                ));
            }
        }
    }

    Ok(out)
}
