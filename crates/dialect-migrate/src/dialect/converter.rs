//! Script and statement conversion from the canonical dialect.

use tracing::debug;

use crate::core::Vendor;
use crate::error::Result;
use crate::script;

use super::clauses::rewrite_clauses;
use super::functions::rewrite_functions;
use super::rules::RuleTable;
use super::types::rewrite_types;

/// Translates canonical (Oracle) SQL into a target vendor's dialect using a
/// [`RuleTable`].
#[derive(Debug, Clone)]
pub struct Converter {
    rules: RuleTable,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(RuleTable::builtin())
    }
}

impl Converter {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Convert a whole script.
    ///
    /// The canonical vendor gets the script back byte-for-byte. Otherwise
    /// every statement is converted and the results are joined with `;`
    /// (see [`script::join`]); a trailing delimiter is emitted only if the
    /// input had one.
    pub fn convert_script(&self, script: &str, target: Vendor) -> Result<String> {
        if target.is_canonical() {
            return Ok(script.to_string());
        }

        let statements = script::split(script);
        let mut converted = Vec::with_capacity(statements.len());
        for statement in &statements {
            converted.push(self.convert_statement(statement, target)?);
        }

        let out = script::join(&converted, script::ends_with_delimiter(script));

        debug!(
            "Converted {} statement(s) to {}",
            statements.len(),
            target
        );
        Ok(out)
    }

    /// Convert a single statement (no trailing delimiter).
    ///
    /// Returns more than one statement, joined with `;\n`, when the target
    /// needs a clause split up.
    pub fn convert_statement(&self, statement: &str, target: Vendor) -> Result<String> {
        if target.is_canonical() {
            return Ok(statement.to_string());
        }

        let sql = rewrite_types(statement, target, &self.rules)?;
        let sql = rewrite_clauses(&sql, target, &self.rules)?;
        rewrite_functions(&sql, target, &self.rules)
    }
}

/// Convert `script` to `target` with the built-in rules.
pub fn convert_script(script: &str, target: Vendor) -> Result<String> {
    Converter::default().convert_script(script, target)
}

/// Convert one statement to `target` with the built-in rules.
pub fn convert_statement(statement: &str, target: Vendor) -> Result<String> {
    Converter::default().convert_statement(statement, target)
}
