//! Vendor rule table.
//!
//! Every translation the converter performs is an entry in a [`RuleTable`]
//! keyed by ([`ConstructKind`], [`Vendor`]). The converter only recognizes
//! constructs; what happens to them is decided here, so the rule set can be
//! audited (and extended to a new vendor) without touching the converter,
//! the splitter or the executor.
//!
//! A recognized construct with no entry for the target is a translation
//! error, never a silent pass-through.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Vendor;
use crate::error::{MigrateError, Result};

/// Shape of SQL the converter knows how to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstructKind {
    /// `NUMBER`, `NUMBER(p)`, `NUMBER(p,s)`.
    NumberType,
    /// `VARCHAR2(n [CHAR|BYTE])`.
    Varchar2Type,
    /// `NVARCHAR2(n)`.
    Nvarchar2Type,
    /// `RAW(n)`.
    RawType,
    /// `CLOB` / `NCLOB`.
    ClobType,
    /// `BLOB`.
    BlobType,
    /// `LONG` (legacy character data).
    LongType,
    /// `LONG RAW` (legacy binary data).
    LongRawType,
    /// `BINARY_FLOAT`.
    BinaryFloatType,
    /// `BINARY_DOUBLE`.
    BinaryDoubleType,
    /// `ROWID` / `UROWID`.
    RowidType,
    /// `XMLTYPE`.
    XmlType,
    /// `ALTER TABLE t ADD (col type, ...)` or `ADD col type`.
    AddColumns,
    /// `ALTER TABLE t MODIFY (col type, ...)` or `MODIFY col type`.
    ModifyColumns,
    /// `ALTER TABLE t ADD CONSTRAINT ...`.
    AddConstraint,
    /// `CREATE SCHEMA name`.
    CreateSchema,
    /// `NVL(a, b)`.
    NvlFunction,
    /// `SYSDATE` pseudo-column.
    Sysdate,
    /// The `||` string concatenation operator.
    ConcatOperator,
}

impl ConstructKind {
    /// Map a type keyword to its construct, if it is one the table covers.
    pub fn from_type_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "number" => Some(ConstructKind::NumberType),
            "varchar2" => Some(ConstructKind::Varchar2Type),
            "nvarchar2" => Some(ConstructKind::Nvarchar2Type),
            "raw" => Some(ConstructKind::RawType),
            "clob" | "nclob" => Some(ConstructKind::ClobType),
            "blob" => Some(ConstructKind::BlobType),
            "long" => Some(ConstructKind::LongType),
            "binary_float" => Some(ConstructKind::BinaryFloatType),
            "binary_double" => Some(ConstructKind::BinaryDoubleType),
            "rowid" | "urowid" => Some(ConstructKind::RowidType),
            "xmltype" => Some(ConstructKind::XmlType),
            _ => None,
        }
    }

    /// Whether the type may appear without an argument list.
    pub fn allows_bare_type(&self) -> bool {
        !matches!(
            self,
            ConstructKind::Varchar2Type | ConstructKind::Nvarchar2Type | ConstructKind::RawType
        )
    }

    /// Whether a parenthesized argument list belongs to the type. Only these
    /// are recognized outside column definitions.
    pub fn takes_arguments(&self) -> bool {
        matches!(
            self,
            ConstructKind::NumberType
                | ConstructKind::Varchar2Type
                | ConstructKind::Nvarchar2Type
                | ConstructKind::RawType
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConstructKind::NumberType => "NUMBER type",
            ConstructKind::Varchar2Type => "VARCHAR2 type",
            ConstructKind::Nvarchar2Type => "NVARCHAR2 type",
            ConstructKind::RawType => "RAW type",
            ConstructKind::ClobType => "CLOB type",
            ConstructKind::BlobType => "BLOB type",
            ConstructKind::LongType => "LONG type",
            ConstructKind::LongRawType => "LONG RAW type",
            ConstructKind::BinaryFloatType => "BINARY_FLOAT type",
            ConstructKind::BinaryDoubleType => "BINARY_DOUBLE type",
            ConstructKind::RowidType => "ROWID type",
            ConstructKind::XmlType => "XMLTYPE type",
            ConstructKind::AddColumns => "ALTER TABLE ... ADD",
            ConstructKind::ModifyColumns => "ALTER TABLE ... MODIFY",
            ConstructKind::AddConstraint => "ALTER TABLE ... ADD CONSTRAINT",
            ConstructKind::CreateSchema => "CREATE SCHEMA",
            ConstructKind::NvlFunction => "NVL function",
            ConstructKind::Sysdate => "SYSDATE",
            ConstructKind::ConcatOperator => "|| operator",
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Target types a `NUMBER` declaration is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericTypes {
    /// For precision up to [`NumberMapping::integer_max_precision`].
    pub integer: &'static str,
    /// For precision up to [`NumberMapping::bigint_max_precision`].
    pub bigint: &'static str,
    /// Exact decimal, written with `(p)` or `(p,s)`.
    pub decimal: &'static str,
    /// Bare `NUMBER` (no precision).
    pub unbounded: &'static str,
}

/// A rewrite applied to one construct for one vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Leave the construct exactly as written.
    Keep,
    /// Map `NUMBER(p[,s])` by precision and scale.
    Numeric(NumericTypes),
    /// Rename the type, keep its length, drop any `CHAR`/`BYTE` qualifier.
    WithLength(&'static str),
    /// Replace the type with a fixed name, dropping any arguments.
    Fixed(&'static str),
    /// Rename a function or pseudo-column.
    Rename(&'static str),
    /// Drop the parentheses and repeat the clause keyword before each
    /// column. `None` reuses the keyword as written.
    PerColumn(Option<&'static str>),
    /// `ALTER COLUMN col TYPE type` for each column.
    AlterColumnType,
    /// One `ALTER TABLE` statement per column, using the given keyword.
    StatementPerColumn(&'static str),
    /// The vendor has no equivalent.
    Unsupported(&'static str),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Keep => write!(f, "keep"),
            Rule::Numeric(t) => write!(
                f,
                "integer -> {}, bigint -> {}, otherwise {}(p[,s]); bare -> {}",
                t.integer, t.bigint, t.decimal, t.unbounded
            ),
            Rule::WithLength(name) => write!(f, "{}(n)", name),
            Rule::Fixed(name) => write!(f, "{}", name),
            Rule::Rename(name) => write!(f, "rename to {}", name),
            Rule::PerColumn(Some(kw)) => write!(f, "unparenthesized, '{}' per column", kw),
            Rule::PerColumn(None) => write!(f, "unparenthesized, keyword per column"),
            Rule::AlterColumnType => write!(f, "ALTER COLUMN col TYPE type per column"),
            Rule::StatementPerColumn(kw) => write!(f, "one statement per column ('{}')", kw),
            Rule::Unsupported(reason) => write!(f, "unsupported: {}", reason),
        }
    }
}

/// Precision thresholds for mapping `NUMBER(p)` with no (or zero) scale.
///
/// Only the endpoints `NUMBER(19)` → 64-bit and `NUMBER(3)` → integer are
/// confirmed behaviour; the defaults in between are configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberMapping {
    /// Highest precision mapped to the vendor's integer type (default 9).
    #[serde(default = "default_integer_max_precision")]
    pub integer_max_precision: u32,

    /// Highest precision mapped to the vendor's 64-bit type (default 19).
    #[serde(default = "default_bigint_max_precision")]
    pub bigint_max_precision: u32,
}

/// Oracle's maximum `NUMBER` precision, also used for `NUMBER(*, s)`.
pub const MAX_NUMBER_PRECISION: u32 = 38;

fn default_integer_max_precision() -> u32 {
    9
}

fn default_bigint_max_precision() -> u32 {
    19
}

impl Default for NumberMapping {
    fn default() -> Self {
        Self {
            integer_max_precision: default_integer_max_precision(),
            bigint_max_precision: default_bigint_max_precision(),
        }
    }
}

/// Integer class selected for a `NUMBER` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericClass {
    Integer,
    BigInt,
    Decimal,
}

impl NumberMapping {
    /// Classify `NUMBER(precision, scale)`.
    pub fn classify(&self, precision: u32, scale: u32) -> NumericClass {
        if scale > 0 {
            NumericClass::Decimal
        } else if precision <= self.integer_max_precision {
            NumericClass::Integer
        } else if precision <= self.bigint_max_precision {
            NumericClass::BigInt
        } else {
            NumericClass::Decimal
        }
    }

    /// Check thresholds are ordered and within Oracle's precision range.
    pub fn validate(&self) -> Result<()> {
        if self.integer_max_precision == 0 {
            return Err(MigrateError::Config(
                "number_mapping.integer_max_precision must be at least 1".into(),
            ));
        }
        if self.integer_max_precision > self.bigint_max_precision {
            return Err(MigrateError::Config(format!(
                "number_mapping.integer_max_precision ({}) must not exceed bigint_max_precision ({})",
                self.integer_max_precision, self.bigint_max_precision
            )));
        }
        if self.bigint_max_precision > MAX_NUMBER_PRECISION {
            return Err(MigrateError::Config(format!(
                "number_mapping.bigint_max_precision must be at most {}",
                MAX_NUMBER_PRECISION
            )));
        }
        Ok(())
    }
}

/// Lookup table of rules keyed by (construct, vendor).
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<(ConstructKind, Vendor), Rule>,
    number_mapping: NumberMapping,
}

impl RuleTable {
    /// Create an empty table. Every construct is untranslatable until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules for every non-canonical vendor.
    pub fn builtin() -> Self {
        use ConstructKind::*;

        let mut table = Self::new();

        // ===== HSQLDB =====
        let hsql = Vendor::Hsql;
        table.register(
            NumberType,
            hsql,
            Rule::Numeric(NumericTypes {
                integer: "integer",
                bigint: "bigint",
                decimal: "numeric",
                unbounded: "double",
            }),
        );
        table.register(Varchar2Type, hsql, Rule::WithLength("varchar"));
        table.register(Nvarchar2Type, hsql, Rule::WithLength("varchar"));
        table.register(RawType, hsql, Rule::WithLength("varbinary"));
        table.register(ClobType, hsql, Rule::Fixed("clob"));
        table.register(BlobType, hsql, Rule::Fixed("blob"));
        table.register(LongType, hsql, Rule::Fixed("longvarchar"));
        table.register(LongRawType, hsql, Rule::Fixed("longvarbinary"));
        table.register(BinaryFloatType, hsql, Rule::Fixed("real"));
        table.register(BinaryDoubleType, hsql, Rule::Fixed("double"));
        table.register(
            RowidType,
            hsql,
            Rule::Unsupported("no row address type; store the value as varchar"),
        );
        table.register(XmlType, hsql, Rule::Unsupported("no XML type"));
        table.register(AddColumns, hsql, Rule::Keep);
        table.register(ModifyColumns, hsql, Rule::Keep);
        table.register(AddConstraint, hsql, Rule::Keep);
        table.register(CreateSchema, hsql, Rule::Keep);
        table.register(NvlFunction, hsql, Rule::Keep);
        table.register(Sysdate, hsql, Rule::Keep);
        table.register(ConcatOperator, hsql, Rule::Keep);

        // ===== MySQL / MariaDB =====
        let mysql = Vendor::Mysql;
        table.register(
            NumberType,
            mysql,
            Rule::Numeric(NumericTypes {
                integer: "integer",
                bigint: "bigint",
                decimal: "decimal",
                unbounded: "double",
            }),
        );
        table.register(Varchar2Type, mysql, Rule::WithLength("varchar"));
        table.register(Nvarchar2Type, mysql, Rule::WithLength("varchar"));
        table.register(RawType, mysql, Rule::WithLength("varbinary"));
        table.register(ClobType, mysql, Rule::Fixed("longtext"));
        table.register(BlobType, mysql, Rule::Fixed("longblob"));
        table.register(LongType, mysql, Rule::Fixed("longtext"));
        table.register(LongRawType, mysql, Rule::Fixed("longblob"));
        table.register(BinaryFloatType, mysql, Rule::Fixed("float"));
        table.register(BinaryDoubleType, mysql, Rule::Fixed("double"));
        table.register(
            RowidType,
            mysql,
            Rule::Unsupported("no row address type; store the value as varchar"),
        );
        table.register(XmlType, mysql, Rule::Unsupported("no XML type; use longtext"));
        table.register(AddColumns, mysql, Rule::Keep);
        table.register(ModifyColumns, mysql, Rule::PerColumn(None));
        table.register(AddConstraint, mysql, Rule::Keep);
        table.register(CreateSchema, mysql, Rule::Keep);
        table.register(NvlFunction, mysql, Rule::Rename("ifnull"));
        table.register(Sysdate, mysql, Rule::Fixed("sysdate()"));
        table.register(
            ConcatOperator,
            mysql,
            Rule::Unsupported("'||' is logical OR in MySQL; use concat()"),
        );

        // ===== PostgreSQL =====
        let pg = Vendor::Postgres;
        table.register(
            NumberType,
            pg,
            Rule::Numeric(NumericTypes {
                integer: "integer",
                bigint: "bigint",
                decimal: "numeric",
                unbounded: "numeric",
            }),
        );
        table.register(Varchar2Type, pg, Rule::WithLength("varchar"));
        table.register(Nvarchar2Type, pg, Rule::WithLength("varchar"));
        table.register(RawType, pg, Rule::Fixed("bytea"));
        table.register(ClobType, pg, Rule::Fixed("text"));
        table.register(BlobType, pg, Rule::Fixed("bytea"));
        table.register(LongType, pg, Rule::Fixed("text"));
        table.register(LongRawType, pg, Rule::Fixed("bytea"));
        table.register(BinaryFloatType, pg, Rule::Fixed("real"));
        table.register(BinaryDoubleType, pg, Rule::Fixed("double precision"));
        table.register(
            RowidType,
            pg,
            Rule::Unsupported("no row address type; store the value as varchar"),
        );
        table.register(XmlType, pg, Rule::Fixed("xml"));
        table.register(AddColumns, pg, Rule::PerColumn(Some("add column")));
        table.register(ModifyColumns, pg, Rule::AlterColumnType);
        table.register(AddConstraint, pg, Rule::Keep);
        table.register(CreateSchema, pg, Rule::Keep);
        table.register(NvlFunction, pg, Rule::Rename("coalesce"));
        table.register(Sysdate, pg, Rule::Fixed("current_timestamp"));
        table.register(ConcatOperator, pg, Rule::Keep);

        // ===== SQLite =====
        let sqlite = Vendor::Sqlite;
        table.register(
            NumberType,
            sqlite,
            Rule::Numeric(NumericTypes {
                integer: "integer",
                bigint: "integer",
                decimal: "numeric",
                unbounded: "numeric",
            }),
        );
        table.register(Varchar2Type, sqlite, Rule::WithLength("varchar"));
        table.register(Nvarchar2Type, sqlite, Rule::WithLength("varchar"));
        table.register(RawType, sqlite, Rule::Fixed("blob"));
        table.register(ClobType, sqlite, Rule::Fixed("text"));
        table.register(BlobType, sqlite, Rule::Fixed("blob"));
        table.register(LongType, sqlite, Rule::Fixed("text"));
        table.register(LongRawType, sqlite, Rule::Fixed("blob"));
        table.register(BinaryFloatType, sqlite, Rule::Fixed("real"));
        table.register(BinaryDoubleType, sqlite, Rule::Fixed("real"));
        table.register(
            RowidType,
            sqlite,
            Rule::Unsupported("no row address type; store the value as varchar"),
        );
        table.register(XmlType, sqlite, Rule::Unsupported("no XML type; use text"));
        table.register(AddColumns, sqlite, Rule::StatementPerColumn("add column"));
        table.register(
            ModifyColumns,
            sqlite,
            Rule::Unsupported("SQLite cannot change a column definition in place"),
        );
        table.register(
            AddConstraint,
            sqlite,
            Rule::Unsupported("SQLite cannot add constraints to an existing table"),
        );
        table.register(
            CreateSchema,
            sqlite,
            Rule::Unsupported("SQLite has no schemas; attach a database instead"),
        );
        table.register(NvlFunction, sqlite, Rule::Rename("ifnull"));
        table.register(Sysdate, sqlite, Rule::Fixed("current_timestamp"));
        table.register(ConcatOperator, sqlite, Rule::Keep);

        table
    }

    /// Replace the `NUMBER` precision thresholds.
    pub fn with_number_mapping(mut self, mapping: NumberMapping) -> Self {
        self.number_mapping = mapping;
        self
    }

    /// Register (or replace) the rule for a construct on a vendor.
    pub fn register(&mut self, kind: ConstructKind, vendor: Vendor, rule: Rule) {
        self.rules.insert((kind, vendor), rule);
    }

    pub fn lookup(&self, kind: ConstructKind, vendor: Vendor) -> Option<&Rule> {
        self.rules.get(&(kind, vendor))
    }

    /// Look up a rule, failing with a translation error that names the
    /// statement and the construct when the vendor has no usable rule.
    pub fn require(&self, kind: ConstructKind, vendor: Vendor, statement: &str) -> Result<Rule> {
        match self.lookup(kind, vendor) {
            Some(Rule::Unsupported(reason)) => Err(MigrateError::translation(
                statement,
                kind.label(),
                vendor.name(),
                *reason,
            )),
            Some(rule) => Ok(*rule),
            None => Err(MigrateError::translation(
                statement,
                kind.label(),
                vendor.name(),
                "no translation rule registered",
            )),
        }
    }

    pub fn number_mapping(&self) -> &NumberMapping {
        &self.number_mapping
    }

    /// All rules for a vendor, ordered by construct.
    pub fn rules_for(&self, vendor: Vendor) -> Vec<(ConstructKind, Rule)> {
        let mut rules: Vec<_> = self
            .rules
            .iter()
            .filter(|((_, v), _)| *v == vendor)
            .map(|((kind, _), rule)| (*kind, *rule))
            .collect();
        rules.sort_by_key(|(kind, _)| *kind);
        rules
    }
}
