//! Dialect conversion.
//!
//! Scripts are written once in the canonical dialect (Oracle) and translated
//! to each target vendor by a [`Converter`]. Translation runs three passes
//! over every statement:
//!
//! 1. type declarations (`NUMBER(p,s)`, `VARCHAR2(n CHAR)`, `CLOB`, ...)
//! 2. DDL clause shapes (`ALTER TABLE ... ADD/MODIFY`, `CREATE SCHEMA`)
//! 3. functions and operators (`NVL`, `SYSDATE`, `||`)
//!
//! Every decision comes from a [`RuleTable`] keyed by construct and vendor.
//! Adding a vendor means registering its rules:
//!
//! ```rust
//! use dialect_migrate::dialect::{convert_script, Converter, RuleTable};
//! use dialect_migrate::Vendor;
//!
//! assert_eq!(convert_script("number(19)", Vendor::Hsql).unwrap(), "bigint");
//!
//! let converter = Converter::new(RuleTable::builtin());
//! let sql = converter
//!     .convert_script("alter table s.t modify (id varchar2(64 CHAR));", Vendor::Mysql)
//!     .unwrap();
//! assert_eq!(sql, "alter table s.t modify id varchar(64);");
//! ```

mod clauses;
mod converter;
mod functions;
pub mod lexer;
pub mod rules;
mod types;

pub use converter::{convert_script, convert_statement, Converter};
pub use rules::{ConstructKind, NumberMapping, NumericTypes, Rule, RuleTable};
