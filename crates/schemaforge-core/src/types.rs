use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::IndexType;

/// Database vendor a schema is designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DbVendor {
    Mysql,
    Mariadb,
    Postgresql,
    Mssql,
}

const MYSQL_TYPES: &[&str] = &[
    "TINYINT", "SMALLINT", "MEDIUMINT", "INT", "INTEGER", "BIGINT", "DECIMAL", "NUMERIC",
    "FLOAT", "DOUBLE", "BIT", "BOOLEAN", "DATE", "DATETIME", "TIMESTAMP", "TIME", "YEAR",
    "CHAR", "VARCHAR", "BINARY", "VARBINARY", "TINYTEXT", "TEXT", "MEDIUMTEXT", "LONGTEXT",
    "TINYBLOB", "BLOB", "MEDIUMBLOB", "LONGBLOB", "ENUM", "SET", "JSON",
];
const MYSQL_INTEGERS: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "INT", "INTEGER", "BIGINT"];

const POSTGRES_TYPES: &[&str] = &[
    "SMALLINT", "INTEGER", "INT", "BIGINT", "SMALLSERIAL", "SERIAL", "BIGSERIAL", "DECIMAL",
    "NUMERIC", "REAL", "DOUBLE PRECISION", "MONEY", "BOOLEAN", "DATE", "TIME", "TIMETZ",
    "TIMESTAMP", "TIMESTAMPTZ", "INTERVAL", "CHAR", "VARCHAR", "TEXT", "BYTEA", "UUID", "JSON",
    "JSONB", "INET", "CIDR", "XML",
];
const POSTGRES_INTEGERS: &[&str] = &[
    "SMALLINT", "INTEGER", "INT", "BIGINT", "SMALLSERIAL", "SERIAL", "BIGSERIAL",
];

const MSSQL_TYPES: &[&str] = &[
    "TINYINT", "SMALLINT", "INT", "BIGINT", "DECIMAL", "NUMERIC", "MONEY", "SMALLMONEY",
    "FLOAT", "REAL", "BIT", "DATE", "TIME", "DATETIME", "DATETIME2", "DATETIMEOFFSET",
    "SMALLDATETIME", "CHAR", "VARCHAR", "NCHAR", "NVARCHAR", "TEXT", "NTEXT", "BINARY",
    "VARBINARY", "IMAGE", "UNIQUEIDENTIFIER", "XML",
];
const MSSQL_INTEGERS: &[&str] = &["TINYINT", "SMALLINT", "INT", "BIGINT"];

impl DbVendor {
    /// Data types accepted for columns of this vendor (upper case).
    pub fn data_types(self) -> &'static [&'static str] {
        match self {
            DbVendor::Mysql | DbVendor::Mariadb => MYSQL_TYPES,
            DbVendor::Postgresql => POSTGRES_TYPES,
            DbVendor::Mssql => MSSQL_TYPES,
        }
    }

    /// Integer types eligible for auto-increment.
    pub fn integer_types(self) -> &'static [&'static str] {
        match self {
            DbVendor::Mysql | DbVendor::Mariadb => MYSQL_INTEGERS,
            DbVendor::Postgresql => POSTGRES_INTEGERS,
            DbVendor::Mssql => MSSQL_INTEGERS,
        }
    }

    pub fn supports_data_type(self, data_type: &str) -> bool {
        let normalized = data_type.trim().to_ascii_uppercase();
        self.data_types().contains(&normalized.as_str())
    }

    pub fn is_integer_type(self, data_type: &str) -> bool {
        let normalized = data_type.trim().to_ascii_uppercase();
        self.integer_types().contains(&normalized.as_str())
    }

    pub fn supports_index_type(self, index_type: IndexType) -> bool {
        match self {
            DbVendor::Mysql | DbVendor::Mariadb => true,
            DbVendor::Postgresql => !matches!(index_type, IndexType::Fulltext | IndexType::Spatial),
            DbVendor::Mssql => matches!(index_type, IndexType::Btree | IndexType::Spatial),
        }
    }
}

impl fmt::Display for DbVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DbVendor::Mysql => "MYSQL",
            DbVendor::Mariadb => "MARIADB",
            DbVendor::Postgresql => "POSTGRESQL",
            DbVendor::Mssql => "MSSQL",
        };
        f.write_str(name)
    }
}

/// How a data type consumes its length/precision descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeParams {
    /// `VARCHAR(n)`, `CHAR(n)`: a length is mandatory.
    Length,
    /// `DECIMAL(p,s)`, `NUMERIC(p,s)`: precision and scale are mandatory.
    PrecisionScale,
    /// Optional length, e.g. `BINARY`, `BIT`, `FLOAT`.
    OptionalLength,
    None,
}

/// Classify a data type by the descriptor it needs.
pub fn type_params(data_type: &str) -> TypeParams {
    match data_type.trim().to_ascii_uppercase().as_str() {
        "VARCHAR" | "CHAR" => TypeParams::Length,
        "DECIMAL" | "NUMERIC" => TypeParams::PrecisionScale,
        "NCHAR" | "NVARCHAR" | "BINARY" | "VARBINARY" | "BIT" | "FLOAT" | "DATETIME2" | "TIME"
        | "TIMESTAMP" => TypeParams::OptionalLength,
        _ => TypeParams::None,
    }
}

/// Vendor-dependent length or precision descriptor of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LengthScale {
    Length(u32),
    PrecisionScale { precision: u32, scale: u32 },
}

impl fmt::Display for LengthScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthScale::Length(length) => write!(f, "{length}"),
            LengthScale::PrecisionScale { precision, scale } => write!(f, "{precision},{scale}"),
        }
    }
}

/// Words that cannot be used as column names regardless of vendor.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK",
    "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DATABASE", "DEFAULT", "DELETE", "DESC",
    "DISTINCT", "DROP", "ELSE", "END", "EXISTS", "FOREIGN", "FROM", "FULL", "GRANT", "GROUP",
    "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE",
    "LIMIT", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES", "REVOKE",
    "RIGHT", "SCHEMA", "SELECT", "SET", "TABLE", "THEN", "TO", "UNION", "UNIQUE", "UPDATE",
    "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
];

pub fn is_reserved_keyword(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    RESERVED_KEYWORDS.contains(&upper.as_str())
}
