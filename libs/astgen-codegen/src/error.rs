use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed variant '{entry}': {reason}")]
    MalformedVariant {
        entry: String,
        reason: MalformedReason,
    },

    #[error(
        "no mapping for type '{declared_type}' of field '{field}' in variant '{family}::{variant}'"
    )]
    UnresolvedType {
        family: String,
        variant: String,
        field: String,
        declared_type: String,
    },

    #[error("failed to load schema {origin}: {message}")]
    SchemaLoad { origin: String, message: String },

    #[error("family '{0}' is not declared in the schema")]
    UnknownFamily(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a schema entry was rejected by the grammar parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("missing ':' between variant name and field list")]
    MissingSeparator,

    #[error("variant name is empty")]
    EmptyVariantName,

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("field fragment '{0}' must be exactly '<type> <name>'")]
    FieldShape(String),

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("variant '{0}' is declared more than once in its family")]
    DuplicateVariant(String),

    #[error("constructor '{constructor}' would be generated for both '{first}' and '{second}'")]
    ConstructorClash {
        constructor: String,
        first: String,
        second: String,
    },
}

impl Error {
    pub(crate) fn malformed(entry: &str, reason: MalformedReason) -> Self {
        Error::MalformedVariant {
            entry: entry.to_string(),
            reason,
        }
    }

    pub(crate) fn schema_load(origin: impl Into<String>, message: impl ToString) -> Self {
        Error::SchemaLoad {
            origin: origin.into(),
            message: message.to_string(),
        }
    }
}
