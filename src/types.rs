use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Values that can be bound as command parameters or read back from a cursor.
///
/// The same enum is used in both directions so helpers never touch driver types:
/// ```rust
/// use adventure_data::prelude::*;
///
/// let params = vec![
///     RowValues::Int(839),
///     RowValues::Text("HL Road Frame".into()),
///     RowValues::Null,
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit); SQL Server `money` arrives as this
    Float(f64),
    /// Exact numeric value (`decimal`/`numeric`)
    Decimal(Decimal),
    /// Text/string value
    Text(String),
    /// Boolean value (`bit`)
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// Binary data
    Blob(Vec<u8>),
    /// NULL value
    Null,
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        if let RowValues::Decimal(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Human-readable name of the variant, used in mapping errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "integer",
            RowValues::Float(_) => "float",
            RowValues::Decimal(_) => "decimal",
            RowValues::Text(_) => "text",
            RowValues::Bool(_) => "bit",
            RowValues::Timestamp(_) => "timestamp",
            RowValues::Blob(_) => "binary",
            RowValues::Null => "NULL",
        }
    }
}

/// How the server interprets the command text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandKind {
    /// The text names a stored procedure; parameters are passed by name.
    #[default]
    StoredProcedure,
    /// The text is a T-SQL batch; `@Name` placeholders are bound by name.
    Text,
}
