use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::SqlHelperError;
use crate::types::RowValues;

/// Coercion from a cursor cell into a field's declared type.
///
/// `from_row_value` returns `None` when the cell cannot represent the type;
/// [`coerce`] turns that into a `MappingError`.
pub trait FromRowValue: Sized {
    /// Type name reported in mapping errors.
    const EXPECTED: &'static str;

    fn from_row_value(value: &RowValues) -> Option<Self>;
}

/// Convert one cell for the field backed by `column`.
///
/// # Errors
///
/// Returns `SqlHelperError::MappingError` if the cell's runtime type cannot be
/// coerced to `T`.
pub fn coerce<T: FromRowValue>(column: &str, value: &RowValues) -> Result<T, SqlHelperError> {
    T::from_row_value(value).ok_or_else(|| SqlHelperError::MappingError {
        column: column.to_string(),
        expected: T::EXPECTED,
        found: value.type_name(),
    })
}

impl FromRowValue for RowValues {
    const EXPECTED: &'static str = "any value";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromRowValue for i16 {
    const EXPECTED: &'static str = "smallint";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        value.as_int().and_then(|v| i16::try_from(*v).ok())
    }
}

impl FromRowValue for i32 {
    const EXPECTED: &'static str = "int";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        value.as_int().and_then(|v| i32::try_from(*v).ok())
    }
}

impl FromRowValue for i64 {
    const EXPECTED: &'static str = "bigint";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        value.as_int().copied()
    }
}

impl FromRowValue for f64 {
    const EXPECTED: &'static str = "float";

    #[allow(clippy::cast_precision_loss)]
    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Float(f) => Some(*f),
            RowValues::Int(i) => Some(*i as f64),
            RowValues::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }
}

impl FromRowValue for Decimal {
    const EXPECTED: &'static str = "decimal";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Decimal(d) => Some(*d),
            RowValues::Int(i) => Some(Decimal::from(*i)),
            // money and smallmoney are decoded as floats; they carry four decimal places
            RowValues::Float(f) => Decimal::try_from(*f).ok().map(|d| d.round_dp(4)),
            _ => None,
        }
    }
}

impl FromRowValue for String {
    const EXPECTED: &'static str = "text";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl FromRowValue for bool {
    const EXPECTED: &'static str = "bit";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Bool(b) => Some(*b),
            RowValues::Int(0) => Some(false),
            RowValues::Int(1) => Some(true),
            _ => None,
        }
    }
}

impl FromRowValue for NaiveDateTime {
    const EXPECTED: &'static str = "timestamp";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        if let RowValues::Timestamp(ts) = value {
            Some(*ts)
        } else {
            None
        }
    }
}

impl FromRowValue for Vec<u8> {
    const EXPECTED: &'static str = "binary";

    fn from_row_value(value: &RowValues) -> Option<Self> {
        if let RowValues::Blob(bytes) = value {
            Some(bytes.clone())
        } else {
            None
        }
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_row_value(value: &RowValues) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_row_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrows_integers_with_range_check() {
        assert_eq!(coerce::<i32>("ProductID", &RowValues::Int(839)).unwrap(), 839);
        let err = coerce::<i32>("ProductID", &RowValues::Int(i64::MAX)).unwrap_err();
        assert!(matches!(err, SqlHelperError::MappingError { expected: "int", .. }));
    }

    #[test]
    fn money_floats_become_decimals() {
        let cost: Decimal = coerce("StandardCost", &RowValues::Float(1_059.31)).unwrap();
        assert_eq!(cost, Decimal::new(105_931, 2));
    }

    #[test]
    fn text_is_not_silently_parsed() {
        let err = coerce::<i32>("ProductID", &RowValues::Text("839".into())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mapping error: column `ProductID` holds text, expected int"
        );
    }

    #[test]
    fn optional_fields_accept_null() {
        let color: Option<String> = coerce("Color", &RowValues::Null).unwrap();
        assert_eq!(color, None);
        let color: Option<String> = coerce("Color", &RowValues::Text("Black".into())).unwrap();
        assert_eq!(color.as_deref(), Some("Black"));
    }

    #[test]
    fn bits_accept_zero_and_one() {
        assert!(coerce::<bool>("MakeFlag", &RowValues::Int(1)).unwrap());
        assert!(coerce::<bool>("MakeFlag", &RowValues::Int(2)).is_err());
    }
}
