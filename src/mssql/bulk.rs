use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tiberius::time::{Date, DateTime, SmallDateTime};
use tiberius::{ColumnData, ToSql, Uuid};

use super::params::decimal_to_numeric;
use crate::bulk::BulkColumn;
use crate::error::SqlHelperError;
use crate::types::RowValues;

/// Insertable columns of a table, in `SELECT *` order.
///
/// Identity, computed and rowversion columns are left out; the server fills them in.
pub(crate) const BULK_COLUMNS_SQL: &str = "SELECT c.name, t.name \
     FROM sys.columns AS c \
     JOIN sys.types AS t ON t.user_type_id = c.system_type_id \
     WHERE c.object_id = OBJECT_ID(@P1) \
       AND c.is_identity = 0 AND c.is_computed = 0 AND t.name <> 'timestamp' \
     ORDER BY c.column_id";

/// `num_days_from_ce` of 1900-01-01, the epoch of `datetime` and `smalldatetime`.
const DAYS_TO_1900: i32 = 693_596;

/// Days from 0001-01-01 to 9999-12-31, the last day a `date` column holds.
const MAX_DATE_DAYS: i32 = 3_652_058;

/// Fail before the bulk request opens if a destination column cannot be encoded.
///
/// # Errors
///
/// Returns `SqlHelperError::ParameterError` naming the first `money` or
/// `smallmoney` column; the driver has no bulk encoding for either.
pub(crate) fn check_bulk_columns(columns: &[BulkColumn]) -> Result<(), SqlHelperError> {
    match columns.iter().find(|c| is_money(&c.type_name)) {
        Some(column) => Err(money_unsupported(column)),
        None => Ok(()),
    }
}

/// Encode a cell with the width and kind its destination column declares.
///
/// The bulk-load protocol does not convert between types the way a regular
/// statement does, so integers are narrowed, floats/decimals swapped and
/// timestamps re-encoded for the date type the column uses.
///
/// # Errors
///
/// Returns `SqlHelperError::ParameterError` if the value does not fit the column.
pub(crate) fn bulk_value<'a>(
    value: &'a RowValues,
    column: &BulkColumn,
) -> Result<ColumnData<'a>, SqlHelperError> {
    let data = match (column.type_name.as_str(), value) {
        (money, _) if is_money(money) => return Err(money_unsupported(column)),
        ("tinyint", RowValues::Int(i)) => ColumnData::U8(Some(narrow(*i, column)?)),
        ("tinyint", RowValues::Null) => ColumnData::U8(None),
        ("smallint", RowValues::Int(i)) => ColumnData::I16(Some(narrow(*i, column)?)),
        ("smallint", RowValues::Null) => ColumnData::I16(None),
        ("int", RowValues::Int(i)) => ColumnData::I32(Some(narrow(*i, column)?)),
        ("int", RowValues::Null) => ColumnData::I32(None),
        ("bigint", RowValues::Null) => ColumnData::I64(None),
        ("bit", RowValues::Int(i)) => ColumnData::Bit(Some(*i != 0)),
        ("bit", RowValues::Null) => ColumnData::Bit(None),
        ("real", RowValues::Float(f)) => {
            #[allow(clippy::cast_possible_truncation)]
            let narrowed = *f as f32;
            ColumnData::F32(Some(narrowed))
        }
        ("real", RowValues::Null) => ColumnData::F32(None),
        ("float", RowValues::Int(i)) => {
            #[allow(clippy::cast_precision_loss)]
            let widened = *i as f64;
            ColumnData::F64(Some(widened))
        }
        ("float", RowValues::Decimal(d)) => ColumnData::F64(d.to_f64()),
        ("float", RowValues::Null) => ColumnData::F64(None),
        ("decimal" | "numeric", RowValues::Float(f)) => {
            let decimal = Decimal::try_from(*f).map_err(|e| {
                SqlHelperError::ParameterError(format!(
                    "value {f} does not fit column `{}`: {e}",
                    column.name
                ))
            })?;
            ColumnData::Numeric(Some(decimal_to_numeric(decimal)))
        }
        ("decimal" | "numeric", RowValues::Int(i)) => {
            ColumnData::Numeric(Some(decimal_to_numeric(Decimal::from(*i))))
        }
        ("decimal" | "numeric", RowValues::Decimal(d)) => {
            ColumnData::Numeric(Some(decimal_to_numeric(*d)))
        }
        ("decimal" | "numeric", RowValues::Null) => ColumnData::Numeric(None),
        ("datetime", RowValues::Timestamp(ts)) => {
            ColumnData::DateTime(Some(to_datetime(ts, column)?))
        }
        ("datetime", RowValues::Null) => ColumnData::DateTime(None),
        ("smalldatetime", RowValues::Timestamp(ts)) => {
            ColumnData::SmallDateTime(Some(to_small_datetime(ts, column)?))
        }
        ("smalldatetime", RowValues::Null) => ColumnData::SmallDateTime(None),
        ("date", RowValues::Timestamp(ts)) => ColumnData::Date(Some(to_date(ts, column)?)),
        ("date", RowValues::Null) => ColumnData::Date(None),
        ("datetime2", RowValues::Null) => ColumnData::DateTime2(None),
        ("uniqueidentifier", RowValues::Text(s)) => {
            let uuid = Uuid::parse_str(s).map_err(|e| {
                SqlHelperError::ParameterError(format!(
                    "value `{s}` is not a uniqueidentifier for column `{}`: {e}",
                    column.name
                ))
            })?;
            ColumnData::Guid(Some(uuid))
        }
        ("uniqueidentifier", RowValues::Null) => ColumnData::Guid(None),
        ("varbinary" | "binary" | "image", RowValues::Null) => ColumnData::Binary(None),
        _ => value.to_sql(),
    };
    Ok(data)
}

fn is_money(type_name: &str) -> bool {
    matches!(type_name, "money" | "smallmoney")
}

fn money_unsupported(column: &BulkColumn) -> SqlHelperError {
    SqlHelperError::ParameterError(format!(
        "bulk insert cannot encode {} column `{}`; map it as decimal or leave it unmapped",
        column.type_name, column.name
    ))
}

fn to_datetime(ts: &NaiveDateTime, column: &BulkColumn) -> Result<DateTime, SqlHelperError> {
    let days = ts.date().num_days_from_ce() - DAYS_TO_1900;
    let time = ts.time();
    // 1/300 s ticks, truncated like the driver's own conversion
    let fragments = time.num_seconds_from_midnight() * 300
        + u32::try_from(u64::from(time.nanosecond() % 1_000_000_000) * 300 / 1_000_000_000)
            .map_err(|_| out_of_range(ts, column))?;
    Ok(DateTime::new(days, fragments))
}

fn to_small_datetime(
    ts: &NaiveDateTime,
    column: &BulkColumn,
) -> Result<SmallDateTime, SqlHelperError> {
    let days = u16::try_from(ts.date().num_days_from_ce() - DAYS_TO_1900)
        .map_err(|_| out_of_range(ts, column))?;
    let minutes = u16::try_from(ts.time().num_seconds_from_midnight() / 60)
        .map_err(|_| out_of_range(ts, column))?;
    Ok(SmallDateTime::new(days, minutes))
}

fn to_date(ts: &NaiveDateTime, column: &BulkColumn) -> Result<Date, SqlHelperError> {
    let days = ts.date().num_days_from_ce() - 1;
    if !(0..=MAX_DATE_DAYS).contains(&days) {
        return Err(out_of_range(ts, column));
    }
    let days = u32::try_from(days).map_err(|_| out_of_range(ts, column))?;
    Ok(Date::new(days))
}

fn out_of_range(ts: &NaiveDateTime, column: &BulkColumn) -> SqlHelperError {
    SqlHelperError::ParameterError(format!(
        "value {ts} is out of range for {} column `{}`",
        column.type_name, column.name
    ))
}

fn narrow<T: TryFrom<i64>>(value: i64, column: &BulkColumn) -> Result<T, SqlHelperError> {
    T::try_from(value).map_err(|_| {
        SqlHelperError::ParameterError(format!(
            "value {value} is out of range for {} column `{}`",
            column.type_name, column.name
        ))
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, milli: u32) -> RowValues {
        RowValues::Timestamp(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_milli_opt(h, min, s, milli)
                .unwrap(),
        )
    }

    #[test]
    fn narrows_integers_to_the_column_width() {
        let col = BulkColumn::new("SafetyStockLevel", "smallint");
        assert!(matches!(
            bulk_value(&RowValues::Int(500), &col).unwrap(),
            ColumnData::I16(Some(500))
        ));
        assert!(bulk_value(&RowValues::Int(70_000), &col).is_err());
    }

    #[test]
    fn nulls_are_typed_by_column() {
        let cases = [
            ("int", "I32"),
            ("datetime", "DateTime"),
            ("smalldatetime", "SmallDateTime"),
            ("date", "Date"),
            ("datetime2", "DateTime2"),
            ("uniqueidentifier", "Guid"),
            ("decimal", "Numeric"),
        ];
        for (type_name, variant) in cases {
            let col = BulkColumn::new("Col", type_name);
            let encoded = format!("{:?}", bulk_value(&RowValues::Null, &col).unwrap());
            assert_eq!(encoded, format!("{variant}(None)"), "{type_name}");
        }
    }

    #[test]
    fn datetime_counts_days_from_1900_in_three_hundredths() {
        let col = BulkColumn::new("ModifiedDate", "datetime");
        match bulk_value(&at(1900, 1, 1, 0, 0, 1, 0), &col).unwrap() {
            ColumnData::DateTime(Some(dt)) => {
                assert_eq!(dt.days(), 0);
                assert_eq!(dt.seconds_fragments(), 300);
            }
            other => panic!("unexpected {other:?}"),
        }
        match bulk_value(&at(2008, 4, 30, 0, 0, 0, 500), &col).unwrap() {
            ColumnData::DateTime(Some(dt)) => {
                assert_eq!(dt.days(), 39_566);
                assert_eq!(dt.seconds_fragments(), 150);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn smalldatetime_keeps_whole_minutes() {
        let col = BulkColumn::new("SellStartDate", "smalldatetime");
        match bulk_value(&at(1900, 1, 2, 1, 30, 45, 0), &col).unwrap() {
            ColumnData::SmallDateTime(Some(dt)) => {
                assert_eq!(dt.days(), 1);
                assert_eq!(dt.seconds_fragments(), 90);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(bulk_value(&at(1899, 12, 31, 0, 0, 0, 0), &col).is_err());
    }

    #[test]
    fn date_counts_days_from_year_one() {
        let col = BulkColumn::new("DueDate", "date");
        match bulk_value(&at(1, 1, 2, 12, 0, 0, 0), &col).unwrap() {
            ColumnData::Date(Some(date)) => assert_eq!(date.days(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn uniqueidentifier_text_is_parsed() {
        let col = BulkColumn::new("rowguid", "uniqueidentifier");
        let text = RowValues::Text("694215b7-08f7-4c0d-acb1-d734ba44c0c8".into());
        assert!(matches!(
            bulk_value(&text, &col).unwrap(),
            ColumnData::Guid(Some(_))
        ));
        let err = bulk_value(&RowValues::Text("HL Road Frame".into()), &col).unwrap_err();
        assert!(err.to_string().contains("rowguid"), "{err}");
    }

    #[test]
    fn money_destinations_are_rejected_by_name() {
        let columns = vec![
            BulkColumn::new("ProductID", "int"),
            BulkColumn::new("StandardCost", "money"),
        ];
        let err = check_bulk_columns(&columns).unwrap_err();
        assert!(matches!(err, SqlHelperError::ParameterError(_)));
        assert!(err.to_string().contains("StandardCost"), "{err}");
        assert!(check_bulk_columns(&columns[..1]).is_ok());

        let err = bulk_value(&RowValues::Float(2.5), &BulkColumn::new("CostRate", "smallmoney"))
            .unwrap_err();
        assert!(err.to_string().contains("CostRate"), "{err}");
    }
}
