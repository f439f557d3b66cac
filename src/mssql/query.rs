use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tiberius::{ColumnData, FromSql, Row};

use crate::error::SqlHelperError;
use crate::types::RowValues;

/// Convert every cell of a driver row, in column order.
///
/// # Errors
///
/// Returns `SqlHelperError::ExecutionError` if a cell cannot be decoded.
pub fn row_to_values(row: Row) -> Result<Vec<RowValues>, SqlHelperError> {
    row.into_iter().map(column_to_value).collect()
}

/// Convert one driver cell into a `RowValues`. Every NULL becomes `RowValues::Null`.
///
/// # Errors
///
/// Returns `SqlHelperError::ExecutionError` if a date/time or numeric cell is out of range.
pub fn column_to_value(data: ColumnData<'static>) -> Result<RowValues, SqlHelperError> {
    let value = match data {
        ColumnData::U8(Some(v)) => RowValues::Int(i64::from(v)),
        ColumnData::I16(Some(v)) => RowValues::Int(i64::from(v)),
        ColumnData::I32(Some(v)) => RowValues::Int(i64::from(v)),
        ColumnData::I64(Some(v)) => RowValues::Int(v),
        ColumnData::F32(Some(v)) => RowValues::Float(f64::from(v)),
        ColumnData::F64(Some(v)) => RowValues::Float(v),
        ColumnData::Bit(Some(v)) => RowValues::Bool(v),
        ColumnData::String(Some(s)) => RowValues::Text(s.into_owned()),
        ColumnData::Guid(Some(g)) => RowValues::Text(g.to_string()),
        ColumnData::Binary(Some(b)) => RowValues::Blob(b.into_owned()),
        ColumnData::Xml(Some(x)) => RowValues::Text(x.into_owned().into_string()),
        ColumnData::Numeric(Some(n)) => {
            Decimal::try_from_i128_with_scale(n.value(), u32::from(n.scale()))
                .map(RowValues::Decimal)
                .map_err(|e| decode_error("numeric", e))?
        }
        ColumnData::DateTime(Some(_))
        | ColumnData::SmallDateTime(Some(_))
        | ColumnData::DateTime2(Some(_)) => NaiveDateTime::from_sql(&data)
            .map_err(|e| decode_error("datetime", e))?
            .map_or(RowValues::Null, RowValues::Timestamp),
        ColumnData::Date(Some(_)) => NaiveDate::from_sql(&data)
            .map_err(|e| decode_error("date", e))?
            .map_or(RowValues::Null, |d| {
                RowValues::Timestamp(d.and_time(NaiveTime::MIN))
            }),
        ColumnData::Time(Some(_)) => NaiveTime::from_sql(&data)
            .map_err(|e| decode_error("time", e))?
            .map_or(RowValues::Null, |t| RowValues::Text(t.to_string())),
        ColumnData::DateTimeOffset(Some(_)) => DateTime::<Utc>::from_sql(&data)
            .map_err(|e| decode_error("datetimeoffset", e))?
            .map_or(RowValues::Null, |dt| RowValues::Timestamp(dt.naive_utc())),
        _ => RowValues::Null,
    };
    Ok(value)
}

fn decode_error(type_name: &str, e: impl std::fmt::Display) -> SqlHelperError {
    SqlHelperError::ExecutionError(format!("cannot decode SQL Server {type_name} value: {e}"))
}
