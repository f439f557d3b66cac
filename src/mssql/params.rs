use std::borrow::Cow;

use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::{ColumnData, Query, ToSql};

use crate::types::RowValues;

/// ToSql for RowValues, used for bulk-load cells
impl ToSql for RowValues {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            RowValues::Int(i) => ColumnData::I64(Some(*i)),
            RowValues::Float(f) => ColumnData::F64(Some(*f)),
            RowValues::Decimal(d) => d.to_sql(),
            RowValues::Text(s) => ColumnData::String(Some(Cow::from(s.as_str()))),
            RowValues::Bool(b) => ColumnData::Bit(Some(*b)),
            RowValues::Timestamp(dt) => dt.to_sql(),
            RowValues::Blob(bytes) => ColumnData::Binary(Some(Cow::from(bytes.as_slice()))),
            RowValues::Null => ColumnData::String(None),
        }
    }
}

/// `Decimal` has no owned `IntoSql`; the driver binds its own `Numeric` instead.
pub(crate) fn decimal_to_numeric(decimal: Decimal) -> Numeric {
    // scale is at most 28, so it always fits a u8
    let scale = u8::try_from(decimal.scale()).unwrap_or(u8::MAX);
    Numeric::new_with_scale(decimal.mantissa(), scale)
}

/// Bind positional parameters to rendered SQL.
/// Return a query builder with parameters already bound as `@P1..@Pn`
pub fn bind_query_params<'a>(query: &'a str, params: &[RowValues]) -> Query<'a> {
    let mut query_builder = Query::new(query);

    // tiberius owns the bound data, so values are cloned in
    for param in params {
        match param {
            RowValues::Int(i) => query_builder.bind(*i),
            RowValues::Float(f) => query_builder.bind(*f),
            RowValues::Decimal(d) => query_builder.bind(decimal_to_numeric(*d)),
            RowValues::Text(s) => query_builder.bind(s.clone()),
            RowValues::Bool(b) => query_builder.bind(*b),
            RowValues::Timestamp(dt) => query_builder.bind(*dt),
            RowValues::Blob(bytes) => query_builder.bind(bytes.clone()),
            RowValues::Null => query_builder.bind(Option::<String>::None),
        }
    }

    query_builder
}
