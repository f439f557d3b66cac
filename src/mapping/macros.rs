/// Declare how an entity's fields line up with result-set columns.
///
/// Each entry pairs a column name (matched exactly, case-sensitive) with a
/// field. The macro implements [`SqlEntity`](crate::mapping::SqlEntity) for
/// reading and [`ParamBag`](crate::command::ParamBag) so the same entity can be
/// bound as a parameter bag. Field types must implement
/// [`FromRowValue`](crate::mapping::FromRowValue) and
/// [`IntoRowValue`](crate::command::IntoRowValue).
///
/// ```rust
/// use adventure_data::sql_entity;
///
/// #[derive(Debug, Default)]
/// struct Location {
///     location_id: i32,
///     name: String,
///     cost_rate: Option<rust_decimal::Decimal>,
/// }
///
/// sql_entity!(Location {
///     "LocationID" => location_id,
///     "Name" => name,
///     "CostRate" => cost_rate,
/// });
/// ```
#[macro_export]
macro_rules! sql_entity {
    ($entity:ty { $($column:literal => $field:ident),+ $(,)? }) => {
        impl $crate::mapping::SqlEntity for $entity {
            fn fields() -> ::std::vec::Vec<$crate::mapping::FieldBinding<Self>> {
                ::std::vec![
                    $(
                        $crate::mapping::FieldBinding {
                            name: $column,
                            get: |entity: &Self| {
                                $crate::command::IntoRowValue::into_row_value(
                                    ::std::clone::Clone::clone(&entity.$field),
                                )
                            },
                            set: |entity: &mut Self, value: &$crate::types::RowValues| {
                                entity.$field = $crate::mapping::coerce($column, value)?;
                                ::std::result::Result::Ok(())
                            },
                        },
                    )+
                ]
            }
        }

        impl $crate::command::ParamBag for $entity {
            fn to_parameters(&self) -> ::std::vec::Vec<$crate::command::SqlParameter> {
                <Self as $crate::mapping::SqlEntity>::fields()
                    .iter()
                    .map(|field| $crate::command::SqlParameter::new(field.name, (field.get)(self)))
                    .collect()
            }
        }
    };
}
