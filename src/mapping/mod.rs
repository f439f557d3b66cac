//! Name-based mapping of result rows onto entity types.
//!
//! There is no runtime reflection: an entity lists its fields once, as
//! [`FieldBinding`]s, usually through [`sql_entity!`](crate::sql_entity).

mod macros;
mod reader;
mod value;

pub use reader::{SqlReader, read};
pub use value::{FromRowValue, coerce};

use crate::error::SqlHelperError;
use crate::types::RowValues;

/// One field of an entity: its column name, an accessor and a coercing setter.
pub struct FieldBinding<T> {
    pub name: &'static str,
    pub get: fn(&T) -> RowValues,
    pub set: fn(&mut T, &RowValues) -> Result<(), SqlHelperError>,
}

impl<T> Clone for FieldBinding<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldBinding<T> {}

impl<T> std::fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding").field("name", &self.name).finish()
    }
}

/// A data shape the row mapper can populate.
pub trait SqlEntity: Default + Send {
    fn fields() -> Vec<FieldBinding<Self>>;
}
