use futures_util::Stream;
use futures_util::stream;

use super::{FieldBinding, SqlEntity};
use crate::cursor::Cursor;
use crate::error::SqlHelperError;

/// Lazily maps the rows of a cursor onto entities of type `T`.
///
/// Fields are matched to columns once, by exact name, when the reader is
/// created. Each pulled row starts from `T::default()`; matched non-NULL cells
/// are assigned, everything else keeps its default. The reader is forward-only
/// and single-use: the cursor is released as soon as it is exhausted, or when
/// the reader is closed or dropped.
pub struct SqlReader<T: SqlEntity, C: Cursor> {
    cursor: Option<C>,
    bindings: Vec<(FieldBinding<T>, usize)>,
}

/// Start mapping `cursor` onto `T`. Shorthand for [`SqlReader::new`].
pub fn read<T: SqlEntity, C: Cursor>(cursor: C) -> SqlReader<T, C> {
    SqlReader::new(cursor)
}

impl<T: SqlEntity, C: Cursor> SqlReader<T, C> {
    pub fn new(cursor: C) -> Self {
        let columns = cursor.column_names();
        let bindings = T::fields()
            .into_iter()
            .filter_map(|field| {
                columns
                    .iter()
                    .position(|column| column == field.name)
                    .map(|ordinal| (field, ordinal))
            })
            .collect();
        Self {
            cursor: Some(cursor),
            bindings,
        }
    }

    /// Field names that found a column in this cursor.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.iter().map(|(field, _)| field.name)
    }

    /// Pull and map the next row.
    ///
    /// # Errors
    ///
    /// Returns the cursor's error if fetching fails, or
    /// `SqlHelperError::MappingError` if a cell cannot be coerced to its field.
    pub async fn next(&mut self) -> Result<Option<T>, SqlHelperError> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        let Some(row) = cursor.next_row().await? else {
            self.cursor = None;
            return Ok(None);
        };

        let mut entity = T::default();
        for (field, ordinal) in &self.bindings {
            match row.get(*ordinal) {
                Some(value) if !value.is_null() => (field.set)(&mut entity, value)?,
                _ => {}
            }
        }
        Ok(Some(entity))
    }

    /// Whether the underlying cursor is still held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// Stop reading and release the cursor without draining it.
    pub fn close(mut self) {
        if let Some(cursor) = self.cursor.take() {
            cursor.close();
        }
    }

    /// Read every remaining row.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or mapping error; no partial result is returned.
    pub async fn collect_all(mut self) -> Result<Vec<T>, SqlHelperError> {
        let mut entities = Vec::new();
        while let Some(entity) = self.next().await? {
            entities.push(entity);
        }
        Ok(entities)
    }

    /// The same sequence as a `Stream`.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, SqlHelperError>> {
        stream::try_unfold(self, |mut reader| async move {
            Ok(reader.next().await?.map(|entity| (entity, reader)))
        })
    }
}
