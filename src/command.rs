//! Commands, bind parameters and parameter bags.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::NaiveDateTime;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::SqlHelperError;
use crate::translation::bind_named_parameters;
use crate::types::{CommandKind, RowValues};

/// Every command runs with a ten minute limit; the procedures behind it are reporting queries.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

static PARAMETER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_@#$]*$").expect("parameter name pattern is valid")
});

// Up to four dot-separated parts, each a bare or a [bracketed] identifier.
static OBJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\[[^\]]+\]|[A-Za-z_#][A-Za-z0-9_@#$]*)(?:\.(?:\[[^\]]+\]|[A-Za-z_][A-Za-z0-9_@#$]*)){0,3}$",
    )
    .expect("object name pattern is valid")
});

/// Check a procedure or table name before it is spliced into SQL text.
///
/// # Errors
///
/// Returns `SqlHelperError::ParameterError` if `name` is not a plain (optionally
/// schema-qualified or bracketed) object name.
pub(crate) fn validate_object_name(name: &str) -> Result<(), SqlHelperError> {
    if OBJECT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(SqlHelperError::ParameterError(format!(
            "`{name}` is not a valid object name"
        )))
    }
}

/// Conversion of a Rust value into a bind value. `None` binds as SQL NULL.
pub trait IntoRowValue {
    fn into_row_value(self) -> RowValues;
}

impl IntoRowValue for RowValues {
    fn into_row_value(self) -> RowValues {
        self
    }
}

impl IntoRowValue for i16 {
    fn into_row_value(self) -> RowValues {
        RowValues::Int(i64::from(self))
    }
}

impl IntoRowValue for i32 {
    fn into_row_value(self) -> RowValues {
        RowValues::Int(i64::from(self))
    }
}

impl IntoRowValue for i64 {
    fn into_row_value(self) -> RowValues {
        RowValues::Int(self)
    }
}

impl IntoRowValue for f64 {
    fn into_row_value(self) -> RowValues {
        RowValues::Float(self)
    }
}

impl IntoRowValue for Decimal {
    fn into_row_value(self) -> RowValues {
        RowValues::Decimal(self)
    }
}

impl IntoRowValue for bool {
    fn into_row_value(self) -> RowValues {
        RowValues::Bool(self)
    }
}

impl IntoRowValue for String {
    fn into_row_value(self) -> RowValues {
        RowValues::Text(self)
    }
}

impl IntoRowValue for &str {
    fn into_row_value(self) -> RowValues {
        RowValues::Text(self.to_string())
    }
}

impl IntoRowValue for NaiveDateTime {
    fn into_row_value(self) -> RowValues {
        RowValues::Timestamp(self)
    }
}

impl IntoRowValue for Vec<u8> {
    fn into_row_value(self) -> RowValues {
        RowValues::Blob(self)
    }
}

impl<T: IntoRowValue> IntoRowValue for Option<T> {
    fn into_row_value(self) -> RowValues {
        self.map_or(RowValues::Null, IntoRowValue::into_row_value)
    }
}

/// A named bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParameter {
    name: String,
    pub value: RowValues,
}

impl SqlParameter {
    /// A leading `@` is accepted and dropped: `"@ProductID"` and `"ProductID"` are the same name.
    pub fn new(name: impl Into<String>, value: impl IntoRowValue) -> Self {
        let name = name.into();
        let name = match name.strip_prefix('@') {
            Some(stripped) => stripped.to_string(),
            None => name,
        };
        Self {
            name,
            value: value.into_row_value(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Anything that can list its parameters by name.
///
/// Every entry is bound, including NULL ones; nothing is filtered out.
pub trait ParamBag {
    fn to_parameters(&self) -> Vec<SqlParameter>;
}

impl ParamBag for [SqlParameter] {
    fn to_parameters(&self) -> Vec<SqlParameter> {
        self.to_vec()
    }
}

impl ParamBag for Vec<SqlParameter> {
    fn to_parameters(&self) -> Vec<SqlParameter> {
        self.clone()
    }
}

impl<T: ParamBag + ?Sized> ParamBag for &T {
    fn to_parameters(&self) -> Vec<SqlParameter> {
        (**self).to_parameters()
    }
}

/// An ad-hoc, ordered parameter bag.
///
/// ```rust
/// use adventure_data::prelude::*;
///
/// let product_id: Option<i32> = None;
/// let bag = NamedParams::new().with("ProductID", product_id);
/// assert_eq!(bag.to_parameters()[0].value, RowValues::Null);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams {
    params: Vec<SqlParameter>,
}

impl NamedParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl IntoRowValue) -> Self {
        self.params.push(SqlParameter::new(name, value));
        self
    }
}

impl ParamBag for NamedParams {
    fn to_parameters(&self) -> Vec<SqlParameter> {
        self.params.clone()
    }
}

/// A command ready to run: text, interpretation, parameters and timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCommand {
    text: String,
    kind: CommandKind,
    params: Vec<SqlParameter>,
    timeout: Duration,
}

impl SqlCommand {
    pub fn new(text: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            text: text.into(),
            kind,
            params: Vec::new(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn stored_procedure(name: impl Into<String>) -> Self {
        Self::new(name, CommandKind::StoredProcedure)
    }

    pub fn text(sql: impl Into<String>) -> Self {
        Self::new(sql, CommandKind::Text)
    }

    /// Use an explicit parameter list exactly as given.
    #[must_use]
    pub fn with_params(mut self, params: Vec<SqlParameter>) -> Self {
        self.params = params;
        self
    }

    /// Bind every entry of a parameter bag by name.
    #[must_use]
    pub fn bind(mut self, bag: &impl ParamBag) -> Self {
        self.params = bag.to_parameters();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn command_text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    #[must_use]
    pub fn params(&self) -> &[SqlParameter] {
        &self.params
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Produce the SQL text and positional values the driver executes.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ParameterError` for an invalid procedure or parameter
    /// name, or when two parameters share a name.
    pub fn render(&self) -> Result<(String, Vec<RowValues>), SqlHelperError> {
        for (i, param) in self.params.iter().enumerate() {
            if !PARAMETER_NAME.is_match(param.name()) {
                return Err(SqlHelperError::ParameterError(format!(
                    "`{}` is not a valid parameter name",
                    param.name()
                )));
            }
            if self.params[..i]
                .iter()
                .any(|p| p.name().eq_ignore_ascii_case(param.name()))
            {
                return Err(SqlHelperError::ParameterError(format!(
                    "parameter `{}` is bound more than once",
                    param.name()
                )));
            }
        }

        let values = self.params.iter().map(|p| p.value.clone()).collect();
        let sql = match self.kind {
            CommandKind::StoredProcedure => {
                validate_object_name(&self.text)?;
                let mut sql = format!("EXEC {}", self.text);
                for (i, param) in self.params.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    sql.push_str(&format!("{sep}@{} = @P{}", param.name(), i + 1));
                }
                sql
            }
            CommandKind::Text => {
                let names: Vec<&str> = self.params.iter().map(SqlParameter::name).collect();
                bind_named_parameters(&self.text, &names).into_owned()
            }
        };
        Ok((sql, values))
    }
}
