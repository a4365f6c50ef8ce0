//! Helpers for the all-text tables passed between stages.
//!
//! Every table in the pipeline is a `DataFrame` of nullable `String`
//! columns; these helpers keep the polars plumbing in one place.

use crate::error::Result;
use polars::prelude::*;

/// Values of one text column, row-ordered
pub type TextValues = Vec<Option<String>>;

/// Column names in table order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_columns()
        .iter()
        .any(|column| column.name().as_str() == name)
}

/// Build a text column
pub fn text_column(name: &str, values: TextValues) -> Column {
    Column::new(name.into(), values)
}

/// Build an all-null text column
pub fn null_column(name: &str, len: usize) -> Column {
    Column::full_null(name.into(), len, &DataType::String)
}

/// Copy out the values of a text column
pub fn text_values(df: &DataFrame, name: &str) -> Result<TextValues> {
    let values = df.column(name)?.as_materialized_series().str()?;
    Ok(values
        .into_iter()
        .map(|value| value.map(str::to_owned))
        .collect())
}

/// Assemble a table from named text columns
pub fn frame_from_columns(columns: Vec<(String, TextValues)>) -> Result<DataFrame> {
    let columns = columns
        .into_iter()
        .map(|(name, values)| text_column(&name, values))
        .collect();
    Ok(DataFrame::new(columns)?)
}
