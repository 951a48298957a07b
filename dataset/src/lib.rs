//! Tabular dataset loading.
//!
//! A [`Frame`] is an immutable, column-oriented table read from CSV. Each
//! column carries an inferred [`DType`] (`int64`, `float64`, `bool`, `object`)
//! and its cells as [`Value`]s, with missing cells kept explicit.

mod error;
mod frame;
mod reader;
mod value;

pub use error::DatasetError;
pub use frame::{Column, Frame};
pub use reader::CsvOptions;
pub use value::{DType, Value, ValueKey};
