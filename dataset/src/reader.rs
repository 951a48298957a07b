//! CSV ingestion and dtype inference.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{Column, DType, DatasetError, Frame, Value};

/// Cells treated as missing (exact match after trimming).
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl Frame {
    pub fn from_csv_path(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let frame = Self::from_reader(file, options)?;
        tracing::info!(
            path = %path.display(),
            rows = frame.n_rows(),
            columns = frame.n_cols(),
            "Loaded dataset"
        );
        Ok(frame)
    }

    pub fn from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
            return Err(DatasetError::Empty);
        }
        let names = dedupe_headers(headers.iter());

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        for record in csv_reader.records() {
            let record = record?;
            for (cells, field) in raw.iter_mut().zip(record.iter()) {
                cells.push(parse_missing(field));
            }
        }

        let columns = names
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| build_column(name, cells))
            .collect();
        Frame::new(columns)
    }
}

fn parse_missing(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(field.to_string())
    }
}

/// Blank headers become `Unnamed: {i}`; repeats get `.1`, `.2`, ...
fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();
    for (i, header) in headers.enumerate() {
        let base = match header.trim() {
            "" => format!("Unnamed: {i}"),
            trimmed => trimmed.to_string(),
        };
        let mut name = base.clone();
        if seen.contains_key(&name) {
            loop {
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                let candidate = format!("{base}.{count}");
                if !seen.contains_key(&candidate) {
                    name = candidate;
                    break;
                }
            }
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }
    names
}

fn infer_dtype(cells: &[Option<String>]) -> DType {
    let present: Vec<&str> = cells.iter().flatten().map(|s| s.trim()).collect();
    if present.is_empty() {
        return DType::Float64;
    }
    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        return if present.len() == cells.len() {
            DType::Int64
        } else {
            DType::Float64
        };
    }
    if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        return DType::Float64;
    }
    if present.iter().all(|s| parse_bool(s).is_some()) {
        return DType::Bool;
    }
    DType::Object
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn build_column(name: String, cells: Vec<Option<String>>) -> Column {
    let dtype = infer_dtype(&cells);
    let values = cells
        .into_iter()
        .map(|cell| {
            let Some(raw) = cell else {
                return Value::Missing;
            };
            let trimmed = raw.trim();
            match dtype {
                DType::Int64 => trimmed.parse().map_or(Value::Missing, Value::Int),
                DType::Float64 => trimmed.parse().map_or(Value::Missing, Value::Float),
                DType::Bool => parse_bool(trimmed).map_or(Value::Missing, Value::Bool),
                DType::Object => Value::Text(raw),
            }
        })
        .collect();
    Column::new(name, dtype, values)
}
