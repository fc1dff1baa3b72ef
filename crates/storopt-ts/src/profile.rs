//! Profile tables: per-step scaling factors for residential load, PV and wind.

use std::{
    collections::BTreeMap,
    fs::File,
    path::Path,
};

use polars::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ExpandError, ExpandResult};

/// Scaling factors of a single time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileRow {
    pub step: i64,
    pub residential: f64,
    pub pv: f64,
    pub wind: f64,
}

impl ProfileRow {
    pub fn new(step: i64, residential: f64, pv: f64, wind: f64) -> Self {
        Self {
            step,
            residential,
            pv,
            wind,
        }
    }
}

/// Column names used to pick the index and the three factor curves from a
/// tabular input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileColumns {
    /// Time-step column; the row position is used when it is absent
    pub index: String,
    pub residential: String,
    pub pv: String,
    pub wind: String,
}

impl Default for ProfileColumns {
    fn default() -> Self {
        Self {
            index: "step".to_string(),
            residential: "residential".to_string(),
            pv: "pv".to_string(),
            wind: "wind".to_string(),
        }
    }
}

impl ProfileColumns {
    fn factors(&self) -> [&str; 3] {
        [
            self.residential.as_str(),
            self.pv.as_str(),
            self.wind.as_str(),
        ]
    }
}

/// Ordered sequence of profile rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileTable {
    rows: Vec<ProfileRow>,
}

impl ProfileTable {
    pub fn new(rows: Vec<ProfileRow>) -> Self {
        Self { rows }
    }

    /// Build a table from parallel columns.
    ///
    /// `index` defaults to the row position when `None`.
    pub fn from_columns(
        index: Option<Vec<i64>>,
        residential: Vec<f64>,
        pv: Vec<f64>,
        wind: Vec<f64>,
    ) -> ExpandResult<Self> {
        let len = residential.len();
        if pv.len() != len || wind.len() != len {
            return Err(ExpandError::shape(format!(
                "factor columns differ in length (residential {}, pv {}, wind {})",
                len,
                pv.len(),
                wind.len()
            )));
        }
        let index = match index {
            Some(index) if index.len() != len => {
                return Err(ExpandError::shape(format!(
                    "index column has {} rows but factor columns have {}",
                    index.len(),
                    len
                )));
            }
            Some(index) => index,
            None => (0..len as i64).collect(),
        };

        let rows = index
            .into_iter()
            .zip(residential)
            .zip(pv)
            .zip(wind)
            .map(|(((step, residential), pv), wind)| ProfileRow::new(step, residential, pv, wind))
            .collect();
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ProfileRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].step <= w[1].step)
    }

    /// Stable sort by time-step index.
    pub fn sort(&mut self) {
        self.rows.sort_by_key(|row| row.step);
    }

    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.iter().map(|row| row.step)
    }
}

/// Read a profile table from `.csv` or pandas column-oriented `.json`.
pub fn read_profiles(path: &Path, columns: &ProfileColumns) -> ExpandResult<ProfileTable> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let io_err = |source| ExpandError::Io {
        path: path.to_path_buf(),
        source,
    };

    let table = match extension.as_str() {
        "csv" => {
            let mut file = File::open(path).map_err(io_err)?;
            let df = CsvReader::new(&mut file)
                .has_header(true)
                .finish()
                .map_err(|e| ExpandError::Parse(format!("reading CSV {}: {e}", path.display())))?;
            profiles_from_frame(&df, columns)?
        }
        "json" => {
            let body = std::fs::read_to_string(path).map_err(io_err)?;
            profiles_from_json(&body, columns)?
        }
        other => {
            return Err(ExpandError::Parse(format!(
                "unsupported profile extension '{}'; use .csv or .json",
                other
            )));
        }
    };

    debug!(
        path = %path.display(),
        rows = table.len(),
        "read profile table"
    );
    Ok(table)
}

/// Extract a profile table from a data frame with named factor columns.
pub fn profiles_from_frame(df: &DataFrame, columns: &ProfileColumns) -> ExpandResult<ProfileTable> {
    let names = df.get_column_names();
    for required in columns.factors() {
        if !names.contains(&required) {
            return Err(ExpandError::shape(format!(
                "profile table is missing column '{required}'"
            )));
        }
    }

    let factor = |name: &str| -> ExpandResult<Vec<f64>> {
        let series = df
            .column(name)?
            .cast(&DataType::Float64)
            .map_err(|e| ExpandError::shape(format!("column '{name}' is not numeric: {e}")))?;
        let values = series.f64()?;
        values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    ExpandError::shape(format!("column '{name}' has no value at row {row}"))
                })
            })
            .collect()
    };

    let index = if names.contains(&columns.index.as_str()) {
        let series = df
            .column(&columns.index)?
            .cast(&DataType::Int64)
            .map_err(|e| {
                ExpandError::shape(format!("index column '{}' is not integer: {e}", columns.index))
            })?;
        let values = series.i64()?;
        let index = values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    ExpandError::shape(format!(
                        "index column '{}' has no value at row {row}",
                        columns.index
                    ))
                })
            })
            .collect::<ExpandResult<Vec<i64>>>()?;
        Some(index)
    } else {
        None
    };

    ProfileTable::from_columns(
        index,
        factor(&columns.residential)?,
        factor(&columns.pv)?,
        factor(&columns.wind)?,
    )
}

/// Column values in pandas `orient="columns"` form (`{"0": 0.1, ...}`) or as
/// a plain list where the position is the index.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonColumn {
    Indexed(BTreeMap<String, Option<f64>>),
    Positional(Vec<Option<f64>>),
}

impl JsonColumn {
    fn into_steps(self, name: &str) -> ExpandResult<BTreeMap<i64, f64>> {
        let missing = |key: &dyn std::fmt::Display| {
            ExpandError::shape(format!("column '{name}' has no value at step {key}"))
        };
        match self {
            JsonColumn::Indexed(values) => {
                let mut steps = BTreeMap::new();
                for (key, value) in values {
                    let step = key.trim().parse::<i64>().map_err(|_| {
                        ExpandError::shape(format!(
                            "column '{name}' has non-integer step key '{key}'"
                        ))
                    })?;
                    let value = value.ok_or_else(|| missing(&step))?;
                    // "1", "01" and " 1" all name step 1
                    if steps.insert(step, value).is_some() {
                        return Err(ExpandError::shape(format!(
                            "time step {step} appears more than once in column '{name}'"
                        )));
                    }
                }
                Ok(steps)
            }
            JsonColumn::Positional(values) => values
                .into_iter()
                .enumerate()
                .map(|(pos, value)| {
                    let value = value.ok_or_else(|| missing(&pos))?;
                    Ok((pos as i64, value))
                })
                .collect(),
        }
    }
}

/// Parse a column-oriented JSON document into a sorted profile table.
pub fn profiles_from_json(body: &str, columns: &ProfileColumns) -> ExpandResult<ProfileTable> {
    let mut document: BTreeMap<String, JsonColumn> = serde_json::from_str(body)?;

    let mut curves = Vec::with_capacity(3);
    for name in columns.factors() {
        let column = document.remove(name).ok_or_else(|| {
            ExpandError::shape(format!("profile table is missing column '{name}'"))
        })?;
        curves.push(column.into_steps(name)?);
    }
    let wind = curves.pop().unwrap_or_default();
    let pv = curves.pop().unwrap_or_default();
    let residential = curves.pop().unwrap_or_default();

    for (name, curve) in [(&columns.pv, &pv), (&columns.wind, &wind)] {
        if !curve.keys().eq(residential.keys()) {
            return Err(ExpandError::shape(format!(
                "column '{name}' covers different steps than column '{}'",
                columns.residential
            )));
        }
    }

    let rows = residential
        .into_iter()
        .map(|(step, residential)| ProfileRow::new(step, residential, pv[&step], wind[&step]))
        .collect();
    Ok(ProfileTable::new(rows))
}
