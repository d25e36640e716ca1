use crate::error::{Error, Result};
use crate::Matrix;
use ndarray::Axis;
use std::collections::HashSet;

/// A dense numeric table with named columns and keyed rows.
///
/// Row keys are the external identity of each sample (a food item, a
/// sample id) and follow the rows through every derived matrix.
#[derive(Clone, Debug)]
pub struct FeatureTable {
    row_keys: Vec<String>,
    columns: Vec<String>,
    values: Matrix,
}

impl FeatureTable {
    pub fn new(row_keys: Vec<String>, columns: Vec<String>, values: Matrix) -> Result<Self> {
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(Error::InvalidParameter(
                "feature table must have at least one row and one column".to_string(),
            ));
        }
        if row_keys.len() != values.nrows() {
            return Err(Error::InvalidParameter(format!(
                "{} row keys supplied for {} rows",
                row_keys.len(),
                values.nrows()
            )));
        }
        if columns.len() != values.ncols() {
            return Err(Error::DimensionMismatch {
                expected: columns.len(),
                found: values.ncols(),
            });
        }
        if let Some(dup) = first_duplicate(&columns) {
            return Err(Error::InvalidParameter(format!("duplicate column name '{dup}'")));
        }
        if let Some(dup) = first_duplicate(&row_keys) {
            return Err(Error::InvalidParameter(format!("duplicate row key '{dup}'")));
        }
        ensure_finite(&values)?;

        Ok(Self { row_keys, columns, values })
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.values.ncols()
    }

    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Matrix {
        &self.values
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns a new table holding only `names`, in the order given.
    pub fn select_columns(&self, names: &[&str]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|&name| {
                self.column_index(name)
                    .ok_or_else(|| Error::UnknownColumn(name.to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;

        let values = self.values.select(Axis(1), &indices);
        let columns = names.iter().map(|n| n.to_string()).collect();

        Self::new(self.row_keys.clone(), columns, values)
    }
}

/// Fails on the first NaN or infinite entry, reporting its position.
pub(crate) fn ensure_finite(values: &Matrix) -> Result<()> {
    for ((row, column), v) in values.indexed_iter() {
        if !v.is_finite() {
            return Err(Error::NonFiniteValue { row, column });
        }
    }
    Ok(())
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .iter()
        .find(|name| !seen.insert(name.as_str()))
        .map(|name| name.as_str())
}
