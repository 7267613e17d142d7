use std::collections::HashMap;

use thiserror::Error;

use crate::normalize::normalize_column_name;
use crate::value::Value;

/// Errors that can occur when building or mutating a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("duplicate column name `{name}`")]
    DuplicateColumn { name: String },
    #[error("columns `{first}` and `{second}` both normalize to `{normalized}`")]
    NormalizedCollision {
        normalized: String,
        first: String,
        second: String,
    },
    #[error("column `{column}` has {found} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

static NULL: Value = Value::Null;

/// An ordered set of equally long, uniquely named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        for column in &columns {
            if column.len() != row_count {
                return Err(TableError::ColumnLength {
                    column: column.name.clone(),
                    expected: row_count,
                    found: column.len(),
                });
            }
        }
        ensure_unique(columns.iter().map(Column::name))?;
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Iterate the values of row `row` in column order.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &Value> + '_ {
        self.columns
            .iter()
            .map(move |c| c.values.get(row).unwrap_or(&NULL))
    }

    /// Rewrite every column name with [`normalize_column_name`].
    ///
    /// Two raw names that normalize to the same string are rejected with
    /// [`TableError::NormalizedCollision`]; the table is left untouched in that case.
    pub fn normalize_columns(&mut self) -> Result<(), TableError> {
        let mut seen: HashMap<String, usize> = HashMap::with_capacity(self.columns.len());
        let mut normalized = Vec::with_capacity(self.columns.len());
        for (idx, column) in self.columns.iter().enumerate() {
            let name = normalize_column_name(&column.name);
            if let Some(&prev) = seen.get(&name) {
                return Err(TableError::NormalizedCollision {
                    normalized: name,
                    first: self.columns[prev].name.clone(),
                    second: column.name.clone(),
                });
            }
            seen.insert(name.clone(), idx);
            normalized.push(name);
        }
        for (column, name) in self.columns.iter_mut().zip(normalized) {
            if column.name != name {
                log::debug!("renamed column `{}` -> `{name}`", column.name);
                column.name = name;
            }
        }
        Ok(())
    }

    /// Set every row of column `name` to `value`, appending the column if it is missing.
    ///
    /// An existing column keeps its position.
    pub fn fill_column(&mut self, name: &str, value: Value) {
        let values = vec![value; self.row_count];
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column::new(name, values)),
        }
    }
}

fn ensure_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), TableError> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TableError::DuplicateColumn {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
