//! Data sets as supplied by callers and as stored after normalization.

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Value;

/// A coordinate-keyed record: an `x` key plus named y-fields
pub type Record = IndexMap<String, Value>;

/// Values of one data set, in any of the shapes the variants accept
#[derive(Debug, Clone)]
pub enum Values {
    /// Field-keyed values aligned with the `fields` option; `None` is empty.
    /// XY graphs read this as flattened `x, y` pairs.
    Positional(Vec<Option<f64>>),
    /// Field-keyed values addressed by field name
    Keyed(IndexMap<String, f64>),
    /// Explicit x/y pairs
    Points(Vec<(f64, f64)>),
    /// Coordinate-keyed records
    Records(Vec<Record>),
    /// A header row followed by data rows, each `[x, y1, y2, ...]`
    Table(Vec<Vec<Value>>),
}

impl Values {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Option<f64>>,
    {
        Values::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn keyed<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Values::Keyed(values.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn table<I, R, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Values::Table(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Values::Positional(_) => "positional",
            Values::Keyed(_) => "keyed",
            Values::Points(_) => "point",
            Values::Records(_) => "record",
            Values::Table(_) => "table",
        }
    }
}

impl From<Vec<f64>> for Values {
    fn from(values: Vec<f64>) -> Self {
        Values::positional(values)
    }
}

impl From<Vec<Option<f64>>> for Values {
    fn from(values: Vec<Option<f64>>) -> Self {
        Values::Positional(values)
    }
}

impl From<Vec<(f64, f64)>> for Values {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Values::Points(points)
    }
}

impl From<Vec<Record>> for Values {
    fn from(records: Vec<Record>) -> Self {
        Values::Records(records)
    }
}

/// One call's worth of data
#[derive(Debug, Clone)]
pub struct DataSet {
    pub title: Option<String>,
    pub values: Values,
}

impl DataSet {
    pub fn new(values: impl Into<Values>) -> Self {
        Self {
            title: None,
            values: values.into(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

// ============================================================================
// Stored (normalized) data
// ============================================================================

/// A data set after the variant has validated and normalized it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSet {
    pub title: Option<String>,
    #[serde(flatten)]
    pub body: SetBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetBody {
    /// Field name to value, in declared field order
    #[serde(rename = "values")]
    Fields(IndexMap<String, Option<f64>>),
    #[serde(rename = "points")]
    Points(Vec<Point>),
    #[serde(rename = "grid")]
    Grid(Grid),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Heat map rows; cells are aligned with `axis`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub axis: Vec<String>,
    pub rows: Vec<GridRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub x: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: Option<f64>,
    pub color: String,
}

impl StoredSet {
    pub fn fields(&self) -> Option<&IndexMap<String, Option<f64>>> {
        match &self.body {
            SetBody::Fields(values) => Some(values),
            _ => None,
        }
    }

    pub fn points(&self) -> Option<&[Point]> {
        match &self.body {
            SetBody::Points(points) => Some(points),
            _ => None,
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        match &self.body {
            SetBody::Grid(grid) => Some(grid),
            _ => None,
        }
    }
}

/// The ordered collection of accepted data sets
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    sets: Vec<StoredSet>,
}

impl DataStore {
    pub(crate) fn push(&mut self, set: StoredSet) {
        self.sets.push(set);
    }

    pub(crate) fn clear(&mut self) {
        self.sets.clear();
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoredSet> {
        self.sets.iter()
    }

    pub fn first(&self) -> Option<&StoredSet> {
        self.sets.first()
    }

    /// Data sets as a template value
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        Value::from_serialize(&self.sets)
    }
}

impl<'a> IntoIterator for &'a DataStore {
    type Item = &'a StoredSet;
    type IntoIter = std::slice::Iter<'a, StoredSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_sets_serialize_flat() {
        let set = StoredSet {
            title: Some("Sales".into()),
            body: SetBody::Fields(
                [("Jan".to_string(), Some(12.0)), ("Feb".to_string(), None)]
                    .into_iter()
                    .collect(),
            ),
        };
        let value = Value::from_serialize(&set).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["title"], Value::from("Sales"));
        let values = map["values"].as_map().unwrap();
        assert_eq!(values["Jan"], Value::from(12.0));
        assert_eq!(values["Feb"], Value::Null);
    }

    #[test]
    fn tables_collect_mixed_cells() {
        let values = Values::table([
            vec![Value::from("x"), Value::from("a")],
            vec![Value::from("Mon"), Value::from(3)],
        ]);
        let Values::Table(rows) = values else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], Value::from(3.0));
    }
}
