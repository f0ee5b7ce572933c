use std::{collections::BTreeSet, io::Write, path::Path};

use ndarray::Array2;
use ordered_float::OrderedFloat;
use serde::Serialize;

use super::{collector::ResultsDir, error::{IoContext, ScanResult}, type_lib::{NumericData, ResultMap}};

/// Converged values of several fields, one row per swept value. Gaps are NaN.
#[derive(Debug, Clone, Serialize)]
pub struct ScanTable {
    pub var_name: String,
    pub x: Vec<NumericData>,
    pub fields: Vec<String>,
    pub values: Array2<NumericData>,
}

impl ScanTable {
    pub fn from_columns(var_name: &str, columns: Vec<(String, ResultMap)>) -> Self {
        let keys: BTreeSet<OrderedFloat<NumericData>> = columns.iter().flat_map(|(_, results)| results.keys().copied()).collect();
        let x: Vec<NumericData> = keys.iter().map(|k| k.0).collect();
        let values = Array2::from_shape_fn((x.len(), columns.len()), |(row, col)| {
            columns[col].1.get(&OrderedFloat(x[row])).copied().unwrap_or(NumericData::NAN)
        });
        ScanTable {
            var_name: var_name.to_string(),
            x,
            fields: columns.into_iter().map(|(field, _)| field).collect(),
            values,
        }
    }

    pub fn collect(results: &ResultsDir, var_name: &str, fields: &[String]) -> Self {
        let columns = fields.iter().map(|field| (field.clone(), results.load_results(var_name, field))).collect();
        ScanTable::from_columns(var_name, columns)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> ScanResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let header = std::iter::once(self.var_name.as_str()).chain(self.fields.iter().map(String::as_str));
        csv_writer.write_record(header)?;
        for (row, x) in self.x.iter().enumerate() {
            let row_values = self.values.row(row);
            let record = std::iter::once(x.to_string()).chain(row_values.iter().map(|v| if v.is_nan() { String::new() } else { v.to_string() }));
            csv_writer.write_record(record)?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> ScanResult<()> {
        let file = std::fs::File::create(path).at(path)?;
        self.write_csv(file)
    }

    pub fn save_json(&self, path: &Path) -> ScanResult<()> {
        let mut file = std::fs::File::create(path).at(path)?;
        let json = serde_json::to_string_pretty(self)?;
        file.write_all(json.as_bytes()).at(path)
    }
}
