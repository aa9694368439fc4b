// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error("empty dataset provided for schema inference")]
    EmptyDataset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSchema {
    pub number_rows: usize,
    pub field: Vec<FieldMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub unique: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    String,
    Boolean,
    Datetime,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Datetime => "datetime",
        }
    }
    pub fn parse(value: &str) -> Self {
        match value {
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "datetime" => FieldType::Datetime,
            _ => FieldType::String,
        }
    }
}

pub fn schema_from_dataframe(df: &DataFrame) -> Result<DataSchema, SchemaError> {
    if df.height() == 0 || df.width() == 0 {
        return Err(SchemaError::EmptyDataset);
    }
    let mut fields = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_series().expect("Column should contain a series");
        fields.push(profile_field(series)?);
    }
    Ok(DataSchema {
        number_rows: df.height(),
        field: fields,
    })
}

pub fn schema_from_csv<P: AsRef<Path>>(path: P) -> Result<DataSchema, SchemaError> {
    let file = File::open(path)?;
    let df = CsvReader::new(file).finish()?;
    schema_from_dataframe(&df)
}

fn profile_field(series: &Series) -> Result<FieldMetadata, SchemaError> {
    let field_type = detect_field_type(series);
    let unique = series.n_unique()?;
    let (min, max, std) = if field_type == FieldType::Number {
        let floats = series.cast(&polars::prelude::DataType::Float64)?;
        let values = floats.f64()?;
        (values.min(), values.max(), values.std(1))
    } else {
        (None, None, None)
    };
    Ok(FieldMetadata {
        name: series.name().to_string(),
        field_type,
        unique,
        min,
        max,
        std,
    })
}

fn detect_field_type(series: &Series) -> FieldType {
    match series.dtype() {
        polars::prelude::DataType::Boolean => FieldType::Boolean,
        polars::prelude::DataType::Date | polars::prelude::DataType::Datetime(_, _) => {
            FieldType::Datetime
        }
        polars::prelude::DataType::Float64
        | polars::prelude::DataType::Float32
        | polars::prelude::DataType::Int64
        | polars::prelude::DataType::Int32
        | polars::prelude::DataType::Int16
        | polars::prelude::DataType::Int8
        | polars::prelude::DataType::UInt64
        | polars::prelude::DataType::UInt32
        | polars::prelude::DataType::UInt16
        | polars::prelude::DataType::UInt8 => FieldType::Number,
        _ => FieldType::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn classifies_dtypes_and_counts() {
        let df = polars::df!(
            "price" => &[1.5f64, 2.0, 2.0, 4.0],
            "label" => &["a", "b", "a", "c"],
            "active" => &[true, false, true, true],
        )
        .unwrap();
        let schema = schema_from_dataframe(&df).unwrap();
        assert_eq!(schema.number_rows, 4);
        assert_eq!(schema.field.len(), 3);

        let price = &schema.field[0];
        assert_eq!(price.field_type, FieldType::Number);
        assert_eq!(price.unique, 3);
        assert_eq!(price.min, Some(1.5));
        assert_eq!(price.max, Some(4.0));
        assert!(price.std.is_some());

        let label = &schema.field[1];
        assert_eq!(label.field_type, FieldType::String);
        assert_eq!(label.unique, 3);
        assert_eq!(label.min, None);

        assert_eq!(schema.field[2].field_type, FieldType::Boolean);
    }

    #[test]
    fn rejects_empty_frames() {
        let df = DataFrame::empty();
        assert!(matches!(
            schema_from_dataframe(&df),
            Err(SchemaError::EmptyDataset)
        ));
    }

    #[test]
    fn reads_schema_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "amount,region").unwrap();
        writeln!(file, "10,north").unwrap();
        writeln!(file, "12,south").unwrap();
        writeln!(file, "10,north").unwrap();
        let schema = schema_from_csv(file.path()).unwrap();
        assert_eq!(schema.number_rows, 3);
        assert_eq!(schema.field[0].field_type, FieldType::Number);
        assert_eq!(schema.field[1].field_type, FieldType::String);
        assert_eq!(schema.field[1].unique, 2);
    }
}
