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

use serde::{Deserialize, Serialize};

use crate::data_schema::{DataSchema, FieldMetadata};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpecification {
    pub view: Vec<ViewSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field: Vec<FieldMetadata>,
}

impl ChartSpecification {
    pub fn single_view(view: ViewSpec) -> Self {
        Self {
            view: vec![view],
            number_rows: None,
            field: Vec::new(),
        }
    }
    pub fn merge_schema(&mut self, schema: &DataSchema) {
        self.number_rows = Some(schema.number_rows);
        self.field = schema.field.clone();
    }
    pub fn ensure_view(&mut self) {
        if self.view.is_empty() {
            self.view.push(ViewSpec::default());
        }
    }
    pub fn encodings(&self) -> impl Iterator<Item = &EncodingSpec> {
        self.view
            .iter()
            .flat_map(|view| view.mark.iter())
            .flat_map(|mark| mark.encoding.iter())
    }
    pub fn scales(&self) -> impl Iterator<Item = &ScaleSpec> {
        self.view.iter().flat_map(|view| view.scale.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mark: Vec<MarkSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scale: Vec<ScaleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<CoordinateSystem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    Cartesian,
    Polar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkSpec {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encoding: Vec<EncodingSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSpec {
    pub channel: String,
    pub field: String,
    #[serde(flatten)]
    pub extra: Option<EncodingExtra>,
}

impl EncodingSpec {
    pub fn new(channel: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            field: field.into(),
            extra: None,
        }
    }
    pub fn aggregate(&self) -> Option<&str> {
        match &self.extra {
            Some(EncodingExtra::Aggregate(name)) => Some(name),
            _ => None,
        }
    }
    pub fn stack(&self) -> Option<&str> {
        match &self.extra {
            Some(EncodingExtra::Stack(mode)) => Some(mode),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingExtra {
    Aggregate(String),
    Stack(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSpec {
    pub channel: String,
    #[serde(rename = "type")]
    pub scale_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero: Option<bool>,
}
