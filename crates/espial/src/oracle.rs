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

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::chart_spec::ChartSpecification;
use crate::fact_encoding::Fact;

#[derive(Debug, Error)]
pub enum RenderFailure {
    #[error("schema validation failed: {reason}")]
    SchemaValidation { reason: String },
    #[error("rendering failed: {reason}")]
    Render { reason: String },
    #[error("chart serialisation failed: {0}")]
    Serialisation(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("constraint solver failed: {reason}")]
    Solver { reason: String },
    #[error("solver returned an unusable answer set: {reason}")]
    AnswerSet { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartLayout {
    Single,
    ColumnFacet { columns: usize },
    RowFacet { rows: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfiguration {
    pub continuous_width: u32,
    pub continuous_height: u32,
}

impl Default for ViewConfiguration {
    fn default() -> Self {
        Self {
            continuous_width: 200,
            continuous_height: 200,
        }
    }
}

/// Backend-produced drawable chart. The body is the renderer's own payload,
/// carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedChart {
    pub layout: ChartLayout,
    pub config: ViewConfiguration,
    pub body: serde_json::Value,
}

impl RenderedChart {
    pub fn new(layout: ChartLayout, body: serde_json::Value) -> Self {
        Self {
            layout,
            config: ViewConfiguration::default(),
            body,
        }
    }
    pub fn is_column_faceted(&self) -> bool {
        matches!(self.layout, ChartLayout::ColumnFacet { .. })
    }
    pub fn configure_view(&mut self, width: u32, height: u32) {
        self.config = ViewConfiguration {
            continuous_width: width,
            continuous_height: height,
        };
    }
    pub fn to_json(&self) -> Result<String, RenderFailure> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Turns a specification plus dataset into a drawable chart, or reports why
/// the combination is not drawable.
pub trait ValidationOracle {
    fn render(
        &self,
        spec: &ChartSpecification,
        data: &DataFrame,
    ) -> Result<RenderedChart, RenderFailure>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub cost: f64,
    pub answer_set: Vec<Fact>,
}

/// Rule-engine seam. Violation and preference names are opaque identifiers
/// matched against the problem counter's keys.
pub trait ConstraintOracle {
    fn violations(&self, facts: &[Fact]) -> Result<Vec<String>, OracleError>;
    fn preferences(&self, facts: &[Fact]) -> Result<HashMap<String, u32>, OracleError>;
    fn complete(&self, partial: &[Fact], num: usize) -> Result<Vec<Completion>, OracleError>;
}
