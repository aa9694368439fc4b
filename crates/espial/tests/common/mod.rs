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

#![allow(dead_code)]

use std::collections::HashMap;

use espial::{
    ChartLayout, ChartSpecification, Completion, ConstraintOracle, ExperimentSink, ExtraMode, Fact,
    OracleError, ParameterDomain, RenderFailure, RenderedChart, SinkError, TrialRecord,
    ValidationOracle,
};
use polars::prelude::DataFrame;

pub fn toy_frame() -> DataFrame {
    polars::df!(
        "price" => &[1.5f64, 2.0, 2.5, 4.0],
        "category" => &["a", "b", "a", "c"],
        "stock" => &[10i64, 4, 7, 1],
    )
    .expect("toy frame")
}

pub fn toy_domain() -> ParameterDomain {
    ParameterDomain {
        fields: vec!["price".into(), "category".into(), "stock".into()],
        channels: vec!["x".into(), "y".into(), "color".into()],
        scales: vec!["linear".into(), "ordinal".into()],
        marks: vec!["bar".into(), "point".into()],
        extras: vec![ExtraMode::Aggregate, ExtraMode::Stack, ExtraMode::None],
        aggregates: vec!["mean".into(), "sum".into()],
        stacks: vec!["zero".into(), "normalize".into()],
    }
}

pub struct AcceptAllValidator;

impl ValidationOracle for AcceptAllValidator {
    fn render(
        &self,
        spec: &ChartSpecification,
        _data: &DataFrame,
    ) -> Result<RenderedChart, RenderFailure> {
        Ok(RenderedChart::new(
            ChartLayout::Single,
            serde_json::to_value(spec)?,
        ))
    }
}

pub struct RejectAllValidator;

impl ValidationOracle for RejectAllValidator {
    fn render(
        &self,
        _spec: &ChartSpecification,
        _data: &DataFrame,
    ) -> Result<RenderedChart, RenderFailure> {
        Err(RenderFailure::SchemaValidation {
            reason: "channel mapping is not drawable".to_string(),
        })
    }
}

pub struct FacetingValidator;

impl ValidationOracle for FacetingValidator {
    fn render(
        &self,
        spec: &ChartSpecification,
        _data: &DataFrame,
    ) -> Result<RenderedChart, RenderFailure> {
        Ok(RenderedChart::new(
            ChartLayout::ColumnFacet { columns: 3 },
            serde_json::to_value(spec)?,
        ))
    }
}

pub struct ScriptedConstraints {
    pub hard: Vec<String>,
    pub soft: HashMap<String, u32>,
    pub completions: Vec<Completion>,
}

impl ConstraintOracle for ScriptedConstraints {
    fn violations(&self, _facts: &[Fact]) -> Result<Vec<String>, OracleError> {
        Ok(self.hard.clone())
    }
    fn preferences(&self, _facts: &[Fact]) -> Result<HashMap<String, u32>, OracleError> {
        Ok(self.soft.clone())
    }
    fn complete(&self, _partial: &[Fact], num: usize) -> Result<Vec<Completion>, OracleError> {
        Ok(self.completions.iter().take(num).cloned().collect())
    }
}

pub struct FailingConstraints;

impl ConstraintOracle for FailingConstraints {
    fn violations(&self, _facts: &[Fact]) -> Result<Vec<String>, OracleError> {
        Err(OracleError::Solver {
            reason: "grounding failed".to_string(),
        })
    }
    fn preferences(&self, _facts: &[Fact]) -> Result<HashMap<String, u32>, OracleError> {
        Err(OracleError::Solver {
            reason: "grounding failed".to_string(),
        })
    }
    fn complete(&self, _partial: &[Fact], _num: usize) -> Result<Vec<Completion>, OracleError> {
        Err(OracleError::Solver {
            reason: "grounding failed".to_string(),
        })
    }
}

/// Answers every partial with one completion echoing it back, costed from a
/// per-mark table. Lets ranking tests steer costs per combination.
pub struct CostTableCompleter {
    pub costs: HashMap<String, f64>,
}

impl ConstraintOracle for CostTableCompleter {
    fn violations(&self, _facts: &[Fact]) -> Result<Vec<String>, OracleError> {
        Ok(Vec::new())
    }
    fn preferences(&self, _facts: &[Fact]) -> Result<HashMap<String, u32>, OracleError> {
        Ok(HashMap::new())
    }
    fn complete(&self, partial: &[Fact], num: usize) -> Result<Vec<Completion>, OracleError> {
        let mark = partial
            .iter()
            .find_map(|fact| match fact {
                Fact::Attribute {
                    entity,
                    property,
                    value,
                    ..
                } if entity == "mark" && property == "type" => Some(value.clone()),
                _ => None,
            })
            .ok_or(OracleError::AnswerSet {
                reason: "partial carries no mark type".to_string(),
            })?;
        let cost = *self.costs.get(&mark).unwrap_or(&10.0);
        Ok((0..num.min(1))
            .map(|_| Completion {
                cost,
                answer_set: partial.to_vec(),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub records: Vec<TrialRecord>,
    pub fail: bool,
}

impl ExperimentSink for RecordingSink {
    fn record(&mut self, record: &TrialRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        if self.fail {
            Err(SinkError {
                reason: "tracking backend offline".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
