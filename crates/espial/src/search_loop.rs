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
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chart_spec::ChartSpecification;
use crate::data_schema::{schema_from_dataframe, DataSchema};
use crate::error::{ConfigError, Result};
use crate::fact_encoding::spec_to_facts;
use crate::oracle::{ConstraintOracle, RenderFailure, ValidationOracle};
use crate::problem_counter::ProblemCounter;
use crate::spec_builder::{build_spec, CandidateParams, ParameterDomain};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub num_runs: usize,
    pub encoding_counts: Vec<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_runs: 1000,
            encoding_counts: vec![2, 3],
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.encoding_counts.is_empty() || self.encoding_counts.iter().any(|&n| n == 0) {
            return Err(ConfigError::InvalidSearchConfig {
                field: "encoding_counts".to_string(),
            });
        }
        Ok(())
    }
    pub fn for_smoke_test() -> Self {
        Self {
            num_runs: 25,
            ..Default::default()
        }
    }
    pub fn for_survey() -> Self {
        Self {
            num_runs: 5000,
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("parameter pool '{pool}' is empty")]
    EmptyPool { pool: &'static str },
    #[error("parameter pool '{pool}' holds {available} values, {needed} needed")]
    PoolTooSmall {
        pool: &'static str,
        needed: usize,
        available: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub spec: ChartSpecification,
    pub hard: Vec<String>,
    pub soft: HashMap<String, u32>,
}

#[derive(Debug)]
pub enum TrialOutcome {
    Accepted(TrialResult),
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    Validation { reason: String },
    Render { reason: String },
    Oracle { reason: String },
    Sampling { reason: String },
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::Validation { reason } => write!(f, "schema validation: {reason}"),
            DiscardReason::Render { reason } => write!(f, "render: {reason}"),
            DiscardReason::Oracle { reason } => write!(f, "constraint oracle: {reason}"),
            DiscardReason::Sampling { reason } => write!(f, "sampling: {reason}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct SearchReport {
    pub results: Vec<TrialResult>,
    pub discards: Vec<DiscardReason>,
}

impl SearchReport {
    pub fn iterations(&self) -> usize {
        self.results.len() + self.discards.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub iteration: usize,
    pub counter_label: String,
    pub active_problems: usize,
}

#[derive(Debug, Error)]
#[error("experiment sink failed: {reason}")]
pub struct SinkError {
    pub reason: String,
}

/// Optional per-iteration tracking hook. A failing sink never aborts the
/// loop.
pub trait ExperimentSink {
    fn record(&mut self, record: &TrialRecord) -> std::result::Result<(), SinkError>;
}

/// Drives sample → build → validate → score → accumulate for a fixed
/// iteration budget. Discarded trials consume budget like accepted ones.
pub struct SearchLoop<'a, V, C> {
    domain: &'a ParameterDomain,
    config: SearchConfig,
    validator: &'a V,
    constraints: &'a C,
    sink: Option<&'a mut dyn ExperimentSink>,
}

impl<'a, V: ValidationOracle, C: ConstraintOracle> SearchLoop<'a, V, C> {
    pub fn new(
        domain: &'a ParameterDomain,
        config: SearchConfig,
        validator: &'a V,
        constraints: &'a C,
    ) -> Self {
        Self {
            domain,
            config,
            validator,
            constraints,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: &'a mut dyn ExperimentSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn run(&mut self, data: &DataFrame, counter: &mut ProblemCounter) -> Result<SearchReport> {
        if counter.is_empty() {
            return Err(ConfigError::EmptyProblemSet.into());
        }
        self.config.validate()?;
        let schema = schema_from_dataframe(data)?;
        let counter_label = format!(
            "{}_problems_count",
            self.domain
                .marks
                .first()
                .map(String::as_str)
                .unwrap_or("search")
        );
        let mut report = SearchReport::default();
        let mut rng = rand::thread_rng();
        for iteration in 0..self.config.num_runs {
            if let Some(sink) = self.sink.as_mut() {
                let record = TrialRecord {
                    iteration,
                    counter_label: counter_label.clone(),
                    active_problems: counter.active_problems(),
                };
                if let Err(error) = sink.record(&record) {
                    warn!(iteration, %error, "experiment sink failed; continuing");
                }
            }
            match self.run_trial(&mut rng, data, &schema, counter) {
                TrialOutcome::Accepted(result) => {
                    let soft_total: u32 = result.soft.values().sum();
                    debug!(
                        iteration,
                        hard = result.hard.len(),
                        soft = soft_total,
                        "trial accepted"
                    );
                    report.results.push(result);
                }
                TrialOutcome::Discarded(reason) => {
                    debug!(iteration, %reason, "trial discarded");
                    report.discards.push(reason);
                }
            }
        }
        Ok(report)
    }

    fn run_trial<R: Rng>(
        &self,
        rng: &mut R,
        data: &DataFrame,
        schema: &DataSchema,
        counter: &mut ProblemCounter,
    ) -> TrialOutcome {
        let params = match sample_candidate(self.domain, &self.config.encoding_counts, rng) {
            Ok(params) => params,
            Err(error) => {
                return TrialOutcome::Discarded(DiscardReason::Sampling {
                    reason: error.to_string(),
                })
            }
        };
        let mut spec = build_spec(&params);
        spec.merge_schema(schema);
        let chart = match self.validator.render(&spec, data) {
            Ok(chart) => chart,
            Err(RenderFailure::SchemaValidation { reason }) => {
                return TrialOutcome::Discarded(DiscardReason::Validation { reason })
            }
            Err(other) => {
                return TrialOutcome::Discarded(DiscardReason::Render {
                    reason: other.to_string(),
                })
            }
        };
        if let Err(error) = chart.to_json() {
            return TrialOutcome::Discarded(DiscardReason::Render {
                reason: error.to_string(),
            });
        }
        let facts = spec_to_facts(&spec);
        let hard = match self.constraints.violations(&facts) {
            Ok(hard) => hard,
            Err(error) => {
                return TrialOutcome::Discarded(DiscardReason::Oracle {
                    reason: error.to_string(),
                })
            }
        };
        let soft = match self.constraints.preferences(&facts) {
            Ok(soft) => soft,
            Err(error) => {
                return TrialOutcome::Discarded(DiscardReason::Oracle {
                    reason: error.to_string(),
                })
            }
        };
        for name in &hard {
            counter.record_hard(name);
        }
        for (name, weight) in &soft {
            counter.record_soft(name, *weight);
        }
        TrialOutcome::Accepted(TrialResult {
            hard: hard
                .into_iter()
                .filter(|name| counter.tracks(name))
                .collect(),
            soft: soft
                .into_iter()
                .filter(|(name, _)| counter.tracks(name))
                .collect(),
            spec,
        })
    }
}

/// One random draw from the domain. Fields and channels are sampled without
/// replacement; scales, mark, extra mode, aggregate and stack with
/// replacement, the latter two regardless of whether the extra mode uses
/// them.
pub fn sample_candidate<R: Rng>(
    domain: &ParameterDomain,
    encoding_counts: &[usize],
    rng: &mut R,
) -> std::result::Result<CandidateParams, SampleError> {
    let enc_num = *encoding_counts
        .choose(rng)
        .ok_or(SampleError::EmptyPool {
            pool: "encoding_counts",
        })?;
    if domain.fields.len() < enc_num {
        return Err(SampleError::PoolTooSmall {
            pool: "fields",
            needed: enc_num,
            available: domain.fields.len(),
        });
    }
    if domain.channels.len() < enc_num {
        return Err(SampleError::PoolTooSmall {
            pool: "channels",
            needed: enc_num,
            available: domain.channels.len(),
        });
    }
    let fields: Vec<String> = domain
        .fields
        .choose_multiple(rng, enc_num)
        .cloned()
        .collect();
    let channels: Vec<String> = domain
        .channels
        .choose_multiple(rng, enc_num)
        .cloned()
        .collect();
    let scales = (0..enc_num)
        .map(|_| {
            domain
                .scales
                .choose(rng)
                .cloned()
                .ok_or(SampleError::EmptyPool { pool: "scales" })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mark = domain
        .marks
        .choose(rng)
        .cloned()
        .ok_or(SampleError::EmptyPool { pool: "marks" })?;
    let extra = *domain
        .extras
        .choose(rng)
        .ok_or(SampleError::EmptyPool { pool: "extras" })?;
    let aggregate = domain
        .aggregates
        .choose(rng)
        .cloned()
        .ok_or(SampleError::EmptyPool { pool: "aggregates" })?;
    let stack = domain
        .stacks
        .choose(rng)
        .cloned()
        .ok_or(SampleError::EmptyPool { pool: "stacks" })?;
    Ok(CandidateParams {
        fields,
        channels,
        scales,
        mark,
        extra,
        aggregate: Some(aggregate),
        stack: Some(stack),
        use_polar: false,
    })
}
