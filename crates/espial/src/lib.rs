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

pub mod chart_spec;
pub mod data_schema;
pub mod error;
pub mod fact_encoding;
pub mod oracle;
pub mod problem_counter;
pub mod recommender;
pub mod search_loop;
pub mod spec_builder;

pub use chart_spec::{
    ChartSpecification, CoordinateSystem, EncodingExtra, EncodingSpec, MarkSpec, ScaleSpec,
    ViewSpec,
};
pub use data_schema::{
    schema_from_csv, schema_from_dataframe, DataSchema, FieldMetadata, FieldType, SchemaError,
};
pub use error::{ConfigError, Result, SpecSearchError};
pub use fact_encoding::{spec_from_facts, spec_to_facts, Fact, FactError};
pub use oracle::{
    ChartLayout, Completion, ConstraintOracle, OracleError, RenderFailure, RenderedChart,
    ValidationOracle, ViewConfiguration,
};
pub use problem_counter::ProblemCounter;
pub use recommender::{
    default_labeler, Recommendation, RecommendationRanker, RecommendationSet, DEFAULT_COMPLETIONS,
};
pub use search_loop::{
    sample_candidate, DiscardReason, ExperimentSink, SampleError, SearchConfig, SearchLoop,
    SearchReport, SinkError, TrialOutcome, TrialRecord, TrialResult,
};
pub use spec_builder::{
    build_spec, build_spec_from_vector, CandidateParams, ExtraMode, ParameterDomain,
    ParameterVector,
};

use indexmap::IndexMap;
use polars::prelude::DataFrame;

/// Bundles a parameter domain, a search configuration and the two oracle
/// seams behind one entry point.
pub struct SearchSession<'a, V, C> {
    domain: ParameterDomain,
    config: SearchConfig,
    validator: &'a V,
    constraints: &'a C,
}

impl<'a, V: ValidationOracle, C: ConstraintOracle> SearchSession<'a, V, C> {
    pub fn new(domain: ParameterDomain, validator: &'a V, constraints: &'a C) -> Self {
        Self {
            domain,
            config: SearchConfig::default(),
            validator,
            constraints,
        }
    }

    pub fn with_config(
        domain: ParameterDomain,
        config: SearchConfig,
        validator: &'a V,
        constraints: &'a C,
    ) -> Self {
        Self {
            domain,
            config,
            validator,
            constraints,
        }
    }

    pub fn domain(&self) -> &ParameterDomain {
        &self.domain
    }

    pub fn explore(&self, data: &DataFrame, counter: &mut ProblemCounter) -> Result<SearchReport> {
        SearchLoop::new(
            &self.domain,
            self.config.clone(),
            self.validator,
            self.constraints,
        )
        .run(data, counter)
    }

    pub fn recommend(
        &self,
        partial: &[Fact],
        data: &DataFrame,
        num: usize,
    ) -> Result<IndexMap<String, Recommendation>> {
        RecommendationRanker::new(self.constraints, self.validator).recommend_charts(
            partial,
            data,
            num,
            default_labeler,
        )
    }

    pub fn recommend_generated(
        &self,
        base: &[Fact],
        marks: &[String],
        fields: &[String],
        channels: &[String],
        data: &DataFrame,
        num: usize,
    ) -> Result<RecommendationSet> {
        RecommendationRanker::new(self.constraints, self.validator)
            .rank_generated(base, marks, fields, channels, data, num)
    }
}
