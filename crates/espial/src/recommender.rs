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

use indexmap::IndexMap;
use itertools::iproduct;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::chart_spec::ChartSpecification;
use crate::error::Result;
use crate::fact_encoding::{spec_from_facts, spec_to_facts, Fact};
use crate::oracle::{ConstraintOracle, RenderedChart, ValidationOracle};

pub const DEFAULT_COMPLETIONS: usize = 5;

// Column-faceted multi-panel charts are clamped to a fixed panel size.
const FACET_PANEL_WIDTH: u32 = 130;
const FACET_PANEL_HEIGHT: u32 = 130;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub cost: f64,
    pub spec: ChartSpecification,
    pub facts: Vec<Fact>,
    pub chart: RenderedChart,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: IndexMap<String, Recommendation>,
    pub lowest_cost: Option<(String, Recommendation)>,
    pub highest_cost: Option<(String, Recommendation)>,
}

pub fn default_labeler(index: usize) -> String {
    format!("CHART {}", index + 1)
}

/// Asks the completion oracle for ranked extensions of a partial
/// specification and renders each. Unlike the search loop, failures here
/// propagate to the caller.
pub struct RecommendationRanker<'a, C, V> {
    constraints: &'a C,
    validator: &'a V,
}

impl<'a, C: ConstraintOracle, V: ValidationOracle> RecommendationRanker<'a, C, V> {
    pub fn new(constraints: &'a C, validator: &'a V) -> Self {
        Self {
            constraints,
            validator,
        }
    }

    pub fn recommend_charts<L>(
        &self,
        partial: &[Fact],
        data: &DataFrame,
        num: usize,
        labeler: L,
    ) -> Result<IndexMap<String, Recommendation>>
    where
        L: Fn(usize) -> String,
    {
        let mut recommendations = IndexMap::new();
        for (index, completion) in self
            .constraints
            .complete(partial, num)?
            .into_iter()
            .enumerate()
        {
            let mut spec = spec_from_facts(&completion.answer_set);
            spec.ensure_view();
            let mut chart = self.validator.render(&spec, data)?;
            if chart.is_column_faceted() {
                chart.configure_view(FACET_PANEL_WIDTH, FACET_PANEL_HEIGHT);
            }
            let facts = spec_to_facts(&spec);
            recommendations.insert(
                labeler(index),
                Recommendation {
                    cost: completion.cost,
                    spec,
                    facts,
                    chart,
                },
            );
        }
        Ok(recommendations)
    }

    /// Cross-product path: every (mark, field, channel) combination extends
    /// the base fact set and is completed independently. The combined
    /// collection is sorted ascending by cost; lowest/highest track the
    /// strict extremes across the whole run (first seen wins ties).
    pub fn rank_generated(
        &self,
        base: &[Fact],
        marks: &[String],
        fields: &[String],
        channels: &[String],
        data: &DataFrame,
        num: usize,
    ) -> Result<RecommendationSet> {
        let mut root: Vec<Fact> = base.to_vec();
        root.push(Fact::entity("view", "root", "v0"));
        root.push(Fact::entity("mark", "v0", "m0"));

        let mut set = RecommendationSet::default();
        for (mark, field, channel) in iproduct!(marks, fields, channels) {
            let mut partial = root.clone();
            partial.push(Fact::attribute("mark", "type", "m0", mark));
            partial.push(Fact::entity("encoding", "m0", "e0"));
            partial.push(Fact::attribute("encoding", "field", "e0", field));
            partial.push(Fact::attribute("encoding", "channel", "e0", channel));
            let label = format!("CHART ({mark} | {field} | {channel})");
            let batch = self.recommend_charts(&partial, data, num, |_| label.clone())?;
            for (label, recommendation) in batch {
                if set
                    .lowest_cost
                    .as_ref()
                    .map_or(true, |(_, lowest)| recommendation.cost < lowest.cost)
                {
                    set.lowest_cost = Some((label.clone(), recommendation.clone()));
                }
                if set
                    .highest_cost
                    .as_ref()
                    .map_or(true, |(_, highest)| recommendation.cost > highest.cost)
                {
                    set.highest_cost = Some((label.clone(), recommendation.clone()));
                }
                set.recommendations.insert(label, recommendation);
            }
        }
        set.recommendations
            .sort_by(|_, a, _, b| a.cost.total_cmp(&b.cost));
        Ok(set)
    }
}
