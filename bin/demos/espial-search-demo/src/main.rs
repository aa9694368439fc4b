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

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use espial::{
    ChartLayout, ChartSpecification, Completion, ConstraintOracle, ExperimentSink, ExtraMode, Fact,
    OracleError, ParameterDomain, ProblemCounter, RecommendationRanker, RenderFailure,
    RenderedChart, SearchConfig, SearchLoop, SinkError, TrialRecord, ValidationOracle,
};
use polars::prelude::DataFrame;
use tracing::info;

/// Toy renderer: rejects duplicate channels and encodings that reference
/// unknown fields, accepts everything else. A chart with three or more
/// encodings is treated as column-faceted.
struct DemoRenderer;

impl ValidationOracle for DemoRenderer {
    fn render(
        &self,
        spec: &ChartSpecification,
        data: &DataFrame,
    ) -> Result<RenderedChart, RenderFailure> {
        let known: HashSet<String> = data
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut seen = HashSet::new();
        for encoding in spec.encodings() {
            if !seen.insert(encoding.channel.clone()) {
                return Err(RenderFailure::SchemaValidation {
                    reason: format!("channel '{}' mapped twice", encoding.channel),
                });
            }
            if !known.contains(&encoding.field) {
                return Err(RenderFailure::SchemaValidation {
                    reason: format!("unknown field '{}'", encoding.field),
                });
            }
        }
        let layout = if spec.encodings().count() >= 3 {
            ChartLayout::ColumnFacet { columns: 3 }
        } else {
            ChartLayout::Single
        };
        Ok(RenderedChart::new(layout, serde_json::to_value(spec)?))
    }
}

/// Toy rule engine over the fact encoding: two hard rules, two weighted
/// preferences, and completions that pair the partial's encoding with a
/// linear scale at increasing cost.
struct DemoRules;

fn channels(facts: &[Fact]) -> Vec<&str> {
    facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::Attribute {
                entity,
                property,
                value,
                ..
            } if entity == "encoding" && property == "channel" => Some(value.as_str()),
            _ => None,
        })
        .collect()
}

fn mark_type(facts: &[Fact]) -> Option<&str> {
    facts.iter().find_map(|fact| match fact {
        Fact::Attribute {
            entity,
            property,
            value,
            ..
        } if entity == "mark" && property == "type" => Some(value.as_str()),
        _ => None,
    })
}

impl ConstraintOracle for DemoRules {
    fn violations(&self, facts: &[Fact]) -> Result<Vec<String>, OracleError> {
        let mut hard = Vec::new();
        let channels = channels(facts);
        if mark_type(facts) == Some("bar") && !channels.contains(&"x") {
            hard.push("bar_without_x".to_string());
        }
        let aggregated = facts.iter().any(|fact| {
            matches!(fact, Fact::Attribute { entity, property, .. }
                if entity == "encoding" && property == "aggregate")
        });
        if aggregated && channels.len() < 2 {
            hard.push("aggregate_without_grouping".to_string());
        }
        Ok(hard)
    }

    fn preferences(&self, facts: &[Fact]) -> Result<HashMap<String, u32>, OracleError> {
        let mut soft = HashMap::new();
        let linear_scales = facts
            .iter()
            .filter(|fact| {
                matches!(fact, Fact::Attribute { entity, property, value, .. }
                    if entity == "scale" && property == "type" && value == "linear")
            })
            .count() as u32;
        if linear_scales > 0 {
            soft.insert("linear_scale".to_string(), linear_scales);
        }
        soft.insert("encoding_count".to_string(), channels(facts).len() as u32);
        Ok(soft)
    }

    fn complete(&self, partial: &[Fact], num: usize) -> Result<Vec<Completion>, OracleError> {
        let channel = channels(partial).first().copied().unwrap_or("x").to_string();
        Ok((0..num)
            .map(|index| {
                let mut answer_set = partial.to_vec();
                let scale_id = format!("s{index}");
                answer_set.push(Fact::entity("scale", "v0", &scale_id));
                answer_set.push(Fact::attribute("scale", "channel", &scale_id, &channel));
                answer_set.push(Fact::attribute("scale", "type", &scale_id, "linear"));
                Completion {
                    cost: 1.0 + index as f64,
                    answer_set,
                }
            })
            .collect())
    }
}

struct LogSink;

impl ExperimentSink for LogSink {
    fn record(&mut self, record: &TrialRecord) -> Result<(), SinkError> {
        tracing::debug!(
            iteration = record.iteration,
            label = %record.counter_label,
            active = record.active_problems,
            "tracking tick"
        );
        Ok(())
    }
}

fn sales_frame() -> Result<DataFrame> {
    Ok(polars::df!(
        "revenue" => &[12.5f64, 18.0, 7.25, 31.0, 22.5, 9.75],
        "units" => &[3i64, 5, 2, 9, 6, 3],
        "region" => &["north", "south", "north", "east", "south", "west"],
    )?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let frame = sales_frame()?;
    let domain = ParameterDomain {
        fields: vec!["revenue".into(), "units".into(), "region".into()],
        channels: vec!["x".into(), "y".into(), "color".into()],
        scales: vec!["linear".into(), "ordinal".into()],
        marks: vec!["bar".into(), "point".into(), "line".into()],
        extras: vec![ExtraMode::Aggregate, ExtraMode::Stack, ExtraMode::None],
        aggregates: vec!["mean".into(), "sum".into(), "count".into()],
        stacks: vec!["zero".into(), "normalize".into()],
    };
    domain.validate()?;

    let renderer = DemoRenderer;
    let rules = DemoRules;
    let mut counter = ProblemCounter::from_names([
        "bar_without_x",
        "aggregate_without_grouping",
        "linear_scale",
        "encoding_count",
    ]);
    let mut sink = LogSink;
    let config = SearchConfig {
        num_runs: 200,
        encoding_counts: vec![2, 3],
    };
    let report = SearchLoop::new(&domain, config, &renderer, &rules)
        .with_sink(&mut sink)
        .run(&frame, &mut counter)?;

    info!(
        accepted = report.results.len(),
        discarded = report.discards.len(),
        "search finished"
    );
    for (name, count) in counter.counts() {
        info!(problem = %name, count, "problem tally");
    }

    let ranker = RecommendationRanker::new(&rules, &renderer);
    let set = ranker.rank_generated(
        &[],
        &["bar".into(), "point".into()],
        &["revenue".into(), "region".into()],
        &["x".into(), "y".into()],
        &frame,
        2,
    )?;
    for (label, recommendation) in &set.recommendations {
        info!(%label, cost = recommendation.cost, "recommendation");
    }
    if let Some((label, recommendation)) = &set.lowest_cost {
        info!(%label, cost = recommendation.cost, "lowest cost");
    }
    if let Some((label, recommendation)) = &set.highest_cost {
        info!(%label, cost = recommendation.cost, "highest cost");
    }
    Ok(())
}
