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

use crate::chart_spec::{
    ChartSpecification, CoordinateSystem, EncodingExtra, EncodingSpec, MarkSpec, ScaleSpec,
    ViewSpec,
};
use crate::error::ConfigError;

/// Value pools candidates are drawn from. Supplied once per run and
/// read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDomain {
    pub fields: Vec<String>,
    pub channels: Vec<String>,
    pub scales: Vec<String>,
    pub marks: Vec<String>,
    pub extras: Vec<ExtraMode>,
    pub aggregates: Vec<String>,
    pub stacks: Vec<String>,
}

impl ParameterDomain {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pools = [
            ("fields", self.fields.len()),
            ("channels", self.channels.len()),
            ("scales", self.scales.len()),
            ("marks", self.marks.len()),
            ("extras", self.extras.len()),
            ("aggregates", self.aggregates.len()),
            ("stacks", self.stacks.len()),
        ];
        for (pool, len) in pools {
            if len == 0 {
                return Err(ConfigError::EmptyPool {
                    pool: pool.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraMode {
    Aggregate,
    Stack,
    None,
}

/// Ordered selection for one candidate: field i pairs with channel i and
/// scale type i. Zips truncate to the shortest list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateParams {
    pub fields: Vec<String>,
    pub channels: Vec<String>,
    pub scales: Vec<String>,
    pub mark: String,
    pub extra: ExtraMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default)]
    pub use_polar: bool,
}

/// Record-shaped candidate with `num_of_encoding` bounding how many of the
/// pooled values are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    pub num_of_encoding: usize,
    pub fields: Vec<String>,
    pub channels: Vec<String>,
    pub scales: Vec<String>,
    pub mark: String,
    pub extra: ExtraMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default)]
    pub use_polar: bool,
}

pub fn build_spec(params: &CandidateParams) -> ChartSpecification {
    assemble(
        params
            .fields
            .iter()
            .zip(&params.channels)
            .zip(&params.scales)
            .map(|((field, channel), scale)| (field.as_str(), channel.as_str(), scale.as_str())),
        &params.mark,
        params.extra,
        params.aggregate.as_deref(),
        params.stack.as_deref(),
        params.use_polar,
    )
}

pub fn build_spec_from_vector(vector: &ParameterVector) -> ChartSpecification {
    let n = vector.num_of_encoding;
    assemble(
        vector
            .fields
            .iter()
            .take(n)
            .zip(vector.channels.iter().take(n))
            .zip(vector.scales.iter().take(n))
            .map(|((field, channel), scale)| (field.as_str(), channel.as_str(), scale.as_str())),
        &vector.mark,
        vector.extra,
        vector.aggregate.as_deref(),
        vector.stack.as_deref(),
        vector.use_polar,
    )
}

fn assemble<'a>(
    triples: impl Iterator<Item = (&'a str, &'a str, &'a str)>,
    mark: &str,
    extra: ExtraMode,
    aggregate: Option<&str>,
    stack: Option<&str>,
    use_polar: bool,
) -> ChartSpecification {
    let mut encodings = Vec::new();
    let mut scales = Vec::new();
    for (index, (field, channel, scale)) in triples.enumerate() {
        let mut encoding = EncodingSpec::new(channel, field);
        // The extra rides on the first encoding only.
        if index == 0 {
            encoding.extra = match extra {
                ExtraMode::Aggregate => {
                    aggregate.map(|name| EncodingExtra::Aggregate(name.to_string()))
                }
                ExtraMode::Stack => stack.map(|mode| EncodingExtra::Stack(mode.to_string())),
                ExtraMode::None => None,
            };
        }
        encodings.push(encoding);
        scales.push(ScaleSpec {
            channel: channel.to_string(),
            scale_type: scale.to_string(),
            zero: (scale == "linear" && channel == "y").then_some(true),
        });
    }
    ChartSpecification::single_view(ViewSpec {
        mark: vec![MarkSpec {
            mark_type: mark.to_string(),
            encoding: encodings,
        }],
        scale: scales,
        coordinates: use_polar.then_some(CoordinateSystem::Polar),
    })
}
