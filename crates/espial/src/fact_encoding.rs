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
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::chart_spec::{
    ChartSpecification, CoordinateSystem, EncodingExtra, EncodingSpec, MarkSpec, ScaleSpec,
    ViewSpec,
};
use crate::data_schema::{FieldMetadata, FieldType};

#[derive(Debug, Error)]
pub enum FactError {
    #[error("unrecognised fact: '{0}'")]
    Unrecognised(String),
    #[error("malformed {form} fact: '{text}'")]
    Malformed { form: &'static str, text: String },
}

/// Flattened rule-engine encoding of a specification. Values are carried
/// verbatim; quoting discipline belongs to the solver adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fact {
    Entity {
        kind: String,
        parent: String,
        id: String,
    },
    Attribute {
        entity: String,
        property: String,
        id: String,
        value: String,
    },
    Global {
        property: String,
        value: String,
    },
}

impl Fact {
    pub fn entity(
        kind: impl Into<String>,
        parent: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Fact::Entity {
            kind: kind.into(),
            parent: parent.into(),
            id: id.into(),
        }
    }
    pub fn attribute(
        entity: impl Into<String>,
        property: impl Into<String>,
        id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Fact::Attribute {
            entity: entity.into(),
            property: property.into(),
            id: id.into(),
            value: value.into(),
        }
    }
    pub fn global(property: impl Into<String>, value: impl Into<String>) -> Self {
        Fact::Global {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Entity { kind, parent, id } => write!(f, "entity({kind},{parent},{id})."),
            Fact::Attribute {
                entity,
                property,
                id,
                value,
            } => write!(f, "attribute(({entity},{property}),{id},{value})."),
            Fact::Global { property, value } => write!(f, "attribute({property},root,{value})."),
        }
    }
}

impl FromStr for Fact {
    type Err = FactError;

    fn from_str(s: &str) -> Result<Self, FactError> {
        let text = s.trim();
        let text = text.strip_suffix('.').unwrap_or(text);
        if let Some(inner) = text.strip_prefix("entity(").and_then(|t| t.strip_suffix(')')) {
            let mut parts = inner.splitn(3, ',');
            return match (parts.next(), parts.next(), parts.next()) {
                (Some(kind), Some(parent), Some(id)) => {
                    Ok(Fact::entity(kind.trim(), parent.trim(), id.trim()))
                }
                _ => Err(FactError::Malformed {
                    form: "entity",
                    text: s.to_string(),
                }),
            };
        }
        if let Some(inner) = text
            .strip_prefix("attribute((")
            .and_then(|t| t.strip_suffix(')'))
        {
            let malformed = || FactError::Malformed {
                form: "attribute",
                text: s.to_string(),
            };
            let (path, rest) = inner.split_once(')').ok_or_else(malformed)?;
            let (entity, property) = path.split_once(',').ok_or_else(malformed)?;
            let rest = rest.strip_prefix(',').ok_or_else(malformed)?;
            let (id, value) = rest.split_once(',').ok_or_else(malformed)?;
            return Ok(Fact::attribute(
                entity.trim(),
                property.trim(),
                id.trim(),
                value.trim(),
            ));
        }
        if let Some(inner) = text
            .strip_prefix("attribute(")
            .and_then(|t| t.strip_suffix(')'))
        {
            let mut parts = inner.splitn(3, ',');
            return match (parts.next(), parts.next(), parts.next()) {
                (Some(property), Some(id), Some(value)) if id.trim() == "root" => {
                    Ok(Fact::global(property.trim(), value.trim()))
                }
                _ => Err(FactError::Malformed {
                    form: "global attribute",
                    text: s.to_string(),
                }),
            };
        }
        Err(FactError::Unrecognised(s.to_string()))
    }
}

impl Serialize for Fact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

pub fn spec_to_facts(spec: &ChartSpecification) -> Vec<Fact> {
    let mut facts = Vec::new();
    let mut mark_seq = 0usize;
    let mut encoding_seq = 0usize;
    let mut scale_seq = 0usize;
    for (view_idx, view) in spec.view.iter().enumerate() {
        let view_id = format!("v{view_idx}");
        facts.push(Fact::entity("view", "root", &view_id));
        if view.coordinates == Some(CoordinateSystem::Polar) {
            facts.push(Fact::attribute("view", "coordinates", &view_id, "polar"));
        }
        for mark in &view.mark {
            let mark_id = format!("m{mark_seq}");
            mark_seq += 1;
            facts.push(Fact::entity("mark", &view_id, &mark_id));
            facts.push(Fact::attribute("mark", "type", &mark_id, &mark.mark_type));
            for encoding in &mark.encoding {
                let encoding_id = format!("e{encoding_seq}");
                encoding_seq += 1;
                facts.push(Fact::entity("encoding", &mark_id, &encoding_id));
                facts.push(Fact::attribute(
                    "encoding",
                    "field",
                    &encoding_id,
                    &encoding.field,
                ));
                facts.push(Fact::attribute(
                    "encoding",
                    "channel",
                    &encoding_id,
                    &encoding.channel,
                ));
                match &encoding.extra {
                    Some(EncodingExtra::Aggregate(name)) => {
                        facts.push(Fact::attribute("encoding", "aggregate", &encoding_id, name));
                    }
                    Some(EncodingExtra::Stack(mode)) => {
                        facts.push(Fact::attribute("encoding", "stack", &encoding_id, mode));
                    }
                    None => {}
                }
            }
        }
        for scale in &view.scale {
            let scale_id = format!("s{scale_seq}");
            scale_seq += 1;
            facts.push(Fact::entity("scale", &view_id, &scale_id));
            facts.push(Fact::attribute("scale", "channel", &scale_id, &scale.channel));
            facts.push(Fact::attribute("scale", "type", &scale_id, &scale.scale_type));
            if scale.zero == Some(true) {
                facts.push(Fact::attribute("scale", "zero", &scale_id, "true"));
            }
        }
    }
    if let Some(rows) = spec.number_rows {
        facts.push(Fact::global("number_rows", rows.to_string()));
    }
    for (field_idx, field) in spec.field.iter().enumerate() {
        let field_id = format!("f{field_idx}");
        facts.push(Fact::entity("field", "root", &field_id));
        facts.push(Fact::attribute("field", "name", &field_id, &field.name));
        facts.push(Fact::attribute(
            "field",
            "type",
            &field_id,
            field.field_type.as_str(),
        ));
        facts.push(Fact::attribute(
            "field",
            "unique",
            &field_id,
            field.unique.to_string(),
        ));
        if let Some(min) = field.min {
            facts.push(Fact::attribute("field", "min", &field_id, min.to_string()));
        }
        if let Some(max) = field.max {
            facts.push(Fact::attribute("field", "max", &field_id, max.to_string()));
        }
        if let Some(std) = field.std {
            facts.push(Fact::attribute("field", "std", &field_id, std.to_string()));
        }
    }
    facts
}

type AttrTable<'a> = HashMap<&'a str, Vec<(&'a str, &'a str, &'a str)>>;

fn attr<'a>(attrs: &AttrTable<'a>, id: &str, entity: &str, property: &str) -> Option<&'a str> {
    attrs.get(id).and_then(|entries| {
        entries
            .iter()
            .find(|(e, p, _)| *e == entity && *p == property)
            .map(|(_, _, value)| *value)
    })
}

/// Rebuild a specification from an answer set. Atoms outside the modelled
/// entity/attribute vocabulary are ignored; solver answer sets carry more
/// than the specification shape.
pub fn spec_from_facts(facts: &[Fact]) -> ChartSpecification {
    let mut attrs: AttrTable<'_> = HashMap::new();
    for fact in facts {
        if let Fact::Attribute {
            entity,
            property,
            id,
            value,
        } = fact
        {
            attrs
                .entry(id.as_str())
                .or_default()
                .push((entity.as_str(), property.as_str(), value.as_str()));
        }
    }

    let mut views: IndexMap<&str, ViewSpec> = IndexMap::new();
    let mut marks: IndexMap<&str, (&str, MarkSpec)> = IndexMap::new();
    let mut fields: Vec<FieldMetadata> = Vec::new();
    let mut number_rows = None;

    for fact in facts {
        match fact {
            Fact::Entity { kind, parent, id } => match kind.as_str() {
                "view" => {
                    views.insert(
                        id.as_str(),
                        ViewSpec {
                            coordinates: (attr(&attrs, id, "view", "coordinates") == Some("polar"))
                                .then_some(CoordinateSystem::Polar),
                            ..ViewSpec::default()
                        },
                    );
                }
                "mark" => {
                    marks.insert(
                        id.as_str(),
                        (
                            parent.as_str(),
                            MarkSpec {
                                mark_type: attr(&attrs, id, "mark", "type").unwrap_or_default().to_string(),
                                encoding: Vec::new(),
                            },
                        ),
                    );
                }
                "encoding" => {
                    if let Some((_, mark)) = marks.get_mut(parent.as_str()) {
                        let extra = attr(&attrs, id, "encoding", "aggregate")
                            .map(|name| EncodingExtra::Aggregate(name.to_string()))
                            .or_else(|| {
                                attr(&attrs, id, "encoding", "stack")
                                    .map(|mode| EncodingExtra::Stack(mode.to_string()))
                            });
                        mark.encoding.push(EncodingSpec {
                            channel: attr(&attrs, id, "encoding", "channel").unwrap_or_default().to_string(),
                            field: attr(&attrs, id, "encoding", "field").unwrap_or_default().to_string(),
                            extra,
                        });
                    }
                }
                "scale" => {
                    if let Some(view) = views.get_mut(parent.as_str()) {
                        view.scale.push(ScaleSpec {
                            channel: attr(&attrs, id, "scale", "channel").unwrap_or_default().to_string(),
                            scale_type: attr(&attrs, id, "scale", "type").unwrap_or_default().to_string(),
                            zero: (attr(&attrs, id, "scale", "zero") == Some("true")).then_some(true),
                        });
                    }
                }
                "field" => {
                    fields.push(FieldMetadata {
                        name: attr(&attrs, id, "field", "name").unwrap_or_default().to_string(),
                        field_type: FieldType::parse(attr(&attrs, id, "field", "type").unwrap_or("string")),
                        unique: attr(&attrs, id, "field", "unique")
                            .and_then(|value| value.parse().ok())
                            .unwrap_or(0),
                        min: attr(&attrs, id, "field", "min").and_then(|value| value.parse().ok()),
                        max: attr(&attrs, id, "field", "max").and_then(|value| value.parse().ok()),
                        std: attr(&attrs, id, "field", "std").and_then(|value| value.parse().ok()),
                    });
                }
                _ => {}
            },
            Fact::Global { property, value } => {
                if property == "number_rows" {
                    number_rows = value.parse().ok();
                }
            }
            Fact::Attribute { .. } => {}
        }
    }

    for (mark_id, (parent, _)) in &marks {
        if !views.contains_key(parent) {
            tracing::debug!(mark = %mark_id, parent = %parent, "mark attached to unknown view; dropped");
        }
    }
    let mut spec = ChartSpecification {
        view: Vec::with_capacity(views.len()),
        number_rows,
        field: fields,
    };
    for (view_id, mut view) in views {
        for (_, (parent, mark)) in &marks {
            if *parent == view_id {
                view.mark.push(mark.clone());
            }
        }
        spec.view.push(view);
    }
    spec
}
