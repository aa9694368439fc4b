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

use espial::{
    build_spec, build_spec_from_vector, CandidateParams, CoordinateSystem, ExtraMode,
    ParameterVector,
};
use proptest::prelude::*;
use serde_json::json;

fn bar_params() -> CandidateParams {
    CandidateParams {
        fields: vec!["price".into(), "category".into()],
        channels: vec!["x".into(), "y".into()],
        scales: vec!["linear".into(), "ordinal".into()],
        mark: "bar".into(),
        extra: ExtraMode::Aggregate,
        aggregate: Some("mean".into()),
        stack: Some("zero".into()),
        use_polar: false,
    }
}

#[test]
fn builds_the_canonical_aggregated_bar() {
    let spec = build_spec(&bar_params());
    let value = serde_json::to_value(&spec).unwrap();
    assert_eq!(
        value,
        json!({
            "view": [{
                "mark": [{
                    "type": "bar",
                    "encoding": [
                        { "channel": "x", "field": "price", "aggregate": "mean" },
                        { "channel": "y", "field": "category" }
                    ]
                }],
                "scale": [
                    { "channel": "x", "type": "linear" },
                    { "channel": "y", "type": "ordinal" }
                ]
            }]
        })
    );
}

#[test]
fn extra_rides_only_on_the_first_encoding() {
    let mut params = bar_params();
    params.extra = ExtraMode::Stack;
    let spec = build_spec(&params);
    let encodings: Vec<_> = spec.encodings().collect();
    assert_eq!(encodings[0].stack(), Some("zero"));
    assert_eq!(encodings[0].aggregate(), None);
    for encoding in &encodings[1..] {
        assert!(encoding.extra.is_none());
    }
}

#[test]
fn extra_mode_none_attaches_nothing() {
    let mut params = bar_params();
    params.extra = ExtraMode::None;
    let spec = build_spec(&params);
    assert!(spec.encodings().all(|encoding| encoding.extra.is_none()));
}

#[test]
fn missing_extra_parameter_is_skipped() {
    let mut params = bar_params();
    params.aggregate = None;
    let spec = build_spec(&params);
    assert!(spec.encodings().all(|encoding| encoding.extra.is_none()));
}

#[test]
fn zero_is_set_exactly_on_linear_y() {
    let mut params = bar_params();
    params.channels = vec!["x".into(), "y".into()];
    params.scales = vec!["linear".into(), "linear".into()];
    let spec = build_spec(&params);
    let scales: Vec<_> = spec.scales().collect();
    assert_eq!(scales[0].zero, None);
    assert_eq!(scales[1].zero, Some(true));

    params.scales = vec!["ordinal".into(), "ordinal".into()];
    let spec = build_spec(&params);
    assert!(spec.scales().all(|scale| scale.zero.is_none()));
}

#[test]
fn polar_flag_lands_on_the_view() {
    let mut params = bar_params();
    params.use_polar = true;
    let spec = build_spec(&params);
    assert_eq!(spec.view[0].coordinates, Some(CoordinateSystem::Polar));
    let value = serde_json::to_value(&spec).unwrap();
    assert_eq!(value["view"][0]["coordinates"], json!("polar"));

    let spec = build_spec(&bar_params());
    assert_eq!(spec.view[0].coordinates, None);
}

#[test]
fn zips_truncate_to_the_shortest_list() {
    let mut params = bar_params();
    params.scales = vec!["linear".into()];
    let spec = build_spec(&params);
    assert_eq!(spec.encodings().count(), 1);
    assert_eq!(spec.scales().count(), 1);
}

#[test]
fn vector_form_matches_tuple_form() {
    let tuple = bar_params();
    let vector = ParameterVector {
        num_of_encoding: 2,
        fields: vec!["price".into(), "category".into(), "stock".into()],
        channels: vec!["x".into(), "y".into(), "color".into()],
        scales: vec!["linear".into(), "ordinal".into(), "linear".into()],
        mark: "bar".into(),
        extra: ExtraMode::Aggregate,
        aggregate: Some("mean".into()),
        stack: Some("zero".into()),
        use_polar: false,
    };
    assert_eq!(build_spec(&tuple), build_spec_from_vector(&vector));
}

proptest! {
    #[test]
    fn tuple_and_vector_forms_agree(
        num in 1usize..=3,
        fields in prop::collection::vec("[a-z]{1,8}", 3),
        channels in prop::collection::vec("[a-z]{1,5}", 3),
        scales in prop::collection::vec("[a-z]{3,8}", 3),
        mark in "[a-z]{3,6}",
        extra_sel in 0usize..3,
        aggregate in "[a-z]{3,6}",
        stack in "[a-z]{3,6}",
        use_polar in any::<bool>(),
    ) {
        let extra = [ExtraMode::Aggregate, ExtraMode::Stack, ExtraMode::None][extra_sel];
        let tuple = CandidateParams {
            fields: fields[..num].to_vec(),
            channels: channels[..num].to_vec(),
            scales: scales[..num].to_vec(),
            mark: mark.clone(),
            extra,
            aggregate: Some(aggregate.clone()),
            stack: Some(stack.clone()),
            use_polar,
        };
        let vector = ParameterVector {
            num_of_encoding: num,
            fields,
            channels,
            scales,
            mark,
            extra,
            aggregate: Some(aggregate),
            stack: Some(stack),
            use_polar,
        };
        prop_assert_eq!(build_spec(&tuple), build_spec_from_vector(&vector));
    }

    #[test]
    fn aggregate_and_stack_never_share_an_encoding(
        extra_sel in 0usize..3,
        aggregate in "[a-z]{3,6}",
        stack in "[a-z]{3,6}",
    ) {
        let extra = [ExtraMode::Aggregate, ExtraMode::Stack, ExtraMode::None][extra_sel];
        let mut params = bar_params();
        params.extra = extra;
        params.aggregate = Some(aggregate);
        params.stack = Some(stack);
        let spec = build_spec(&params);
        for (index, encoding) in spec.encodings().enumerate() {
            let value = serde_json::to_value(encoding).unwrap();
            let object = value.as_object().unwrap();
            prop_assert!(!(object.contains_key("aggregate") && object.contains_key("stack")));
            if index > 0 {
                prop_assert!(!object.contains_key("aggregate"));
                prop_assert!(!object.contains_key("stack"));
            }
        }
    }
}
