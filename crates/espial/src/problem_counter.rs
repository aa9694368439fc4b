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
use serde::{Deserialize, Serialize};

/// Caller-owned accumulator over named problems. Only names seeded at
/// construction are tracked; everything else reported by the oracles is
/// ignored. Never reset internally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemCounter {
    counts: IndexMap<String, u64>,
}

impl ProblemCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            counts: names.into_iter().map(|name| (name.into(), 0)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn tracks(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.counts.get(name).copied()
    }

    /// Hard violations count occurrences: one per report.
    pub fn record_hard(&mut self, name: &str) -> bool {
        match self.counts.get_mut(name) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    /// Soft preferences accumulate their reported weight.
    pub fn record_soft(&mut self, name: &str, weight: u32) -> bool {
        match self.counts.get_mut(name) {
            Some(count) => {
                *count += u64::from(weight);
                true
            }
            None => false,
        }
    }

    pub fn active_problems(&self) -> usize {
        self.counts.values().filter(|&&count| count > 0).count()
    }

    pub fn counts(&self) -> &IndexMap<String, u64> {
        &self.counts
    }

    pub fn into_counts(self) -> IndexMap<String, u64> {
        self.counts
    }
}
