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

use thiserror::Error;

use crate::data_schema::SchemaError;
use crate::fact_encoding::FactError;
use crate::oracle::{OracleError, RenderFailure};

#[derive(Error, Debug)]
pub enum SpecSearchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("schema inference error: {0}")]
    Schema(#[from] SchemaError),
    #[error("fact encoding error: {0}")]
    Facts(#[from] FactError),
    #[error("render failure: {0}")]
    Render(#[from] RenderFailure),
    #[error("constraint oracle error: {0}")]
    Oracle(#[from] OracleError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("problem counter must be seeded with at least one problem name")]
    EmptyProblemSet,
    #[error("invalid search configuration: {field} is out of range")]
    InvalidSearchConfig { field: String },
    #[error("parameter pool '{pool}' is empty")]
    EmptyPool { pool: String },
}

pub type Result<T> = std::result::Result<T, SpecSearchError>;
