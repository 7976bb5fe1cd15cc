//! Output shapes for a list of [`DiffRecord`]s.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::engine::DiffRecord;

/// How a caller wants diff output arranged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiffFormat {
    /// The record list as produced.
    #[default]
    Records,
    /// Path to rendered body.
    ByPath,
    /// One unified-diff text for the whole comparison.
    Classic,
}

impl FromStr for DiffFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "records" => Ok(Self::Records),
            "by-path" | "bypath" => Ok(Self::ByPath),
            "classic" => Ok(Self::Classic),
            other => Err(format!("unknown diff format '{other}' (expected records, by-path or classic)")),
        }
    }
}

/// Diff records arranged per [`DiffFormat`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffOutput {
    Records(Vec<DiffRecord>),
    ByPath(BTreeMap<String, String>),
    Classic(String),
}

impl DiffOutput {
    pub fn new(records: Vec<DiffRecord>, format: DiffFormat) -> Self {
        match format {
            DiffFormat::Records => Self::Records(records),
            DiffFormat::ByPath => Self::ByPath(
                records
                    .into_iter()
                    .map(|r| {
                        let body = r.body.as_str().to_string();
                        (r.path, body)
                    })
                    .collect(),
            ),
            DiffFormat::Classic => Self::Classic(records.iter().map(|r| r.body.as_str()).collect()),
        }
    }

    /// Returns `true` if nothing differs.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Records(records) => records.is_empty(),
            Self::ByPath(map) => map.is_empty(),
            Self::Classic(text) => text.is_empty(),
        }
    }

    /// Plain-text rendering.
    pub fn render(&self) -> String {
        match self {
            Self::Records(records) => records
                .iter()
                .map(|r| format!("{} {}\n{}", r.change_type, r.path, r.body.as_str()))
                .collect(),
            Self::ByPath(map) => map
                .iter()
                .map(|(path, body)| format!("{path}:\n{body}"))
                .collect(),
            Self::Classic(text) => text.clone(),
        }
    }
}
