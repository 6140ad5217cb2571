pub mod errors;
pub mod naming;

pub use errors::{ExitMapping, TestgenError, TestgenErrorCategory, TestgenResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

pub const SAMPLE_SET_EXTENSION: &str = ".json";
pub const GRAPH_SUFFIX: &str = "_graph.json";
pub const CIRCUIT_SUFFIX: &str = "_regex.nr";
const PASS_INFIX: &str = "_pass_";
const FIXTURE_EXTENSION: &str = ".json";

/// A named regex/automaton unit. Every artifact of the pipeline is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    pub fn new(name: impl Into<String>) -> TestgenResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TestgenError::input_validation(
                "INPUT.TEMPLATE_NAME",
                "template name must not be empty",
            ));
        }
        if name.contains(['/', '\\']) || name.chars().any(char::is_whitespace) {
            return Err(TestgenError::input_validation(
                "INPUT.TEMPLATE_NAME",
                format!("template name '{}' must be a single file-name token", name),
            ));
        }
        Ok(Self(name))
    }

    /// `simple.json` -> `simple`.
    pub fn from_sample_file_name(file_name: &str) -> Option<Self> {
        file_name
            .strip_suffix(SAMPLE_SET_EXTENSION)
            .and_then(|stem| Self::new(stem).ok())
    }

    /// `simple_regex.nr` -> `simple`.
    pub fn from_circuit_file_name(file_name: &str) -> Option<Self> {
        file_name
            .strip_suffix(CIRCUIT_SUFFIX)
            .and_then(|stem| Self::new(stem).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn sample_file_name(&self) -> String {
        format!("{}{}", self.0, SAMPLE_SET_EXTENSION)
    }

    pub fn graph_file_name(&self) -> String {
        format!("{}{}", self.0, GRAPH_SUFFIX)
    }

    pub fn circuit_file_name(&self) -> String {
        format!("{}{}", self.0, CIRCUIT_SUFFIX)
    }

    pub fn pass_fixture_file_name(&self, index: usize) -> String {
        format!("{}{}{}{}", self.0, PASS_INFIX, index, FIXTURE_EXTENSION)
    }

    pub fn fail_temp_file_name(&self, index: usize) -> String {
        format!("{}_fail_{}_temp.json", self.0, index)
    }

    pub fn unexpected_success_file_name(&self, index: usize) -> String {
        format!("{}_fail_{}_unexpected_success.json", self.0, index)
    }

    pub fn test_function_name(&self, index: usize) -> String {
        format!("test_{}_pass_{}", self.0, index)
    }

    /// Index of a pass fixture owned by this template, if `file_name` is one.
    ///
    /// The match is on the full `<template>_pass_` prefix followed by digits only,
    /// so `email` never claims `email_addr_pass_0.json`.
    pub fn pass_fixture_index(&self, file_name: &str) -> Option<usize> {
        let digits = file_name
            .strip_prefix(self.0.as_str())?
            .strip_prefix(PASS_INFIX)?
            .strip_suffix(FIXTURE_EXTENSION)?;
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Curated haystacks for one template.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SampleSet {
    #[serde(default)]
    pub pass: Vec<String>,
    #[serde(default)]
    pub fail: Vec<String>,
}

impl SampleSet {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn load(path: &Path) -> TestgenResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            TestgenError::io_system(
                "IO.SAMPLE_READ",
                format!("failed to read sample set '{}': {}", path.display(), source),
            )
        })?;
        Self::from_json(&content).map_err(|source| {
            TestgenError::parse(
                "PARSE.SAMPLE_SET",
                format!("failed to parse sample set '{}': {}", path.display(), source),
            )
        })
    }

    /// Non-empty pass haystacks with their original indices.
    pub fn pass_cases(&self) -> impl Iterator<Item = (usize, &str)> {
        non_empty_cases(&self.pass)
    }

    /// Non-empty fail haystacks with their original indices.
    pub fn fail_cases(&self) -> impl Iterator<Item = (usize, &str)> {
        non_empty_cases(&self.fail)
    }
}

fn non_empty_cases(haystacks: &[String]) -> impl Iterator<Item = (usize, &str)> {
    haystacks
        .iter()
        .enumerate()
        .filter(|(_, haystack)| !haystack.is_empty())
        .map(|(index, haystack)| (index, haystack.as_str()))
}

/// One accepted match as written by the oracle.
///
/// Every field defaults when absent so older or partial fixtures still load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Fixture {
    #[serde(default)]
    pub in_haystack: Vec<u64>,
    #[serde(default)]
    pub match_start: u64,
    #[serde(default)]
    pub match_length: u64,
    #[serde(default)]
    pub curr_states: Vec<u64>,
    #[serde(default)]
    pub next_states: Vec<u64>,
    #[serde(default)]
    pub capture_group_ids: Vec<Vec<u64>>,
    #[serde(default)]
    pub capture_group_starts: Vec<Vec<u64>>,
    #[serde(default)]
    pub capture_group_start_indices: Option<Vec<u64>>,
}

impl Fixture {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn load(path: &Path) -> TestgenResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            TestgenError::io_system(
                "IO.FIXTURE_READ",
                format!("failed to read fixture '{}': {}", path.display(), source),
            )
        })?;
        Self::from_json(&content).map_err(|source| {
            TestgenError::parse(
                "PARSE.FIXTURE",
                format!("failed to parse fixture '{}': {}", path.display(), source),
            )
        })
    }
}

/// A fail haystack the oracle accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnexpectedSuccess {
    pub template: Template,
    pub fail_index: usize,
    pub haystack: String,
    pub retained_path: Option<PathBuf>,
}

impl Display for UnexpectedSuccess {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Template: {}, Fail Case Index: {}, Haystack: {:?}",
            self.template, self.fail_index, self.haystack
        )
    }
}
