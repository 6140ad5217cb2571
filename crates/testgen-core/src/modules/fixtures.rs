//! Fixture generation: runs the oracle over every curated haystack.
//!
//! Pass haystacks become `<template>_pass_<i>.json` fixtures. Fail haystacks
//! are evaluated into a temporary artifact that is discarded, unless the
//! oracle accepted it, in which case an [`UnexpectedSuccess`] is recorded.

use super::discovery::{SAMPLE_SET_GLOB, discover_files, file_name_str};
use super::traits::{Oracle, OracleOutcome, OracleRequest};
use crate::common::TestgenConfig;
use crate::domain::{SampleSet, Template, TestgenError, TestgenResult, UnexpectedSuccess};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub templates: Vec<TemplateGenerationReport>,
    pub unexpected_successes: Vec<UnexpectedSuccess>,
}

impl GenerationReport {
    pub fn generated_fixture_count(&self) -> usize {
        self.templates
            .iter()
            .flat_map(|template| &template.pass_cases)
            .filter(|case| matches!(case.outcome, PassOutcome::Generated { .. }))
            .count()
    }

    pub fn failed_pass_case_count(&self) -> usize {
        self.templates
            .iter()
            .flat_map(|template| &template.pass_cases)
            .filter(|case| matches!(case.outcome, PassOutcome::Failed { .. }))
            .count()
    }

    pub fn rejected_fail_case_count(&self) -> usize {
        self.templates
            .iter()
            .flat_map(|template| &template.fail_cases)
            .filter(|case| matches!(case.outcome, FailOutcome::Rejected { .. }))
            .count()
    }

    pub fn fail_case_error_count(&self) -> usize {
        self.templates
            .iter()
            .flat_map(|template| &template.fail_cases)
            .filter(|case| matches!(case.outcome, FailOutcome::Error { .. }))
            .count()
    }

    pub fn skipped_template_count(&self) -> usize {
        self.templates
            .iter()
            .filter(|template| template.skipped.is_some())
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateGenerationReport {
    pub template: String,
    pub sample_path: PathBuf,
    pub skipped: Option<String>,
    pub pass_cases: Vec<PassCaseReport>,
    pub fail_cases: Vec<FailCaseReport>,
}

impl TemplateGenerationReport {
    fn new(template: impl Into<String>, sample_path: &Path) -> Self {
        Self {
            template: template.into(),
            sample_path: sample_path.to_path_buf(),
            skipped: None,
            pass_cases: Vec::new(),
            fail_cases: Vec::new(),
        }
    }

    fn skipped(mut self, reason: String) -> Self {
        self.skipped = Some(reason);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassCaseReport {
    pub index: usize,
    pub outcome: PassOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    Generated { path: PathBuf },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailCaseReport {
    pub index: usize,
    pub outcome: FailOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FailOutcome {
    /// The oracle rejected the haystack, as expected.
    Rejected { reason: String },
    UnexpectedSuccess { retained: Option<PathBuf> },
    /// The oracle could not be run; says nothing about the haystack.
    Error { reason: String },
}

pub struct FixtureGenerator<'a, O> {
    config: &'a TestgenConfig,
    oracle: O,
}

impl<'a, O> FixtureGenerator<'a, O>
where
    O: Oracle,
{
    pub fn new(config: &'a TestgenConfig, oracle: O) -> Self {
        Self { config, oracle }
    }

    /// Generates fixtures for every sample set found in the sample directory.
    pub fn generate_all(&self) -> TestgenResult<GenerationReport> {
        let sample_dir = self.config.sample_haystacks_dir();
        let sample_files = discover_files(&sample_dir, SAMPLE_SET_GLOB)?;
        self.ensure_inputs_dir()?;

        let mut report = GenerationReport::default();
        for sample_path in sample_files {
            let Some(file_name) = file_name_str(&sample_path) else {
                continue;
            };
            match Template::from_sample_file_name(file_name) {
                Some(template) => self.generate_into(&template, &sample_path, &mut report),
                None => {
                    warn!(path = %sample_path.display(), "sample file name is not a template name");
                    report.templates.push(
                        TemplateGenerationReport::new(file_name, &sample_path)
                            .skipped("file name is not a valid template name".to_string()),
                    );
                }
            }
        }
        Ok(report)
    }

    /// Generates fixtures for one template's sample set.
    pub fn generate(&self, template: &Template) -> TestgenResult<GenerationReport> {
        self.ensure_inputs_dir()?;
        let sample_path = self
            .config
            .sample_haystacks_dir()
            .join(template.sample_file_name());
        let mut report = GenerationReport::default();
        self.generate_into(template, &sample_path, &mut report);
        Ok(report)
    }

    fn ensure_inputs_dir(&self) -> TestgenResult<()> {
        let inputs_dir = self.config.circuit_inputs_dir();
        fs::create_dir_all(&inputs_dir).map_err(|source| {
            TestgenError::io_system(
                "IO.INPUTS_DIR",
                format!(
                    "failed to create circuit inputs directory '{}': {}",
                    inputs_dir.display(),
                    source
                ),
            )
        })
    }

    fn generate_into(&self, template: &Template, sample_path: &Path, report: &mut GenerationReport) {
        let mut template_report = TemplateGenerationReport::new(template.as_str(), sample_path);
        info!(template = %template, "processing sample haystacks");

        let graph_path = self.config.graphs_dir().join(template.graph_file_name());
        if !graph_path.is_file() {
            let error = TestgenError::missing_dependency(
                "MISSING.GRAPH",
                format!("graph file not found at '{}'", graph_path.display()),
            );
            warn!(template = %template, "{}; skipping template", error.message());
            report
                .templates
                .push(template_report.skipped(error.message().to_string()));
            return;
        }

        let samples = match SampleSet::load(sample_path) {
            Ok(samples) => samples,
            Err(error) => {
                warn!(template = %template, "{}; skipping template", error.message());
                report
                    .templates
                    .push(template_report.skipped(error.message().to_string()));
                return;
            }
        };

        if samples.pass.is_empty() {
            info!(template = %template, "no pass cases found");
        }
        for (index, haystack) in samples.pass_cases() {
            let outcome = self.generate_pass_case(template, &graph_path, index, haystack);
            template_report.pass_cases.push(PassCaseReport { index, outcome });
        }

        if samples.fail.is_empty() {
            info!(template = %template, "no fail cases found");
        }
        for (index, haystack) in samples.fail_cases() {
            let outcome = self.probe_fail_case(template, &graph_path, index, haystack);
            if let FailOutcome::UnexpectedSuccess { retained } = &outcome {
                report.unexpected_successes.push(UnexpectedSuccess {
                    template: template.clone(),
                    fail_index: index,
                    haystack: haystack.to_string(),
                    retained_path: retained.clone(),
                });
            }
            template_report.fail_cases.push(FailCaseReport { index, outcome });
        }
        report.templates.push(template_report);
    }

    fn request(&self, graph_path: &Path, haystack: &str, output_path: PathBuf) -> OracleRequest {
        OracleRequest {
            graph_path: graph_path.to_path_buf(),
            haystack: haystack.to_string(),
            max_haystack_len: self.config.max_haystack_len,
            max_match_len: self.config.max_match_len,
            output_path,
        }
    }

    fn generate_pass_case(
        &self,
        template: &Template,
        graph_path: &Path,
        index: usize,
        haystack: &str,
    ) -> PassOutcome {
        let output_path = self
            .config
            .circuit_inputs_dir()
            .join(template.pass_fixture_file_name(index));
        let request = self.request(graph_path, haystack, output_path.clone());

        match self.oracle.generate_input(&request) {
            Ok(OracleOutcome::Accepted) => {
                info!(template = %template, index, path = %output_path.display(), "generated pass fixture");
                PassOutcome::Generated { path: output_path }
            }
            Ok(OracleOutcome::Rejected { reason }) => {
                warn!(template = %template, index, %reason, "oracle rejected pass case");
                PassOutcome::Failed { reason }
            }
            Err(error) => {
                error!(template = %template, index, "{}", error);
                PassOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        }
    }

    fn probe_fail_case(
        &self,
        template: &Template,
        graph_path: &Path,
        index: usize,
        haystack: &str,
    ) -> FailOutcome {
        let inputs_dir = self.config.circuit_inputs_dir();
        let temp_path = inputs_dir.join(template.fail_temp_file_name(index));
        remove_if_present(&temp_path);
        let request = self.request(graph_path, haystack, temp_path.clone());

        match self.oracle.generate_input(&request) {
            Ok(OracleOutcome::Rejected { reason }) => {
                info!(template = %template, index, "fail case rejected as expected");
                remove_if_present(&temp_path);
                FailOutcome::Rejected { reason }
            }
            Ok(OracleOutcome::Accepted) => {
                warn!(template = %template, index, haystack, "oracle accepted a fail case");
                let retained = if self.config.keep_unexpected_success_inputs {
                    self.retain_unexpected_success(template, index, &temp_path)
                } else {
                    remove_if_present(&temp_path);
                    None
                };
                FailOutcome::UnexpectedSuccess { retained }
            }
            Err(error) => {
                error!(template = %template, index, "{}", error);
                remove_if_present(&temp_path);
                FailOutcome::Error {
                    reason: error.to_string(),
                }
            }
        }
    }

    fn retain_unexpected_success(
        &self,
        template: &Template,
        index: usize,
        temp_path: &Path,
    ) -> Option<PathBuf> {
        let keep_path = self
            .config
            .circuit_inputs_dir()
            .join(template.unexpected_success_file_name(index));
        match fs::rename(temp_path, &keep_path) {
            Ok(()) => {
                info!(path = %keep_path.display(), "kept input of unexpected success");
                Some(keep_path)
            }
            Err(source) => {
                warn!(
                    path = %temp_path.display(),
                    "failed to keep input of unexpected success: {}",
                    source
                );
                remove_if_present(temp_path);
                None
            }
        }
    }
}

fn remove_if_present(path: &Path) {
    if path.exists() {
        if let Err(source) = fs::remove_file(path) {
            warn!(path = %path.display(), "failed to remove temporary artifact: {}", source);
        }
    }
}
