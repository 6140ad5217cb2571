//! Compiles decomposed-regex descriptions into generated sources and graphs.
//!
//! The compiler writes into a scratch directory named after the snake-cased
//! template name; the driver then moves both artifacts to their permanent
//! homes under the original template name.

use super::discovery::{DECOMPOSED_REGEX_GLOB, discover_files, file_name_str};
use super::process::run_command_with_timeout;
use super::traits::{CompileRequest, Compiler};
use crate::common::{TestgenConfig, ToolCommand};
use crate::domain::naming::{to_pascal_case, to_snake_case};
use crate::domain::{CIRCUIT_SUFFIX, GRAPH_SUFFIX, Template, TestgenError, TestgenResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const TEMP_GEN_DIR_NAME: &str = "temp_gen";

#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    tool: ToolCommand,
    working_dir: PathBuf,
    proving_framework: String,
}

impl ProcessCompiler {
    pub fn new(tool: ToolCommand, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            working_dir: working_dir.into(),
            proving_framework: "noir".to_string(),
        }
    }

    pub fn from_config(config: &TestgenConfig) -> Self {
        Self::new(config.compiler.clone(), config.project_root.clone())
            .with_proving_framework(config.proving_framework.clone())
    }

    pub fn with_proving_framework(mut self, proving_framework: impl Into<String>) -> Self {
        self.proving_framework = proving_framework.into();
        self
    }
}

impl Compiler for ProcessCompiler {
    fn compile(&self, request: &CompileRequest) -> TestgenResult<()> {
        let mut command = std::process::Command::new(&self.tool.program);
        command
            .current_dir(&self.working_dir)
            .args(&self.tool.args)
            .arg("decomposed")
            .arg("--decomposed-regex-path")
            .arg(&request.decomposed_regex_path)
            .arg("--output-file-path")
            .arg(&request.output_dir)
            .arg("--template-name")
            .arg(&request.template_name)
            .arg("--proving-framework")
            .arg(&self.proving_framework);

        let timeout = self.tool.timeout();
        let result = run_command_with_timeout(&mut command, timeout)?;
        debug!(
            template_name = %request.template_name,
            elapsed_ms = result.elapsed.as_millis() as u64,
            stdout = %result.stdout.trim(),
            "compiler finished"
        );

        if result.timed_out {
            return Err(TestgenError::external_tool(
                "TOOL.COMPILER_TIMEOUT",
                format!(
                    "compiler for '{}' {}",
                    request.template_name,
                    result.failure_summary(timeout)
                ),
            ));
        }
        if !result.succeeded() {
            return Err(TestgenError::external_tool(
                "TOOL.COMPILER_FAILED",
                format!(
                    "compiler for '{}' failed with {}",
                    request.template_name,
                    result.failure_summary(timeout)
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CompileDriverError {
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("compiler produced no source at '{path}'")]
    MissingSource { path: PathBuf },
    #[error("failed to move '{from}' to '{to}': {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<CompileDriverError> for TestgenError {
    fn from(error: CompileDriverError) -> Self {
        match &error {
            CompileDriverError::CreateDirectory { .. } => {
                TestgenError::io_system("IO.COMPILE_DIRECTORY", error.to_string())
            }
            CompileDriverError::MissingSource { .. } => {
                TestgenError::external_tool("TOOL.COMPILER_OUTPUT", error.to_string())
            }
            CompileDriverError::Move { .. } => {
                TestgenError::io_system("IO.COMPILE_MOVE", error.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompileReport {
    pub templates: Vec<TemplateCompileReport>,
    pub temp_dir_removed: bool,
}

impl CompileReport {
    pub fn compiled_count(&self) -> usize {
        self.templates
            .iter()
            .filter(|template| matches!(template.status, CompileStatus::Compiled { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.templates
            .iter()
            .filter(|template| matches!(template.status, CompileStatus::Failed { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateCompileReport {
    pub template: String,
    pub template_name: String,
    pub decomposed_regex_path: PathBuf,
    pub status: CompileStatus,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileStatus {
    Compiled {
        source_path: PathBuf,
        graph_path: Option<PathBuf>,
    },
    Failed {
        reason: String,
    },
}

pub struct CompileDriver<'a, C> {
    config: &'a TestgenConfig,
    compiler: C,
}

impl<'a, C> CompileDriver<'a, C>
where
    C: Compiler,
{
    pub fn new(config: &'a TestgenConfig, compiler: C) -> Self {
        Self { config, compiler }
    }

    /// Compiles every decomposed-regex description, then clears the scratch directory.
    pub fn compile_all(&self) -> TestgenResult<CompileReport> {
        let descriptions = discover_files(&self.config.decomposed_regex_dir(), DECOMPOSED_REGEX_GLOB)?;
        for dir in [
            self.config.circuits_dir(),
            self.config.graphs_dir(),
            self.config.temp_gen_dir(),
        ] {
            create_dir(&dir)?;
        }

        let mut report = CompileReport::default();
        for description in descriptions {
            let Some(template) = file_name_str(&description).and_then(Template::from_sample_file_name)
            else {
                warn!(path = %description.display(), "decomposed regex file name is not a template name");
                continue;
            };
            report.templates.push(self.compile_template(&template, &description));
        }
        report.temp_dir_removed = self.remove_temp_dir();
        Ok(report)
    }

    pub fn compile_template(&self, template: &Template, description: &Path) -> TemplateCompileReport {
        let template_name = to_pascal_case(template.as_str());
        info!(template = %template, template_name = %template_name, "compiling decomposed regex");

        let mut report = TemplateCompileReport {
            template: template.as_str().to_string(),
            template_name: template_name.clone(),
            decomposed_regex_path: description.to_path_buf(),
            status: CompileStatus::Failed {
                reason: String::new(),
            },
            warnings: Vec::new(),
        };
        let request = CompileRequest {
            decomposed_regex_path: description.to_path_buf(),
            output_dir: self.config.temp_gen_dir(),
            template_name: template_name.clone(),
        };
        if let Err(error) = self.compiler.compile(&request) {
            error!(template = %template, "{}", error);
            report.status = CompileStatus::Failed {
                reason: error.to_string(),
            };
            return report;
        }

        let output_base = to_snake_case(&template_name);
        let temp_dir = self.config.temp_gen_dir();
        let generated_source = temp_dir.join(format!("{}{}", output_base, CIRCUIT_SUFFIX));
        let generated_graph = temp_dir.join(format!("{}{}", output_base, GRAPH_SUFFIX));
        let source_path = self.config.circuits_dir().join(template.circuit_file_name());
        let graph_path = self.config.graphs_dir().join(template.graph_file_name());

        if !generated_source.is_file() {
            let error = TestgenError::from(CompileDriverError::MissingSource {
                path: generated_source,
            });
            error!(template = %template, "{}", error);
            report.status = CompileStatus::Failed {
                reason: error.to_string(),
            };
            return report;
        }
        if let Err(source) = move_file(&generated_source, &source_path) {
            let error = TestgenError::from(source);
            error!(template = %template, "{}", error);
            report.status = CompileStatus::Failed {
                reason: error.to_string(),
            };
            return report;
        }
        info!(template = %template, path = %source_path.display(), "moved generated source");

        let graph_path = if !generated_graph.is_file() {
            let warning = format!("compiler produced no graph at '{}'", generated_graph.display());
            warn!(template = %template, "{}", warning);
            report.warnings.push(warning);
            None
        } else {
            match move_file(&generated_graph, &graph_path) {
                Ok(()) => {
                    info!(template = %template, path = %graph_path.display(), "moved graph");
                    Some(graph_path)
                }
                Err(source) => {
                    warn!(template = %template, "{}", source);
                    report.warnings.push(source.to_string());
                    None
                }
            }
        };

        report.status = CompileStatus::Compiled {
            source_path,
            graph_path,
        };
        report
    }

    fn remove_temp_dir(&self) -> bool {
        let temp_dir = self.config.temp_gen_dir();
        if !temp_dir.is_dir() {
            return false;
        }
        if temp_dir.file_name().and_then(|name| name.to_str()) != Some(TEMP_GEN_DIR_NAME) {
            warn!(
                path = %temp_dir.display(),
                "scratch directory is not named '{}'; leaving it in place",
                TEMP_GEN_DIR_NAME
            );
            return false;
        }
        match fs::remove_dir_all(&temp_dir) {
            Ok(()) => {
                debug!(path = %temp_dir.display(), "removed scratch directory");
                true
            }
            Err(source) => {
                warn!(path = %temp_dir.display(), "failed to remove scratch directory: {}", source);
                false
            }
        }
    }
}

fn create_dir(path: &Path) -> Result<(), CompileDriverError> {
    fs::create_dir_all(path).map_err(|source| CompileDriverError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

// Falls back to copy-and-delete when the rename crosses filesystems.
fn move_file(from: &Path, to: &Path) -> Result<(), CompileDriverError> {
    let move_error = |source| CompileDriverError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).map_err(move_error)?;
    fs::remove_file(from).map_err(move_error)
}
