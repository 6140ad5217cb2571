//! Run configuration shared by the compiler driver, fixture generator and source patcher.
//!
//! Directory fields are stored as given and resolved against `project_root` on use.

use crate::domain::{TestgenError, TestgenResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_HAYSTACK_LEN: usize = 300;
pub const DEFAULT_MAX_MATCH_LEN: usize = 300;
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_COMPILER_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TestgenConfig {
    pub project_root: PathBuf,
    pub decomposed_regex_dir: PathBuf,
    pub sample_haystacks_dir: PathBuf,
    pub circuit_inputs_dir: PathBuf,
    pub graphs_dir: PathBuf,
    pub circuits_dir: PathBuf,
    pub temp_gen_dir: PathBuf,
    pub max_haystack_len: usize,
    pub max_match_len: usize,
    pub keep_unexpected_success_inputs: bool,
    pub proving_framework: String,
    pub oracle: ToolCommand,
    pub compiler: ToolCommand,
}

impl Default for TestgenConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            decomposed_regex_dir: PathBuf::from("noir/common"),
            sample_haystacks_dir: PathBuf::from("noir/common/sample_haystacks"),
            circuit_inputs_dir: PathBuf::from("noir/common/sample_haystacks/circuit_inputs"),
            graphs_dir: PathBuf::from("noir/src/templates/graphs"),
            circuits_dir: PathBuf::from("noir/src/templates/circuits"),
            temp_gen_dir: PathBuf::from("noir/src/templates/temp_gen"),
            max_haystack_len: DEFAULT_MAX_HAYSTACK_LEN,
            max_match_len: DEFAULT_MAX_MATCH_LEN,
            keep_unexpected_success_inputs: false,
            proving_framework: "noir".to_string(),
            oracle: ToolCommand::zk_regex(DEFAULT_ORACLE_TIMEOUT_SECS),
            compiler: ToolCommand::zk_regex(DEFAULT_COMPILER_TIMEOUT_SECS),
        }
    }
}

/// How to launch an external tool: program, leading arguments and a wall-clock bound.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

impl ToolCommand {
    fn zk_regex(timeout_secs: u64) -> Self {
        Self {
            program: "cargo".to_string(),
            args: ["run", "--quiet", "--bin", "zk-regex"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_tool_timeout_secs() -> u64 {
    DEFAULT_ORACLE_TIMEOUT_SECS
}

impl TestgenConfig {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_json_path(path: &Path) -> TestgenResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            TestgenError::io_system(
                "IO.CONFIG_READ",
                format!("failed to read config '{}': {}", path.display(), source),
            )
        })?;
        Self::from_json(&content).map_err(|source| {
            TestgenError::input_validation(
                "INPUT.CONFIG_PARSE",
                format!("failed to parse config '{}': {}", path.display(), source),
            )
        })
    }

    pub fn validate(&self) -> TestgenResult<()> {
        if self.max_haystack_len == 0 {
            return Err(TestgenError::input_validation(
                "INPUT.CONFIG_MAX_HAYSTACK_LEN",
                "max_haystack_len must be positive",
            ));
        }
        if self.max_match_len == 0 {
            return Err(TestgenError::input_validation(
                "INPUT.CONFIG_MAX_MATCH_LEN",
                "max_match_len must be positive",
            ));
        }
        for (name, tool) in [("oracle", &self.oracle), ("compiler", &self.compiler)] {
            if tool.program.trim().is_empty() {
                return Err(TestgenError::input_validation(
                    "INPUT.CONFIG_TOOL_PROGRAM",
                    format!("{} program must not be empty", name),
                ));
            }
            if tool.timeout_secs == 0 {
                return Err(TestgenError::input_validation(
                    "INPUT.CONFIG_TOOL_TIMEOUT",
                    format!("{} timeout_secs must be positive", name),
                ));
            }
        }
        Ok(())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn decomposed_regex_dir(&self) -> PathBuf {
        self.resolve(&self.decomposed_regex_dir)
    }

    pub fn sample_haystacks_dir(&self) -> PathBuf {
        self.resolve(&self.sample_haystacks_dir)
    }

    pub fn circuit_inputs_dir(&self) -> PathBuf {
        self.resolve(&self.circuit_inputs_dir)
    }

    pub fn graphs_dir(&self) -> PathBuf {
        self.resolve(&self.graphs_dir)
    }

    pub fn circuits_dir(&self) -> PathBuf {
        self.resolve(&self.circuits_dir)
    }

    pub fn temp_gen_dir(&self) -> PathBuf {
        self.resolve(&self.temp_gen_dir)
    }
}
