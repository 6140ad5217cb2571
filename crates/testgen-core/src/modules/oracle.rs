use super::process::run_command_with_timeout;
use super::traits::{Oracle, OracleOutcome, OracleRequest};
use crate::common::{TestgenConfig, ToolCommand};
use crate::domain::{TestgenError, TestgenResult};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Oracle backed by the `generate-circuit-input` subcommand of the regex compiler.
#[derive(Debug, Clone)]
pub struct ProcessOracle {
    tool: ToolCommand,
    working_dir: PathBuf,
    proving_framework: String,
}

impl ProcessOracle {
    pub fn new(tool: ToolCommand, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            working_dir: working_dir.into(),
            proving_framework: "noir".to_string(),
        }
    }

    pub fn from_config(config: &TestgenConfig) -> Self {
        Self::new(config.oracle.clone(), config.project_root.clone())
            .with_proving_framework(config.proving_framework.clone())
    }

    pub fn with_proving_framework(mut self, proving_framework: impl Into<String>) -> Self {
        self.proving_framework = proving_framework.into();
        self
    }

    fn command_for(&self, request: &OracleRequest) -> Command {
        let mut command = Command::new(&self.tool.program);
        command
            .current_dir(&self.working_dir)
            .args(&self.tool.args)
            .arg("generate-circuit-input")
            .arg("--graph-path")
            .arg(&request.graph_path)
            .arg("--input")
            .arg(&request.haystack)
            .arg("--max-haystack-len")
            .arg(request.max_haystack_len.to_string())
            .arg("--max-match-len")
            .arg(request.max_match_len.to_string())
            .arg("--output-file-path")
            .arg(&request.output_path)
            .arg("--proving-framework")
            .arg(&self.proving_framework);
        command
    }
}

impl Oracle for ProcessOracle {
    fn generate_input(&self, request: &OracleRequest) -> TestgenResult<OracleOutcome> {
        // Acceptance is judged by the output file, so a leftover from an
        // earlier run must not count.
        if request.output_path.is_file() {
            fs::remove_file(&request.output_path).map_err(|source| {
                TestgenError::io_system(
                    "IO.ORACLE_OUTPUT",
                    format!(
                        "failed to remove stale oracle output '{}': {}",
                        request.output_path.display(),
                        source
                    ),
                )
            })?;
        }

        let mut command = self.command_for(request);
        let timeout = self.tool.timeout();
        let result = run_command_with_timeout(&mut command, timeout)?;

        debug!(
            graph = %request.graph_path.display(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            stdout = %result.stdout.trim(),
            stderr = %result.stderr.trim(),
            "oracle finished"
        );

        if !result.succeeded() {
            return Ok(OracleOutcome::Rejected {
                reason: result.failure_summary(timeout),
            });
        }
        if !request.output_path.is_file() {
            return Ok(OracleOutcome::Rejected {
                reason: format!(
                    "oracle exited successfully but wrote no fixture to '{}'",
                    request.output_path.display()
                ),
            });
        }
        Ok(OracleOutcome::Accepted)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::ProcessOracle;
    use crate::common::ToolCommand;
    use crate::domain::TestgenErrorCategory;
    use crate::modules::traits::{Oracle, OracleOutcome, OracleRequest};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    // Accepts haystacks containing "abc" by writing a minimal fixture.
    const FAKE_ORACLE: &str = r#"
out=""; input=""
while [ $# -gt 0 ]; do
  case "$1" in
    --output-file-path) out="$2"; shift 2 ;;
    --input) input="$2"; shift 2 ;;
    *) shift ;;
  esac
done
case "$input" in
  *abc*) printf '{"in_haystack":[97,98,99],"match_start":0,"match_length":3}' > "$out" ;;
  *) echo "no match for $input" >&2; exit 1 ;;
esac
"#;

    fn oracle_in(dir: &Path, script: &str, timeout_secs: u64) -> ProcessOracle {
        let script_path = dir.join("oracle.sh");
        fs::write(&script_path, script).expect("script should be written");
        ProcessOracle::new(
            ToolCommand {
                program: "sh".to_string(),
                args: vec![script_path.display().to_string()],
                timeout_secs,
            },
            dir,
        )
    }

    fn request(dir: &Path, haystack: &str) -> OracleRequest {
        OracleRequest {
            graph_path: dir.join("simple_graph.json"),
            haystack: haystack.to_string(),
            max_haystack_len: 300,
            max_match_len: 300,
            output_path: dir.join("simple_pass_0.json"),
        }
    }

    #[test]
    fn accepted_haystack_writes_fixture() {
        let temp = TempDir::new().expect("tempdir should be created");
        let oracle = oracle_in(temp.path(), FAKE_ORACLE, 10);
        let request = request(temp.path(), "xxabcxx");

        let outcome = oracle.generate_input(&request).expect("oracle should run");
        assert_eq!(outcome, OracleOutcome::Accepted);
        assert!(request.output_path.is_file());
    }

    #[test]
    fn rejected_haystack_reports_stderr() {
        let temp = TempDir::new().expect("tempdir should be created");
        let oracle = oracle_in(temp.path(), FAKE_ORACLE, 10);
        let request = request(temp.path(), "zzz");

        let outcome = oracle.generate_input(&request).expect("oracle should run");
        assert_eq!(
            outcome,
            OracleOutcome::Rejected {
                reason: "exit code 1: no match for zzz".to_string()
            }
        );
        assert!(!request.output_path.exists());
    }

    #[test]
    fn success_without_output_file_is_a_rejection() {
        let temp = TempDir::new().expect("tempdir should be created");
        let oracle = oracle_in(temp.path(), "exit 0\n", 10);
        let outcome = oracle
            .generate_input(&request(temp.path(), "abc"))
            .expect("oracle should run");
        assert!(matches!(outcome, OracleOutcome::Rejected { reason } if reason.contains("wrote no fixture")));
    }

    #[test]
    fn hung_oracle_is_rejected_after_timeout() {
        let temp = TempDir::new().expect("tempdir should be created");
        let oracle = oracle_in(temp.path(), "exec sleep 10\n", 1);
        let outcome = oracle
            .generate_input(&request(temp.path(), "abc"))
            .expect("timeout is not a spawn failure");
        assert_eq!(
            outcome,
            OracleOutcome::Rejected {
                reason: "timed out after 1 s".to_string()
            }
        );
    }

    #[test]
    fn stale_output_from_an_earlier_run_is_not_an_acceptance() {
        let temp = TempDir::new().expect("tempdir should be created");
        let oracle = oracle_in(temp.path(), "exit 0\n", 10);
        let request = request(temp.path(), "abc");
        fs::write(&request.output_path, "{}").expect("old fixture should be written");

        let outcome = oracle.generate_input(&request).expect("oracle should run");

        assert!(matches!(outcome, OracleOutcome::Rejected { reason } if reason.contains("wrote no fixture")));
        assert!(!request.output_path.exists());
    }

    #[test]
    fn timed_out_oracle_cannot_write_output_afterwards() {
        let temp = TempDir::new().expect("tempdir should be created");
        let script = "sleep 2\nprintf '{}' > simple_pass_0.json\n";
        let oracle = oracle_in(temp.path(), script, 1);
        let request = request(temp.path(), "abc");

        let outcome = oracle.generate_input(&request).expect("timeout is not a spawn failure");
        assert!(matches!(outcome, OracleOutcome::Rejected { .. }));

        std::thread::sleep(std::time::Duration::from_secs(2));
        assert!(!request.output_path.exists());
    }

    #[test]
    fn missing_program_is_an_external_tool_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let oracle = ProcessOracle::new(
            ToolCommand {
                program: "/nonexistent/zk-regex".to_string(),
                args: Vec::new(),
                timeout_secs: 1,
            },
            temp.path(),
        );
        let error = oracle
            .generate_input(&request(temp.path(), "abc"))
            .expect_err("missing program should fail");
        assert_eq!(error.category(), TestgenErrorCategory::ExternalToolError);
        assert_eq!(error.placeholder(), "TOOL.SPAWN");
    }
}
