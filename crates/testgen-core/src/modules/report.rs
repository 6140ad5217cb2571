use super::compiler::{CompileReport, CompileStatus};
use super::fixtures::{FailOutcome, GenerationReport, PassOutcome};
use super::patcher::{PatchRunReport, PatchStatus, StaleBlock};
use super::serialization::write_json_artifact;
use crate::domain::TestgenResult;
use serde::Serialize;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of one CLI invocation across whichever stages ran.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub generated_at_unix_seconds: u64,
    pub passed: bool,
    pub compile: Option<CompileReport>,
    pub generation: Option<GenerationReport>,
    pub patch: Option<PatchRunReport>,
}

impl WorkflowReport {
    pub fn new(
        compile: Option<CompileReport>,
        generation: Option<GenerationReport>,
        patch: Option<PatchRunReport>,
    ) -> Self {
        // Unexpected successes and rejected pass cases are informational.
        let compile_failed = compile
            .as_ref()
            .is_some_and(|report| report.failed_count() > 0);
        let patch_failed = patch
            .as_ref()
            .is_some_and(|report| report.failed_count() > 0);
        Self {
            generated_at_unix_seconds: current_unix_timestamp_seconds(),
            passed: !compile_failed && !patch_failed,
            compile,
            generation,
            patch,
        }
    }
}

pub fn render_human_summary(report: &WorkflowReport) -> String {
    let mut lines = Vec::new();
    let status = if report.passed { "PASS" } else { "FAIL" };
    lines.push(format!("Workflow status: {}", status));

    if let Some(compile) = &report.compile {
        lines.push(format!(
            "Compile: {} templates ({} compiled, {} failed)",
            compile.templates.len(),
            compile.compiled_count(),
            compile.failed_count()
        ));
        for template in &compile.templates {
            if let CompileStatus::Failed { reason } = &template.status {
                lines.push(format!("  {}: {}", template.template, reason));
            }
        }
    }

    if let Some(generation) = &report.generation {
        lines.push(format!(
            "Inputs: {} templates ({} skipped), {} fixtures generated, {} pass cases failed",
            generation.templates.len(),
            generation.skipped_template_count(),
            generation.generated_fixture_count(),
            generation.failed_pass_case_count()
        ));
        lines.push(format!(
            "Fail cases: {} rejected as expected, {} unexpected successes, {} oracle errors",
            generation.rejected_fail_case_count(),
            generation.unexpected_successes.len(),
            generation.fail_case_error_count()
        ));
        for template in &generation.templates {
            if let Some(reason) = &template.skipped {
                lines.push(format!("  {} skipped: {}", template.template, reason));
            }
            for case in &template.pass_cases {
                if let PassOutcome::Failed { reason } = &case.outcome {
                    lines.push(format!(
                        "  {} pass {} failed: {}",
                        template.template, case.index, reason
                    ));
                }
            }
            for case in &template.fail_cases {
                if let FailOutcome::Error { reason } = &case.outcome {
                    lines.push(format!(
                        "  {} fail {} could not be evaluated: {}",
                        template.template, case.index, reason
                    ));
                }
            }
        }
    }

    if let Some(patch) = &report.patch {
        lines.push(format!(
            "Patch: {} files ({} updated, {} unchanged, {} failed), {} tests added",
            patch.files.len(),
            patch.updated_count(),
            patch.unchanged_count(),
            patch.failed_count(),
            patch.tests_added_count()
        ));
        for file in &patch.files {
            if let PatchStatus::Failed { reason } = &file.status {
                lines.push(format!("  {}: {}", file.path.display(), reason));
            }
            if let StaleBlock::Unterminated { start_line } = file.changes.stale_block {
                lines.push(format!(
                    "  {}: test block at line {} never closes; left in place",
                    file.path.display(),
                    start_line
                ));
            }
            for fixture_error in &file.changes.fixture_errors {
                lines.push(format!("  {}: {}", file.template, fixture_error));
            }
        }
    }

    if let Some(generation) = &report.generation {
        if !generation.unexpected_successes.is_empty() {
            lines.push(String::new());
            lines.push("--- SUMMARY OF UNEXPECTED SUCCESSES FOR 'FAIL' CASES ---".to_string());
            lines.push(
                "The following 'fail' cases unexpectedly resulted in successful input generation:"
                    .to_string(),
            );
            for record in &generation.unexpected_successes {
                lines.push(format!("  - {}", record));
            }
            lines.push(
                "Please review these cases to ensure the regex and test data are correct."
                    .to_string(),
            );
        }
    }

    lines.join("\n")
}

pub fn write_report_file(report_path: &Path, report: &WorkflowReport) -> TestgenResult<()> {
    write_json_artifact(report_path, report)?;
    Ok(())
}

fn current_unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::{WorkflowReport, render_human_summary, write_report_file};
    use crate::domain::{Template, UnexpectedSuccess};
    use crate::modules::fixtures::GenerationReport;
    use crate::modules::patcher::{
        FilePatchReport, PatchChanges, PatchRunReport, PatchStatus,
    };
    use serde_json::Value;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn patch_report(status: PatchStatus) -> PatchRunReport {
        PatchRunReport {
            files: vec![FilePatchReport {
                template: "simple".to_string(),
                path: PathBuf::from("circuits/simple_regex.nr"),
                status,
                changes: PatchChanges::default(),
            }],
        }
    }

    #[test]
    fn unexpected_successes_do_not_fail_the_run() {
        let generation = GenerationReport {
            templates: Vec::new(),
            unexpected_successes: vec![UnexpectedSuccess {
                template: Template::new("simple").expect("valid template"),
                fail_index: 2,
                haystack: "abd".to_string(),
                retained_path: None,
            }],
        };
        let report = WorkflowReport::new(None, Some(generation), Some(patch_report(PatchStatus::Unchanged)));

        assert!(report.passed);
        let summary = render_human_summary(&report);
        assert!(summary.starts_with("Workflow status: PASS"));
        assert!(summary.contains("--- SUMMARY OF UNEXPECTED SUCCESSES FOR 'FAIL' CASES ---"));
        assert!(summary.contains("  - Template: simple, Fail Case Index: 2, Haystack: \"abd\""));
    }

    #[test]
    fn failed_file_write_fails_the_run() {
        let report = WorkflowReport::new(
            None,
            None,
            Some(patch_report(PatchStatus::Failed {
                reason: "IoSystemError [IO.PATCH_WRITE] disk full".to_string(),
            })),
        );

        assert!(!report.passed);
        let summary = render_human_summary(&report);
        assert!(summary.contains("Patch: 1 files (0 updated, 0 unchanged, 1 failed), 0 tests added"));
        assert!(summary.contains("IO.PATCH_WRITE"));
        assert!(!summary.contains("UNEXPECTED SUCCESSES"));
    }

    #[test]
    fn report_file_is_pretty_json_with_stage_sections() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("reports/run.json");
        let report = WorkflowReport::new(None, None, Some(patch_report(PatchStatus::Updated)));

        write_report_file(&path, &report).expect("report should be written");

        let json: Value = serde_json::from_str(&fs::read_to_string(&path).expect("report should be read"))
            .expect("report should be JSON");
        assert_eq!(json["passed"], Value::Bool(true));
        assert_eq!(json["compile"], Value::Null);
        assert_eq!(json["patch"]["files"][0]["status"]["status"], "updated");
        assert_eq!(json["patch"]["files"][0]["changes"]["stale_block"]["status"], "absent");
    }
}
