//! Source patching: brings generated circuit sources up to date with the
//! pass fixtures on disk.
//!
//! Every edit is computed in memory by [`SourcePatcher::apply`] and the file is
//! only rewritten when at least one edit applies, which keeps repeated runs
//! byte-stable.

pub mod globals;
pub mod scan;
pub mod synth;

use super::discovery::{CIRCUIT_GLOB, FIXTURE_GLOB, discover_files, file_name_str};
use super::serialization::write_text_atomic;
use crate::common::TestgenConfig;
use crate::domain::{Fixture, Template, TestgenError, TestgenResult};
use globals::{declared_capture_groups, missing_limit_declarations};
use scan::{TestBlock, find_test_block};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use synth::render_test_function;
use tracing::{debug, error, info, warn};

pub const GENERATOR_IMPORT: &str = "use zkregex::";
pub const LOCAL_IMPORT: &str = "use crate::";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassFixture {
    pub index: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StaleBlock {
    Absent,
    /// One-based, inclusive line numbers in the file as read.
    Removed { start_line: usize, end_line: usize },
    Unterminated { start_line: usize },
}

/// Edits computed for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchChanges {
    pub imports_rewritten: usize,
    pub stale_block: StaleBlock,
    pub constants_added: Vec<String>,
    pub capture_groups: usize,
    pub tests_added: Vec<String>,
    pub tests_already_present: Vec<String>,
    pub fixture_errors: Vec<String>,
}

impl Default for PatchChanges {
    fn default() -> Self {
        Self {
            imports_rewritten: 0,
            stale_block: StaleBlock::Absent,
            constants_added: Vec::new(),
            capture_groups: 0,
            tests_added: Vec::new(),
            tests_already_present: Vec::new(),
            fixture_errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPlan {
    pub content: String,
    pub changed: bool,
    pub changes: PatchChanges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchStatus {
    Updated,
    Unchanged,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FilePatchReport {
    pub template: String,
    pub path: PathBuf,
    pub status: PatchStatus,
    pub changes: PatchChanges,
}

impl FilePatchReport {
    fn failed(template: impl Into<String>, path: &Path, error: &TestgenError) -> Self {
        Self {
            template: template.into(),
            path: path.to_path_buf(),
            status: PatchStatus::Failed {
                reason: error.to_string(),
            },
            changes: PatchChanges::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatchRunReport {
    pub files: Vec<FilePatchReport>,
}

impl PatchRunReport {
    pub fn updated_count(&self) -> usize {
        self.count(|status| matches!(status, PatchStatus::Updated))
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(|status| matches!(status, PatchStatus::Unchanged))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|status| matches!(status, PatchStatus::Failed { .. }))
    }

    pub fn tests_added_count(&self) -> usize {
        self.files
            .iter()
            .map(|file| file.changes.tests_added.len())
            .sum()
    }

    pub fn fixture_error_count(&self) -> usize {
        self.files
            .iter()
            .map(|file| file.changes.fixture_errors.len())
            .sum()
    }

    fn count(&self, predicate: impl Fn(&PatchStatus) -> bool) -> usize {
        self.files
            .iter()
            .filter(|file| predicate(&file.status))
            .count()
    }
}

pub struct SourcePatcher<'a> {
    config: &'a TestgenConfig,
}

impl<'a> SourcePatcher<'a> {
    pub fn new(config: &'a TestgenConfig) -> Self {
        Self { config }
    }

    /// Patches every generated source in the circuits directory.
    ///
    /// Only a missing circuits directory is an error; per-file failures are
    /// recorded in the report and the run moves on.
    pub fn patch_all(&self) -> TestgenResult<PatchRunReport> {
        let circuits_dir = self.config.circuits_dir();
        let sources = discover_files(&circuits_dir, CIRCUIT_GLOB)?;
        if sources.is_empty() {
            warn!(dir = %circuits_dir.display(), "no generated sources found");
        }

        let mut report = PatchRunReport::default();
        for source_path in sources {
            report.files.push(self.patch_file(&source_path));
        }
        Ok(report)
    }

    pub fn patch_file(&self, source_path: &Path) -> FilePatchReport {
        let file_name = file_name_str(source_path).unwrap_or_default();
        let Some(template) = Template::from_circuit_file_name(file_name) else {
            let error = TestgenError::input_validation(
                "INPUT.SOURCE_NAME",
                format!(
                    "'{}' is not named after a template",
                    source_path.display()
                ),
            );
            warn!("{}", error.message());
            return FilePatchReport::failed(file_name, source_path, &error);
        };
        info!(template = %template, path = %source_path.display(), "patching generated source");

        let content = match fs::read_to_string(source_path) {
            Ok(content) => content,
            Err(source) => {
                let error = TestgenError::io_system(
                    "IO.PATCH_READ",
                    format!("failed to read '{}': {}", source_path.display(), source),
                );
                error!(template = %template, "{}", error.message());
                return FilePatchReport::failed(template.as_str(), source_path, &error);
            }
        };

        let fixtures = match self.discover_pass_fixtures(&template) {
            Ok(fixtures) => fixtures,
            Err(error) => {
                error!(template = %template, "{}", error.message());
                return FilePatchReport::failed(template.as_str(), source_path, &error);
            }
        };
        if fixtures.is_empty() {
            info!(template = %template, "no pass fixtures found");
        }

        let plan = self.apply(&template, &content, &fixtures);
        let status = if !plan.changed {
            info!(template = %template, "no changes needed");
            PatchStatus::Unchanged
        } else {
            match write_text_atomic(source_path, &plan.content) {
                Ok(()) => {
                    info!(
                        template = %template,
                        tests_added = plan.changes.tests_added.len(),
                        "updated generated source"
                    );
                    PatchStatus::Updated
                }
                Err(source) => {
                    let error = TestgenError::io_system("IO.PATCH_WRITE", source.to_string());
                    error!(template = %template, "{}", error.message());
                    PatchStatus::Failed {
                        reason: error.to_string(),
                    }
                }
            }
        };

        FilePatchReport {
            template: template.as_str().to_string(),
            path: source_path.to_path_buf(),
            status,
            changes: plan.changes,
        }
    }

    /// Pass fixtures owned by `template`, sorted by index.
    pub fn discover_pass_fixtures(&self, template: &Template) -> TestgenResult<Vec<PassFixture>> {
        let inputs_dir = self.config.circuit_inputs_dir();
        if !inputs_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut fixtures: Vec<PassFixture> = discover_files(&inputs_dir, FIXTURE_GLOB)?
            .into_iter()
            .filter_map(|path| {
                let index = template.pass_fixture_index(file_name_str(&path)?)?;
                Some(PassFixture { index, path })
            })
            .collect();
        fixtures.sort_by_key(|fixture| fixture.index);
        Ok(fixtures)
    }

    /// Computes the patched content of one source without touching the disk,
    /// apart from reading the fixtures.
    pub fn apply(&self, template: &Template, content: &str, fixtures: &[PassFixture]) -> PatchPlan {
        let mut changes = PatchChanges::default();
        let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();

        for line in &mut lines {
            if line.trim_start().starts_with(GENERATOR_IMPORT) {
                *line = line.replacen(GENERATOR_IMPORT, LOCAL_IMPORT, 1);
                changes.imports_rewritten += 1;
            }
        }
        if changes.imports_rewritten > 0 {
            debug!(template = %template, count = changes.imports_rewritten, "rewrote generator imports");
        }

        match find_test_block(&lines) {
            Some(TestBlock::Closed { start, end }) => {
                lines.drain(start..=end);
                debug!(template = %template, start_line = start + 1, end_line = end + 1, "removed stale test block");
                changes.stale_block = StaleBlock::Removed {
                    start_line: start + 1,
                    end_line: end + 1,
                };
            }
            Some(TestBlock::Unterminated { start }) => {
                warn!(template = %template, line = start + 1, "stale test block never closes; left in place");
                changes.stale_block = StaleBlock::Unterminated {
                    start_line: start + 1,
                };
            }
            None => {}
        }

        let mut patched = lines.concat();
        let mut queued: Vec<String> = Vec::new();

        let missing = missing_limit_declarations(
            &patched,
            self.config.max_haystack_len,
            self.config.max_match_len,
        );
        for (name, declaration) in missing {
            debug!(template = %template, constant = name, "queued global declaration");
            changes.constants_added.push(name.to_string());
            queued.push(declaration);
        }
        if !queued.is_empty() {
            queued.push("\n".to_string());
        }

        changes.capture_groups = declared_capture_groups(&patched);

        for fixture in fixtures {
            let name = template.test_function_name(fixture.index);
            let signature = format!("fn {}()", name);
            if patched.contains(&signature) || queued.iter().any(|line| line.contains(&signature)) {
                debug!(template = %template, test = %name, "test already present");
                changes.tests_already_present.push(name);
                continue;
            }
            let loaded = match Fixture::load(&fixture.path) {
                Ok(loaded) => loaded,
                Err(error) => {
                    warn!(template = %template, test = %name, "{}; skipping test", error.message());
                    changes.fixture_errors.push(error.to_string());
                    continue;
                }
            };
            queued.extend(render_test_function(
                template,
                fixture.index,
                &loaded,
                changes.capture_groups,
            ));
            queued.push("\n".to_string());
            debug!(template = %template, test = %name, "queued test function");
            changes.tests_added.push(name);
        }

        let changed = changes.imports_rewritten > 0
            || matches!(changes.stale_block, StaleBlock::Removed { .. })
            || !queued.is_empty();
        if !queued.is_empty() {
            if !patched.is_empty() && !patched.ends_with('\n') {
                patched.push('\n');
            }
            patched.push_str(&queued.concat());
        }

        PatchPlan {
            content: patched,
            changed,
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PassFixture, SourcePatcher, StaleBlock};
    use crate::common::TestgenConfig;
    use crate::domain::Template;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const GENERATED: &str = "use zkregex::utils::check_substring;\n\
                             pub global NUM_CAPTURE_GROUPS: u32 = 0;\n\
                             pub fn regex_match<let MAX_HAYSTACK_LEN: u32, let MAX_MATCH_LEN: u32>() {\n\
                             }\n\
                             #[cfg(test)]\n\
                             mod tests {\n\
                             \x20   #[test]\n\
                             \x20   fn old() { if true { } }\n\
                             }\n";

    fn write_fixture(dir: &Path, name: &str) -> PassFixture {
        let path = dir.join(name);
        fs::write(
            &path,
            r#"{"in_haystack":[97,98,99],"match_start":0,"match_length":3,"curr_states":[0,1],"next_states":[1,2]}"#,
        )
        .expect("fixture should be written");
        PassFixture { index: 0, path }
    }

    #[test]
    fn apply_performs_every_edit_once() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = TestgenConfig::default();
        let patcher = SourcePatcher::new(&config);
        let template = Template::new("simple").expect("valid template");
        let fixtures = vec![write_fixture(temp.path(), "simple_pass_0.json")];

        let plan = patcher.apply(&template, GENERATED, &fixtures);

        assert!(plan.changed);
        assert_eq!(plan.changes.imports_rewritten, 1);
        assert_eq!(
            plan.changes.stale_block,
            StaleBlock::Removed {
                start_line: 5,
                end_line: 9
            }
        );
        assert_eq!(
            plan.changes.constants_added,
            vec!["MAX_HAYSTACK_LEN", "MAX_MATCH_LEN"]
        );
        assert_eq!(plan.changes.tests_added, vec!["test_simple_pass_0"]);
        assert!(plan.content.starts_with("use crate::utils::check_substring;\n"));
        assert!(!plan.content.contains("fn old()"));
        assert!(plan.content.contains(
            "}\nglobal MAX_HAYSTACK_LEN: u32 = 300;\nglobal MAX_MATCH_LEN: u32 = 300;\n\n#[test]\nfn test_simple_pass_0() {\n"
        ));
        assert!(plan.content.ends_with("}\n\n"));

        let second = patcher.apply(&template, &plan.content, &fixtures);
        assert!(!second.changed);
        assert_eq!(second.content, plan.content);
        assert_eq!(second.changes.tests_already_present, vec!["test_simple_pass_0"]);
    }

    #[test]
    fn duplicate_indices_within_one_run_are_queued_once() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = TestgenConfig::default();
        let patcher = SourcePatcher::new(&config);
        let template = Template::new("simple").expect("valid template");
        let fixture = write_fixture(temp.path(), "simple_pass_0.json");
        let fixtures = vec![fixture.clone(), fixture];

        let plan = patcher.apply(&template, "fn main() {}\n", &fixtures);

        assert_eq!(plan.content.matches("fn test_simple_pass_0()").count(), 1);
        assert_eq!(plan.changes.tests_already_present, vec!["test_simple_pass_0"]);
    }

    #[test]
    fn unreadable_fixture_is_skipped_and_reported() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = TestgenConfig::default();
        let patcher = SourcePatcher::new(&config);
        let template = Template::new("simple").expect("valid template");
        let broken = temp.path().join("simple_pass_1.json");
        fs::write(&broken, "{ not json").expect("fixture should be written");
        let source = "global MAX_HAYSTACK_LEN: u32 = 300;\nglobal MAX_MATCH_LEN: u32 = 300;\n";

        let plan = patcher.apply(
            &template,
            source,
            &[PassFixture {
                index: 1,
                path: broken,
            }],
        );

        assert!(!plan.changed);
        assert_eq!(plan.content, source);
        assert_eq!(plan.changes.fixture_errors.len(), 1);
        assert!(plan.changes.fixture_errors[0].contains("PARSE.FIXTURE"));
    }

    #[test]
    fn missing_final_newline_is_added_before_appending() {
        let config = TestgenConfig::default();
        let patcher = SourcePatcher::new(&config);
        let template = Template::new("simple").expect("valid template");

        let plan = patcher.apply(&template, "fn main() {}", &[]);

        assert!(plan.content.starts_with("fn main() {}\nglobal MAX_HAYSTACK_LEN"));
    }

    #[test]
    fn unterminated_block_is_left_in_place() {
        let config = TestgenConfig::default();
        let patcher = SourcePatcher::new(&config);
        let template = Template::new("simple").expect("valid template");
        let source = "global MAX_HAYSTACK_LEN: u32 = 1;\nglobal MAX_MATCH_LEN: u32 = 1;\n#[cfg(test)]\nmod tests {\n";

        let plan = patcher.apply(&template, source, &[]);

        assert!(!plan.changed);
        assert_eq!(plan.content, source);
        assert_eq!(
            plan.changes.stale_block,
            StaleBlock::Unterminated { start_line: 3 }
        );
    }

    #[test]
    fn pass_fixtures_are_discovered_by_exact_template_and_sorted_numerically() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = TestgenConfig {
            circuit_inputs_dir: temp.path().to_path_buf(),
            ..TestgenConfig::default()
        };
        for name in [
            "email_pass_10.json",
            "email_pass_2.json",
            "email_addr_pass_0.json",
            "email_fail_0_temp.json",
        ] {
            fs::write(temp.path().join(name), "{}").expect("fixture should be written");
        }
        let patcher = SourcePatcher::new(&config);
        let template = Template::new("email").expect("valid template");

        let found = patcher
            .discover_pass_fixtures(&template)
            .expect("discovery should work");

        let indices: Vec<_> = found.iter().map(|fixture| fixture.index).collect();
        assert_eq!(indices, vec![2, 10]);
    }
}
