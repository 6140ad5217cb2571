use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use testgen_core::modules::fixtures::{FailOutcome, PassOutcome};
use testgen_core::modules::{FixtureGenerator, Oracle, OracleOutcome, OracleRequest};
use testgen_core::{Template, TestgenConfig, TestgenError, TestgenResult};

/// Accepts every haystack containing "abc", like a graph for `[a-z]*abc[a-z]*`.
#[derive(Default)]
struct SubstringOracle {
    calls: RefCell<Vec<String>>,
}

impl Oracle for SubstringOracle {
    fn generate_input(&self, request: &OracleRequest) -> TestgenResult<OracleOutcome> {
        self.calls.borrow_mut().push(request.haystack.clone());
        if request.haystack == "boom" {
            return Err(TestgenError::external_tool("TOOL.SPAWN", "oracle binary vanished"));
        }
        if !request.haystack.contains("abc") {
            return Ok(OracleOutcome::Rejected {
                reason: format!("no match in '{}'", request.haystack),
            });
        }
        let bytes: Vec<String> = request.haystack.bytes().map(|byte| byte.to_string()).collect();
        fs::write(
            &request.output_path,
            format!(
                r#"{{"in_haystack":[{}],"match_start":0,"match_length":3}}"#,
                bytes.join(",")
            ),
        )
        .expect("fixture should be written");
        Ok(OracleOutcome::Accepted)
    }
}

fn project(root: &Path) -> TestgenConfig {
    let config = TestgenConfig {
        project_root: root.to_path_buf(),
        ..TestgenConfig::default()
    };
    fs::create_dir_all(config.sample_haystacks_dir()).expect("sample dir should be created");
    fs::create_dir_all(config.graphs_dir()).expect("graphs dir should be created");
    config
}

fn add_template(config: &TestgenConfig, name: &str, samples: &str) {
    fs::write(config.sample_haystacks_dir().join(format!("{}.json", name)), samples)
        .expect("samples should be written");
    fs::write(config.graphs_dir().join(format!("{}_graph.json", name)), "{}")
        .expect("graph should be written");
}

fn inputs_dir_listing(config: &TestgenConfig) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(config.circuit_inputs_dir())
        .expect("inputs dir should exist")
        .map(|entry| {
            entry
                .expect("entry should be readable")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

#[test]
fn pass_and_fail_cases_are_classified() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = project(temp.path());
    add_template(
        &config,
        "simple",
        r#"{"pass":["abc","","xxabc"],"fail":["abd","abcz","boom"]}"#,
    );

    let oracle = SubstringOracle::default();
    let report = FixtureGenerator::new(&config, &oracle)
        .generate_all()
        .expect("generation should run");

    assert_eq!(report.generated_fixture_count(), 2);
    assert_eq!(report.rejected_fail_case_count(), 1);
    assert_eq!(report.fail_case_error_count(), 1);
    assert_eq!(
        inputs_dir_listing(&config),
        vec!["simple_pass_0.json", "simple_pass_2.json"]
    );
    assert_eq!(report.unexpected_successes.len(), 1);
    let record = &report.unexpected_successes[0];
    assert_eq!(record.template.as_str(), "simple");
    assert_eq!(record.fail_index, 1);
    assert_eq!(record.haystack, "abcz");
    assert_eq!(record.retained_path, None);

    let template = &report.templates[0];
    assert_eq!(
        template.pass_cases[1].outcome,
        PassOutcome::Generated {
            path: config.circuit_inputs_dir().join("simple_pass_2.json")
        }
    );
    assert!(matches!(
        template.fail_cases[2].outcome,
        FailOutcome::Error { ref reason } if reason.contains("TOOL.SPAWN")
    ));
    assert_eq!(
        oracle.calls.borrow().as_slice(),
        ["abc", "xxabc", "abd", "abcz", "boom"]
    );
}

#[test]
fn unexpected_success_input_is_kept_when_enabled() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = TestgenConfig {
        keep_unexpected_success_inputs: true,
        ..project(temp.path())
    };
    add_template(&config, "simple", r#"{"pass":[],"fail":["abc"]}"#);

    let report = FixtureGenerator::new(&config, SubstringOracle::default())
        .generate_all()
        .expect("generation should run");

    let kept = config
        .circuit_inputs_dir()
        .join("simple_fail_0_unexpected_success.json");
    assert_eq!(report.unexpected_successes[0].retained_path, Some(kept.clone()));
    assert!(kept.is_file());
    assert_eq!(
        inputs_dir_listing(&config),
        vec!["simple_fail_0_unexpected_success.json"]
    );
}

#[test]
fn template_without_graph_is_skipped() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = project(temp.path());
    fs::write(
        config.sample_haystacks_dir().join("orphan.json"),
        r#"{"pass":["abc"],"fail":[]}"#,
    )
    .expect("samples should be written");
    add_template(&config, "simple", r#"{"pass":["abc"],"fail":[]}"#);

    let oracle = SubstringOracle::default();
    let report = FixtureGenerator::new(&config, &oracle)
        .generate_all()
        .expect("generation should run");

    assert_eq!(report.skipped_template_count(), 1);
    let orphan = report
        .templates
        .iter()
        .find(|template| template.template == "orphan")
        .expect("orphan should be reported");
    assert!(
        orphan
            .skipped
            .as_deref()
            .is_some_and(|reason| reason.contains("orphan_graph.json"))
    );
    assert_eq!(oracle.calls.borrow().len(), 1);
    assert_eq!(report.generated_fixture_count(), 1);
}

#[test]
fn unreadable_sample_set_skips_only_that_template() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = project(temp.path());
    add_template(&config, "broken", "{ not json");
    add_template(&config, "simple", r#"{"pass":["abc"]}"#);

    let report = FixtureGenerator::new(&config, SubstringOracle::default())
        .generate_all()
        .expect("generation should run");

    assert_eq!(report.skipped_template_count(), 1);
    assert!(
        report.templates[0]
            .skipped
            .as_deref()
            .is_some_and(|reason| reason.contains("failed to parse sample set"))
    );
    assert_eq!(report.generated_fixture_count(), 1);
}

#[test]
fn single_template_generation_uses_its_sample_file() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = project(temp.path());
    add_template(&config, "simple", r#"{"pass":["abc"],"fail":["zzz"]}"#);
    add_template(&config, "other", r#"{"pass":["abc"],"fail":[]}"#);

    let template = Template::new("simple").expect("valid template");
    let report = FixtureGenerator::new(&config, SubstringOracle::default())
        .generate(&template)
        .expect("generation should run");

    assert_eq!(report.templates.len(), 1);
    assert_eq!(inputs_dir_listing(&config), vec!["simple_pass_0.json"]);
    assert!(report.unexpected_successes.is_empty());
}
