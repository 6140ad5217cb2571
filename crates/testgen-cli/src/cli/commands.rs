use super::CliError;
use super::helpers::{load_config, resolve_report_path};
use std::path::PathBuf;
use testgen_core::modules::compiler::CompileReport;
use testgen_core::modules::fixtures::GenerationReport;
use testgen_core::modules::patcher::PatchRunReport;
use testgen_core::modules::{
    CompileDriver, FixtureGenerator, ProcessCompiler, ProcessOracle, SourcePatcher,
    WorkflowReport, render_human_summary, write_report_file,
};
use testgen_core::{Template, TestgenConfig};
use tracing::info;

#[derive(clap::Args, Debug, Default)]
pub(super) struct SharedArgs {
    /// JSON configuration file
    #[arg(long)]
    pub(super) config: Option<PathBuf>,

    /// Root that relative configured directories resolve against
    #[arg(long)]
    pub(super) project_root: Option<PathBuf>,

    /// Haystack length passed to the oracle and declared in sources
    #[arg(long)]
    pub(super) max_haystack_len: Option<usize>,

    /// Match length passed to the oracle and declared in sources
    #[arg(long)]
    pub(super) max_match_len: Option<usize>,

    /// Keep oracle output for fail cases that were unexpectedly accepted
    #[arg(long)]
    pub(super) keep_unexpected_success_inputs: bool,

    /// Seconds before a single oracle invocation is killed
    #[arg(long)]
    pub(super) oracle_timeout_secs: Option<u64>,

    /// JSON report output path
    #[arg(long)]
    pub(super) report: Option<PathBuf>,

    /// Log debug events unless RUST_LOG says otherwise
    #[arg(long, short)]
    pub(super) verbose: bool,
}

#[derive(clap::Args)]
pub(super) struct CompileArgs {
    #[command(flatten)]
    pub(super) shared: SharedArgs,
}

#[derive(clap::Args)]
pub(super) struct InputsArgs {
    /// Only generate inputs for this template
    #[arg(long)]
    template: Option<String>,

    #[command(flatten)]
    pub(super) shared: SharedArgs,
}

#[derive(clap::Args)]
pub(super) struct PatchArgs {
    /// Only patch the source generated for this template
    #[arg(long)]
    template: Option<String>,

    #[command(flatten)]
    pub(super) shared: SharedArgs,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Compile decomposed regex descriptions before generating inputs
    #[arg(long)]
    compile: bool,

    #[command(flatten)]
    pub(super) shared: SharedArgs,
}

pub(super) fn run_compile_command(args: CompileArgs) -> Result<i32, CliError> {
    let config = load_config(&args.shared)?;
    let compile = compile_stage(&config)?;
    finish(&args.shared, WorkflowReport::new(Some(compile), None, None))
}

pub(super) fn run_inputs_command(args: InputsArgs) -> Result<i32, CliError> {
    let config = load_config(&args.shared)?;
    let generation = inputs_stage(&config, args.template.as_deref())?;
    finish(&args.shared, WorkflowReport::new(None, Some(generation), None))
}

pub(super) fn run_patch_command(args: PatchArgs) -> Result<i32, CliError> {
    let config = load_config(&args.shared)?;
    let patch = patch_stage(&config, args.template.as_deref())?;
    finish(&args.shared, WorkflowReport::new(None, None, Some(patch)))
}

pub(super) fn run_workflow_command(args: RunArgs) -> Result<i32, CliError> {
    let config = load_config(&args.shared)?;
    let compile = if args.compile {
        Some(compile_stage(&config)?)
    } else {
        None
    };
    let generation = inputs_stage(&config, None)?;
    let patch = patch_stage(&config, None)?;
    finish(
        &args.shared,
        WorkflowReport::new(compile, Some(generation), Some(patch)),
    )
}

fn compile_stage(config: &TestgenConfig) -> Result<CompileReport, CliError> {
    info!("compiling decomposed regex descriptions");
    CompileDriver::new(config, ProcessCompiler::from_config(config))
        .compile_all()
        .map_err(CliError::Pipeline)
}

fn inputs_stage(
    config: &TestgenConfig,
    template: Option<&str>,
) -> Result<GenerationReport, CliError> {
    info!("generating circuit inputs");
    let generator = FixtureGenerator::new(config, ProcessOracle::from_config(config));
    let report = match template {
        Some(name) => {
            let template = Template::new(name).map_err(CliError::Pipeline)?;
            generator.generate(&template)
        }
        None => generator.generate_all(),
    };
    report.map_err(CliError::Pipeline)
}

fn patch_stage(config: &TestgenConfig, template: Option<&str>) -> Result<PatchRunReport, CliError> {
    info!("patching generated sources");
    let patcher = SourcePatcher::new(config);
    match template {
        Some(name) => {
            let template = Template::new(name).map_err(CliError::Pipeline)?;
            let source_path = config.circuits_dir().join(template.circuit_file_name());
            Ok(PatchRunReport {
                files: vec![patcher.patch_file(&source_path)],
            })
        }
        None => patcher.patch_all().map_err(CliError::Pipeline),
    }
}

fn finish(shared: &SharedArgs, report: WorkflowReport) -> Result<i32, CliError> {
    println!("{}", render_human_summary(&report));
    if let Some(report_path) = resolve_report_path(shared)? {
        write_report_file(&report_path, &report).map_err(CliError::Pipeline)?;
        println!("JSON report: {}", report_path.display());
    }

    if report.passed { Ok(0) } else { Ok(1) }
}
