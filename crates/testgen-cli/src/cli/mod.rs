mod commands;
mod helpers;

use clap::Parser;
use testgen_core::TestgenError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_testgen_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            eprintln!("{}", diagnostic.fatal_exit_line());
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("regex-testgen".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "regex-testgen",
    about = "Generate circuit inputs and regression tests for compiled regex templates"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compile decomposed regex descriptions into circuit sources and graphs
    Compile(commands::CompileArgs),
    /// Generate circuit input fixtures from sample haystacks
    Inputs(commands::InputsArgs),
    /// Patch generated circuit sources with tests for the fixtures on disk
    Patch(commands::PatchArgs),
    /// Generate inputs, then patch sources (optionally compiling first)
    Run(commands::RunArgs),
}

impl CliCommand {
    fn shared(&self) -> &commands::SharedArgs {
        match self {
            Self::Compile(args) => &args.shared,
            Self::Inputs(args) => &args.shared,
            Self::Patch(args) => &args.shared,
            Self::Run(args) => &args.shared,
        }
    }
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    helpers::init_logging(command.shared().verbose);
    match command {
        CliCommand::Compile(args) => commands::run_compile_command(args),
        CliCommand::Inputs(args) => commands::run_inputs_command(args),
        CliCommand::Patch(args) => commands::run_patch_command(args),
        CliCommand::Run(args) => commands::run_workflow_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Pipeline(TestgenError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_testgen_error(&self) -> TestgenError {
        match self {
            Self::Usage(message) => {
                TestgenError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Pipeline(error) => error.clone(),
            Self::Internal(error) => TestgenError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
