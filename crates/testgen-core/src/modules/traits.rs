use crate::domain::TestgenResult;
use std::path::PathBuf;

/// One request to evaluate a haystack against an automaton graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub graph_path: PathBuf,
    pub haystack: String,
    pub max_haystack_len: usize,
    pub max_match_len: usize,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    /// The haystack matched and a fixture was written to the requested path.
    Accepted,
    /// The haystack did not produce a usable fixture.
    Rejected { reason: String },
}

/// Evaluates haystacks against an automaton graph.
///
/// `Err` is reserved for failures to run the oracle at all; a haystack the
/// automaton rejects is `Ok(OracleOutcome::Rejected { .. })`.
pub trait Oracle {
    fn generate_input(&self, request: &OracleRequest) -> TestgenResult<OracleOutcome>;
}

impl<T> Oracle for &T
where
    T: Oracle + ?Sized,
{
    fn generate_input(&self, request: &OracleRequest) -> TestgenResult<OracleOutcome> {
        (**self).generate_input(request)
    }
}

/// One request to compile a decomposed-regex description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub decomposed_regex_path: PathBuf,
    pub output_dir: PathBuf,
    pub template_name: String,
}

/// Turns a decomposed-regex description into a generated source and a graph descriptor.
pub trait Compiler {
    fn compile(&self, request: &CompileRequest) -> TestgenResult<()>;
}

impl<T> Compiler for &T
where
    T: Compiler + ?Sized,
{
    fn compile(&self, request: &CompileRequest) -> TestgenResult<()> {
        (**self).compile(request)
    }
}
