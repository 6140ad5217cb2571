use crate::domain::{TestgenError, TestgenResult};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

pub const SAMPLE_SET_GLOB: &str = "*.json";
pub const CIRCUIT_GLOB: &str = "*_regex.nr";
pub const FIXTURE_GLOB: &str = "*.json";
pub const DECOMPOSED_REGEX_GLOB: &str = "*.json";

/// Regular files directly inside `dir` whose file name matches `pattern`, sorted by path.
///
/// Subdirectories are never descended into, so the fixture directory nested
/// under the sample directory is not mistaken for a sample set.
pub fn discover_files(dir: &Path, pattern: &str) -> TestgenResult<Vec<PathBuf>> {
    let matcher = compile_glob(pattern)?;
    let entries = fs::read_dir(dir).map_err(|source| {
        TestgenError::missing_dependency(
            "MISSING.DIRECTORY",
            format!("failed to list directory '{}': {}", dir.display(), source),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            TestgenError::io_system(
                "IO.DIRECTORY_ENTRY",
                format!("failed to read entry in '{}': {}", dir.display(), source),
            )
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if matcher.is_match(Path::new(file_name)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn compile_glob(pattern: &str) -> TestgenResult<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| {
            TestgenError::internal(
                "SYS.GLOB",
                format!("invalid glob pattern '{}': {}", pattern, source),
            )
        })
}

pub fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}
