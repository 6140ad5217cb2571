use regex::Regex;
use std::sync::LazyLock;

pub const MAX_HAYSTACK_LEN: &str = "MAX_HAYSTACK_LEN";
pub const MAX_MATCH_LEN: &str = "MAX_MATCH_LEN";
pub const NUM_CAPTURE_GROUPS: &str = "NUM_CAPTURE_GROUPS";

static HAYSTACK_LEN_DECL: LazyLock<Regex> = LazyLock::new(|| limit_declaration(MAX_HAYSTACK_LEN));
static MATCH_LEN_DECL: LazyLock<Regex> = LazyLock::new(|| limit_declaration(MAX_MATCH_LEN));
static CAPTURE_GROUPS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"pub global {}: u32\s*=\s*(\d+);",
        NUM_CAPTURE_GROUPS
    ))
    .expect("static pattern is valid")
});

// Any value counts: an existing declaration is never clobbered or duplicated.
fn limit_declaration(name: &str) -> Regex {
    Regex::new(&format!(r"(?m)^(?:pub )?global {}: u32\s*=\s*\d+;", name))
        .expect("static pattern is valid")
}

/// Declaration lines for the limit constants `content` does not declare yet.
pub fn missing_limit_declarations(
    content: &str,
    max_haystack_len: usize,
    max_match_len: usize,
) -> Vec<(&'static str, String)> {
    let mut missing = Vec::new();
    if !HAYSTACK_LEN_DECL.is_match(content) {
        missing.push((MAX_HAYSTACK_LEN, render_limit(MAX_HAYSTACK_LEN, max_haystack_len)));
    }
    if !MATCH_LEN_DECL.is_match(content) {
        missing.push((MAX_MATCH_LEN, render_limit(MAX_MATCH_LEN, max_match_len)));
    }
    missing
}

fn render_limit(name: &str, value: usize) -> String {
    format!("global {}: u32 = {};\n", name, value)
}

/// Number of capture groups the generated source declares, zero when undeclared.
pub fn declared_capture_groups(content: &str) -> usize {
    CAPTURE_GROUPS_DECL
        .captures(content)
        .and_then(|captures| captures.get(1))
        .and_then(|count| count.as_str().parse().ok())
        .unwrap_or(0)
}
