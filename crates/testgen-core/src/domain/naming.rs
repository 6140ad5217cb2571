//! Case conversions used when handing template names to the regex compiler.
//!
//! Template files are named in snake_case (`email_domain.json`). The compiler
//! expects a PascalCase template name and writes its outputs under the
//! snake_case form of that name, which is not always the original file stem.

use regex::Regex;
use std::sync::LazyLock;

static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(.)([A-Z][a-z]+)").expect("static pattern is valid"));
static LOWER_UPPER_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([a-z0-9])([A-Z])").expect("static pattern is valid"));

/// `email_domain` -> `EmailDomain`, `to-addr` -> `ToAddr`, `emailDomain` -> `EmailDomain`.
pub fn to_pascal_case(name: &str) -> String {
    let separator = if name.contains('_') {
        Some('_')
    } else if name.contains('-') {
        Some('-')
    } else {
        None
    };

    match separator {
        Some(separator) => name.split(separator).map(capitalize_word).collect(),
        None => upper_first(name),
    }
}

/// `EmailDomain` -> `email_domain`, `HTTPHeader` -> `http_header`.
pub fn to_snake_case(name: &str) -> String {
    let spaced = WORD_BOUNDARY.replace_all(name, "${1}_${2}");
    LOWER_UPPER_BOUNDARY
        .replace_all(&spaced, "${1}_${2}")
        .to_lowercase()
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{to_pascal_case, to_snake_case};

    #[test]
    fn pascal_case_handles_separators() {
        assert_eq!(to_pascal_case("email_domain"), "EmailDomain");
        assert_eq!(to_pascal_case("to-addr"), "ToAddr");
        assert_eq!(to_pascal_case("simple"), "Simple");
        assert_eq!(to_pascal_case("x"), "X");
    }

    #[test]
    fn pascal_case_lowercases_word_tails_only_when_splitting() {
        assert_eq!(to_pascal_case("body_HASH"), "BodyHash");
        assert_eq!(to_pascal_case("emailDomain"), "EmailDomain");
    }

    #[test]
    fn snake_case_round_trips_pascal_template_names() {
        for name in ["email_domain", "simple", "message_id", "subject_all"] {
            assert_eq!(to_snake_case(&to_pascal_case(name)), name);
        }
    }

    #[test]
    fn snake_case_splits_acronyms() {
        assert_eq!(to_snake_case("HTTPHeader"), "http_header");
        assert_eq!(to_snake_case("Body2Hash"), "body2_hash");
    }
}
