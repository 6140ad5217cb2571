//! Renders one `#[test]` function per pass fixture.

use crate::domain::{Fixture, Template};
use std::fmt::Display;

const MATCH_CALL: &str = "regex_match::<MAX_HAYSTACK_LEN, MAX_MATCH_LEN>";

/// Lines of the test function for pass fixture `index`, each ending in `\n`.
///
/// `capture_groups` is the count declared by the circuit, not the number of
/// groups present in the fixture: missing group arrays render empty.
pub fn render_test_function(
    template: &Template,
    index: usize,
    fixture: &Fixture,
    capture_groups: usize,
) -> Vec<String> {
    let mut body = vec![
        "#[test]".to_string(),
        format!("fn {}() {{", template.test_function_name(index)),
        format!(
            "    let in_haystack: [u8; MAX_HAYSTACK_LEN] = [{}];",
            join(&fixture.in_haystack)
        ),
        format!("    let match_start: u32 = {};", fixture.match_start),
        format!("    let match_length: u32 = {};", fixture.match_length),
        format!(
            "    let current_states: [Field; MAX_MATCH_LEN] = [{}];",
            join(&fixture.curr_states)
        ),
        format!(
            "    let next_states: [Field; MAX_MATCH_LEN] = [{}];",
            join(&fixture.next_states)
        ),
    ];

    let mut params: Vec<String> = [
        "in_haystack",
        "match_start",
        "match_length",
        "current_states",
        "next_states",
    ]
    .iter()
    .map(|param| param.to_string())
    .collect();

    if capture_groups > 0 {
        let start_indices = match &fixture.capture_group_start_indices {
            Some(indices) => join(indices),
            None => join(&vec![0; capture_groups]),
        };
        body.push(format!(
            "    let capture_group_start_indices_val: [Field; NUM_CAPTURE_GROUPS] = [{}];",
            start_indices
        ));

        let mut id_params = Vec::with_capacity(capture_groups);
        let mut start_params = Vec::with_capacity(capture_groups);
        for group in 1..=capture_groups {
            let ids = fixture
                .capture_group_ids
                .get(group - 1)
                .map(|values| join(values))
                .unwrap_or_default();
            let starts = fixture
                .capture_group_starts
                .get(group - 1)
                .map(|values| join(values))
                .unwrap_or_default();
            body.push(format!(
                "    let capture_group_{}_id: [Field; MAX_MATCH_LEN] = [{}];",
                group, ids
            ));
            body.push(format!(
                "    let capture_group_{}_start: [Field; MAX_MATCH_LEN] = [{}];",
                group, starts
            ));
            id_params.push(format!("capture_group_{}_id", group));
            start_params.push(format!("capture_group_{}_start", group));
        }
        params.extend(id_params);
        params.extend(start_params);
        params.push("capture_group_start_indices_val".to_string());
    }

    let call = format!("{}({})", MATCH_CALL, params.join(", "));
    body.push(match capture_groups {
        0 => format!("    {};", call),
        1 => format!("    let capture_1 = {};", call),
        groups => {
            let bindings: Vec<String> = (1..=groups)
                .map(|group| format!("capture_{}", group))
                .collect();
            format!("    let ({}) = {};", bindings.join(", "), call)
        }
    });
    body.push("}".to_string());

    body.into_iter().map(|line| line + "\n").collect()
}

fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
