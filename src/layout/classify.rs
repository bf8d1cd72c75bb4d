use super::text::{clean_label, wrap_label};
use crate::config::LayoutConfig;
use crate::ir::NodeShape;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());

const OUTPUT_CALLS: &[&str] = &["printf", "fprintf", "puts"];
const INPUT_CALLS: &[&str] = &["scanf", "fscanf"];

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Classification {
    pub(super) label: Vec<String>,
    pub(super) shape: NodeShape,
    pub(super) width: f32,
}

/// Picks label, shape and width for a leaf statement. `callee` is set for
/// call statements only.
pub(super) fn classify(
    text: &str,
    callee: Option<&str>,
    names: &BTreeSet<String>,
    config: &LayoutConfig,
) -> Classification {
    let cleaned = clean_label(text);

    if let Some(callee) = callee {
        let prefix = if OUTPUT_CALLS.contains(&callee) {
            Some(config.output_prefix.as_str())
        } else if INPUT_CALLS.contains(&callee) {
            Some(config.input_prefix.as_str())
        } else {
            None
        };
        if let Some(prefix) = prefix {
            let label = format!("{}: {}", prefix, call_arguments(&cleaned));
            return Classification {
                label: wrap_label(&label, config.width_factor),
                shape: NodeShape::Parallelogram,
                width: config.special_shape_width,
            };
        }
    }

    let calls_user_function = match callee {
        Some(callee) => names.contains(callee),
        None => mentions_any(&cleaned, names),
    };
    if calls_user_function {
        return Classification {
            label: wrap_label(&cleaned, config.width_factor),
            shape: NodeShape::Subroutine,
            width: config.special_shape_width,
        };
    }

    Classification {
        label: wrap_label(&cleaned, config.width_factor),
        shape: NodeShape::Rectangle,
        width: config.node_width,
    }
}

/// Text between the first `(` and the last `)`.
fn call_arguments(text: &str) -> &str {
    match (text.find('('), text.rfind(')')) {
        (Some(open), Some(close)) if open < close => &text[open + 1..close],
        _ => text,
    }
}

fn mentions_any(text: &str, names: &BTreeSet<String>) -> bool {
    if names.is_empty() {
        return false;
    }
    IDENT_RE
        .find_iter(text)
        .any(|ident| names.contains(ident.as_str()))
}
