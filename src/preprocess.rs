use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// String and character literals come first in the alternation, so comment
/// markers inside them are consumed as part of the literal and kept.
static LITERAL_OR_COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)"(?:\\.|[^"\\\n])*"|'(?:\\.|[^'\\\n])*'|//[^\n]*|/\*.*?\*/"#).unwrap()
});

/// Strips comments, preprocessor directives and `using` lines from C source.
///
/// Removed lines are blanked rather than dropped and block comments keep
/// their newlines, so line numbers of the result match the input.
pub fn preprocess_source(source: &str) -> String {
    let without_comments = LITERAL_OR_COMMENT_RE.replace_all(source, |caps: &Captures| {
        let found = &caps[0];
        if found.starts_with("//") {
            String::new()
        } else if found.starts_with("/*") {
            "\n".repeat(found.matches('\n').count())
        } else {
            found.to_string()
        }
    });

    let mut out = String::with_capacity(without_comments.len());
    for (idx, line) in without_comments.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') || is_using_line(trimmed) {
            continue;
        }
        out.push_str(line);
    }
    out
}

fn is_using_line(line: &str) -> bool {
    line.strip_prefix("using")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_directives() {
        let input = "#include <stdio.h>\nint main() { // entry\n  return 0; /* done */\n}\n";
        let out = preprocess_source(input);
        assert!(!out.contains("include"));
        assert!(!out.contains("entry"));
        assert!(!out.contains("done"));
        assert!(out.contains("return 0;"));
    }

    #[test]
    fn keeps_line_numbers_stable() {
        let input = "int a;\n/* one\ntwo\nthree */\nint b;\n#define X 1\nint c;";
        let out = preprocess_source(input);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), input.split('\n').count());
        assert_eq!(lines[4], "int b;");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "int c;");
    }

    #[test]
    fn drops_using_lines() {
        let out = preprocess_source("using namespace std;\nint x;");
        assert_eq!(out, "\nint x;");
    }

    #[test]
    fn identifiers_starting_with_using_survive() {
        let out = preprocess_source("int main() {\n  usingCount = 1;\n}");
        assert!(out.contains("usingCount = 1;"));
    }

    #[test]
    fn comment_markers_inside_literals_are_kept() {
        let input = "printf(\"see http://x.org /* not */\\n\"); // gone\nc = '/'; /* a // b */ d = 1;";
        let out = preprocess_source(input);
        assert_eq!(
            out,
            "printf(\"see http://x.org /* not */\\n\"); \nc = '/';  d = 1;"
        );
    }

    #[test]
    fn escaped_quotes_do_not_end_a_literal() {
        let out = preprocess_source(r#"puts("say \"hi\" // not a comment"); // comment"#);
        assert_eq!(out, r#"puts("say \"hi\" // not a comment"); "#);
    }
}
