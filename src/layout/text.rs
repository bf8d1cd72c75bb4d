/// Strips surrounding whitespace, then one trailing `;` and one trailing `{`.
pub(super) fn clean_label(label: &str) -> String {
    let mut label = label.trim();
    if let Some(stripped) = label.strip_suffix(';') {
        label = stripped;
    }
    if let Some(stripped) = label.strip_suffix('{') {
        label = stripped;
    }
    label.trim().to_string()
}

/// Greedy word wrap to at most `width` characters per line. Words longer than
/// a line are split. Blank text yields no lines.
pub(super) fn wrap_label(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let needed = if current.is_empty() {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                    current_len += 1;
                }
                current.extend(word.iter());
                current_len += word.len();
                break;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_label_strips_terminators() {
        assert_eq!(clean_label("  a = 5; "), "a = 5");
        assert_eq!(clean_label("while (x) {"), "while (x)");
        assert_eq!(clean_label("return 0;"), "return 0");
        assert_eq!(clean_label(";;"), ";");
    }

    #[test]
    fn wrap_label_keeps_short_text() {
        assert_eq!(wrap_label("int a = 10", 16), vec!["int a = 10"]);
    }

    #[test]
    fn wrap_label_splits_on_words() {
        let lines = wrap_label("int a = 10, int b = 20, int c = 30", 16);
        assert_eq!(lines, vec!["int a = 10, int", "b = 20, int c =", "30"]);
        assert!(lines.iter().all(|line| line.chars().count() <= 16));
    }

    #[test]
    fn wrap_label_breaks_long_words() {
        let lines = wrap_label("x = averyveryverylongidentifier", 10);
        assert_eq!(lines, vec!["x =", "averyveryv", "erylongide", "ntifier"]);
    }

    #[test]
    fn wrap_label_of_blank_text_is_empty() {
        assert!(wrap_label("   ", 16).is_empty());
    }
}
