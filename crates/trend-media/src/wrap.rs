//! Greedy word wrap by character count.

/// Wrap `text` into at most `max_lines` lines of at most `max_chars` chars.
///
/// Words are accumulated while `len(line + " " + word) <= max_chars`. A word
/// longer than `max_chars` gets a line of its own, unsplit. Once `max_lines`
/// lines are emitted the remaining words are dropped.
pub fn wrap_text(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if max_lines == 0 {
        return lines;
    }

    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line.is_empty() {
            line.push_str(word);
            line_len = word_len;
            continue;
        }

        if line_len + 1 + word_len <= max_chars {
            line.push(' ');
            line.push_str(word);
            line_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut line));
            if lines.len() == max_lines {
                return lines;
            }
            line.push_str(word);
            line_len = word_len;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
