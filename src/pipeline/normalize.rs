//! Text normalisation: turn raw page text into one line a voice can read.
//!
//! pdfium reports line breaks as `\r\n`, hyphenation points as soft hyphens
//! and sometimes leaves zero-width characters from the original typesetting.
//! None of these should reach a speech engine: a newline in the middle of a
//! sentence makes some engines pause, and invisible characters are either
//! spelled out or break tokenisation.
//!
//! Rules (applied in order):
//! 1. Normalise line endings (CRLF / CR → LF)
//! 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
//! 3. Replace every newline with a space
//! 4. Trim both ends

/// Flatten raw extracted text into a single speakable line.
pub fn flatten_text(raw: &str) -> String {
    let s = normalise_line_endings(raw);
    let s = remove_invisible_chars(&s);
    s.replace('\n', " ").trim().to_string()
}

/// Concatenate page texts.
///
/// A newline separates pages so the last word of one page and the first word
/// of the next stay apart; [`flatten_text`] turns it into a space later.
pub fn join_pages<'a>(pages: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for page in pages {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(page);
    }
    out
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

const INVISIBLE: [char; 6] = [
    '\u{200B}', // zero-width space
    '\u{200C}', // zero-width non-joiner
    '\u{200D}', // zero-width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // BOM / zero-width no-break space
    '\u{00AD}', // soft hyphen
];

fn remove_invisible_chars(input: &str) -> String {
    input.chars().filter(|c| !INVISIBLE.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newlines_become_spaces() {
        assert_eq!(flatten_text("Hello\nworld"), "Hello world");
        assert_eq!(flatten_text("Hello\r\nworld\ragain"), "Hello world again");
    }

    #[test]
    fn ends_are_trimmed() {
        assert_eq!(flatten_text("\n\n  Chapter 1 \n"), "Chapter 1");
    }

    #[test]
    fn whitespace_only_flattens_to_empty() {
        assert_eq!(flatten_text(" \r\n\t\n "), "");
        assert_eq!(flatten_text("\u{FEFF}\u{200B}\n"), "");
    }

    #[test]
    fn invisible_chars_removed() {
        assert_eq!(flatten_text("syn\u{00AD}thesis"), "synthesis");
        assert_eq!(flatten_text("\u{FEFF}Title"), "Title");
    }

    #[test]
    fn inner_spacing_is_preserved() {
        // Only newlines are collapsed; runs of spaces are left to the engine.
        assert_eq!(flatten_text("a  b\n\nc"), "a  b  c");
    }

    #[test]
    fn pages_do_not_glue_words() {
        let joined = join_pages(["end of page", "start of next"]);
        assert_eq!(flatten_text(&joined), "end of page start of next");
    }

    #[test]
    fn join_skips_separator_after_trailing_newline() {
        assert_eq!(join_pages(["one\n", "two"]), "one\ntwo");
        assert_eq!(join_pages(Vec::<&str>::new()), "");
    }
}
