// src/process/tokenizer.rs

/// One line of CSV, split into untrimmed fields.
pub type RawRow = Vec<String>;

/// Split a single CSV line on commas, honouring double-quoted spans.
///
/// A `"` only toggles the in-quotes state and is dropped; `""` is *not*
/// treated as an escaped quote. Fields are returned untrimmed.
pub fn parse_row(line: &str) -> RawRow {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => inside_quotes = !inside_quotes,
            ',' if !inside_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    fields.push(current);
    fields
}

/// Lazy iterator over the non-blank rows of a CSV blob.
///
/// Cloning yields an independent cursor at the same position; call [`rows`]
/// again on the same text for a fresh pass.
#[derive(Clone, Debug)]
pub struct Rows<'a> {
    lines: std::str::Split<'a, char>,
}

impl<'a> Iterator for Rows<'a> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        self.lines
            .by_ref()
            .find(|line| !line.trim().is_empty())
            .map(parse_row)
    }
}

/// Tokenize `text` into rows, skipping lines that are empty after trimming.
pub fn rows(text: &str) -> Rows<'_> {
    Rows {
        lines: text.split('\n'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_comma_stays_in_field() {
        assert_eq!(parse_row(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn empty_line_is_single_empty_field() {
        assert_eq!(parse_row(""), vec![""]);
    }

    #[test]
    fn doubled_quotes_are_not_unescaped() {
        // `""` toggles twice and vanishes instead of yielding a literal quote
        assert_eq!(parse_row(r#""say ""hi""",x"#), vec!["say hi", "x"]);
    }

    #[test]
    fn fields_keep_whitespace() {
        assert_eq!(parse_row(" a , b "), vec![" a ", " b "]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "h1,h2\n\n   \n1,2\r\n3,4\n";
        let collected: Vec<RawRow> = rows(text).collect();
        assert_eq!(
            collected,
            vec![
                vec!["h1".to_string(), "h2".to_string()],
                vec!["1".to_string(), "2\r".to_string()],
                vec!["3".to_string(), "4".to_string()],
            ]
        );
    }

    #[test]
    fn rows_can_be_restarted() {
        let text = "a\nb\n";
        let first: Vec<RawRow> = rows(text).collect();
        let second: Vec<RawRow> = rows(text).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
