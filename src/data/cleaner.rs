// ============================================================
// Layer 4 — Newsgroup Text Cleaner
// ============================================================
// Optional clean-up applied to raw posts before tokenisation.
//
// A newsgroup post carries a lot of text that says nothing about
// its topic and lets a classifier cheat:
//   - a header block (From:, Subject:, Organization:, ...)
//   - a signature block after a "--" line
//   - quoted replies ("> ...", "In article <...> X writes:")
//
// Each of these can be removed independently. Whitespace can then
// be normalised:
//   1. Replace tabs, NBSP, zero-width spaces and control chars
//   2. Collapse runs of spaces and trim every line
//   3. Allow at most one blank line between paragraphs
//
// Nothing is removed by default, so the raw corpus is what the
// classifier sees unless asked otherwise.

use serde::{Deserialize, Serialize};

/// Which parts of a post to strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveParts {
    pub headers: bool,
    pub footers: bool,
    pub quotes:  bool,
}

impl RemoveParts {
    pub fn none() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn all() -> Self {
        Self { headers: true, footers: true, quotes: true }
    }

    pub fn any(&self) -> bool {
        self.headers || self.footers || self.quotes
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextCleaner {
    remove:    RemoveParts,
    normalize: bool,
}

impl TextCleaner {
    pub fn new(remove: RemoveParts) -> Self {
        Self { remove, normalize: false }
    }

    /// Also collapse whitespace after stripping
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// True when `clean` would return its input unchanged
    pub fn is_noop(&self) -> bool {
        !self.remove.any() && !self.normalize
    }

    pub fn clean(&self, text: &str) -> String {
        let mut out = text.to_string();
        if self.remove.headers {
            out = strip_header(&out);
        }
        if self.remove.footers {
            out = strip_footer(&out);
        }
        if self.remove.quotes {
            out = strip_quoting(&out);
        }
        if self.normalize {
            out = normalize_whitespace(&out);
        }
        out
    }
}

/// Everything after the first blank line. Posts without a blank
/// line have no recognisable header and come back empty.
pub fn strip_header(text: &str) -> String {
    match text.split_once("\n\n") {
        Some((_, body)) => body.to_string(),
        None            => String::new(),
    }
}

/// Drop the signature: everything from the last line made only of
/// dashes (or blank) onwards, unless that line is the first one.
pub fn strip_footer(text: &str) -> String {
    let lines: Vec<&str> = text.trim().split('\n').collect();

    let cut = lines
        .iter()
        .rposition(|line| line.trim().trim_matches('-').is_empty());

    match cut {
        Some(n) if n > 0 => lines[..n].join("\n"),
        _                => text.to_string(),
    }
}

/// Drop quoted lines and reply attributions.
pub fn strip_quoting(text: &str) -> String {
    text.split('\n')
        .filter(|line| !is_quote_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_quote_line(line: &str) -> bool {
    const ANYWHERE: [&str; 5] = ["writes in", "writes:", "wrote:", "says:", "said:"];
    const LEADING:  [&str; 4] = ["In article", "Quoted from", "|", ">"];

    ANYWHERE.iter().any(|m| line.contains(m)) || LEADING.iter().any(|m| line.starts_with(m))
}

/// Collapse whitespace noise while keeping paragraph breaks.
pub fn normalize_whitespace(text: &str) -> String {
    let chars: String = text
        .chars()
        .map(|c| match c {
            '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
            '\r' => '\n',
            c if c.is_control() && c != '\n' => ' ',
            c => c,
        })
        .collect();

    let lines: String = chars
        .lines()
        .map(|line| line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    let mut result   = String::with_capacity(lines.len());
    let mut newlines = 0usize;
    for c in lines.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                result.push(c);
            }
        } else {
            newlines = 0;
            result.push(c);
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = "From: someone@example.edu\nSubject: Re: ray tracing\n\n\
In article <1993Apr1@example.edu> bob@example.edu writes:\n\
> Does anyone know a fast renderer?\n\
Try POV-Ray, it handles\tcomplex   scenes.\n\
\n\
--\n\
Alice, Graphics Lab";

    #[test]
    fn test_strip_header_keeps_body() {
        let body = strip_header(POST);
        assert!(!body.contains("Subject:"));
        assert!(body.starts_with("In article"));
    }

    #[test]
    fn test_strip_header_without_blank_line() {
        assert_eq!(strip_header("just one line"), "");
    }

    #[test]
    fn test_strip_footer_drops_signature() {
        let out = strip_footer(POST);
        assert!(!out.contains("Graphics Lab"));
        assert!(out.contains("POV-Ray"));
    }

    #[test]
    fn test_strip_footer_without_separator_is_identity() {
        assert_eq!(strip_footer("no\nsignature"), "no\nsignature");
    }

    #[test]
    fn test_strip_quoting() {
        let out = strip_quoting(POST);
        assert!(!out.contains("fast renderer"));
        assert!(!out.contains("writes:"));
        assert!(out.contains("POV-Ray"));
    }

    #[test]
    fn test_full_clean() {
        let cleaner = TextCleaner::new(RemoveParts::all()).with_normalize(true);
        assert_eq!(cleaner.clean(POST), "Try POV-Ray, it handles complex scenes.");
    }

    #[test]
    fn test_default_is_noop() {
        let cleaner = TextCleaner::default();
        assert!(cleaner.is_noop());
        assert_eq!(cleaner.clean(POST), POST);
    }

    #[test]
    fn test_normalize_collapses_blank_lines() {
        let out = normalize_whitespace("a  b\n\n\n\n\nc\x01d");
        assert_eq!(out, "a b\n\nc d");
    }
}
