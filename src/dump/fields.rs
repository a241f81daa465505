/// Quote state shared by the tokenizer and the field splitter, so both agree
/// on where a quoted span starts and ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteTracker {
    delim: Option<char>,
    escaped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Opened,
    Closed,
    /// `qq` inside a span: one literal quote, caller must skip the second char.
    Doubled,
    Text,
}

impl QuoteTracker {
    pub fn in_quote(&self) -> bool {
        self.delim.is_some()
    }

    pub fn step(&mut self, c: char, next: Option<char>) -> Step {
        let Some(q) = self.delim else {
            if c == '\'' || c == '"' {
                self.delim = Some(c);
                return Step::Opened;
            }
            return Step::Text;
        };

        if self.escaped {
            self.escaped = false;
            return Step::Text;
        }
        if c == '\\' {
            self.escaped = true;
            return Step::Text;
        }
        if c == q {
            if next == Some(q) {
                return Step::Doubled;
            }
            self.delim = None;
            return Step::Closed;
        }
        Step::Text
    }
}

/// Split the interior of one tuple into raw fields.
///
/// Quote delimiters are dropped; escape sequences are left in place for
/// [`super::normalize::unescape`]. A doubled quote inside a span is collapsed
/// here since the closing-quote decision depends on it.
pub fn split_fields(row: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut buf = String::new();
    let mut quote = QuoteTracker::default();
    let mut prev: Option<char> = None;
    let mut chars = row.chars().peekable();

    while let Some(c) = chars.next() {
        if !quote.in_quote() && c == ',' && prev != Some('\\') {
            fields.push(buf.trim().to_string());
            buf.clear();
            prev = Some(c);
            continue;
        }

        match quote.step(c, chars.peek().copied()) {
            Step::Opened | Step::Closed => {}
            Step::Doubled => {
                buf.push(c);
                chars.next();
            }
            Step::Text => buf.push(c),
        }
        prev = Some(c);
    }

    let last = buf.trim();
    if !last.is_empty() {
        fields.push(last.to_string());
    }
    fields
}
