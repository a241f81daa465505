use std::collections::VecDeque;
use std::str::Lines;

use tracing::debug;

use super::fields::{QuoteTracker, Step};

/// Lazily assemble complete `( ... )` tuples from a dump, one pass, top to bottom.
///
/// Yields the text between a tuple's outer parentheses. Tuples may span several
/// physical lines; continuation lines are trimmed and joined with one space.
pub fn rows(text: &str) -> Rows<'_> {
    Rows {
        lines: text.lines(),
        current: None,
        depth: 0,
        quote: QuoteTracker::default(),
        ready: VecDeque::new(),
    }
}

pub struct Rows<'a> {
    lines: Lines<'a>,
    current: Option<String>,
    depth: usize,
    quote: QuoteTracker,
    ready: VecDeque<String>,
}

impl Iterator for Rows<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(row) = self.ready.pop_front() {
                return Some(row);
            }
            match self.lines.next() {
                Some(line) => self.feed_line(line),
                None => {
                    if let Some(partial) = self.current.take() {
                        debug!(chars = partial.len(), "dropping incomplete tuple at end of dump");
                    }
                    return None;
                }
            }
        }
    }
}

impl Rows<'_> {
    fn feed_line(&mut self, raw: &str) {
        let line = raw.trim();

        // Inside an open string every line is content, whatever it looks like.
        if !self.quote.in_quote() {
            if line.is_empty() || is_comment(line) {
                return;
            }
            if let Some(tuples) = values_clause(line) {
                self.flush_partial();
                self.scan(tuples);
                return;
            }
            if opens_tuple(line) {
                self.flush_partial();
            } else if self.current.is_none() {
                // Between tuples: `LOCK TABLES`, `SET ...` and other statements.
                // Inside an open tuple the same text is an unquoted value.
                return;
            }
        }

        if let Some(acc) = self.current.as_mut() {
            acc.push(' ');
        }
        self.scan(line);
    }

    /// A new tuple began before the previous one closed: hand over what we have.
    fn flush_partial(&mut self) {
        if let Some(partial) = self.current.take() {
            let partial = partial.trim_end().trim_end_matches([',', ';']).trim_end();
            let partial = partial.strip_suffix(')').unwrap_or(partial);
            self.ready.push_back(partial.to_string());
        }
        self.depth = 0;
        self.quote = QuoteTracker::default();
    }

    fn scan(&mut self, text: &str) {
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            let Some(acc) = self.current.as_mut() else {
                // Between tuples only separators appear; anything else is noise.
                if c == '(' {
                    self.current = Some(String::new());
                    self.depth = 1;
                }
                continue;
            };

            if self.quote.in_quote() {
                if self.quote.step(c, chars.peek().copied()) == Step::Doubled {
                    acc.push(c);
                    chars.next();
                }
                acc.push(c);
                continue;
            }

            match c {
                '(' => {
                    self.depth += 1;
                    acc.push(c);
                }
                ')' => {
                    self.depth = self.depth.saturating_sub(1);
                    let terminated = matches!(
                        chars.clone().find(|c| !c.is_whitespace()),
                        None | Some(',') | Some(';')
                    );
                    if self.depth == 0 && terminated {
                        if let Some(row) = self.current.take() {
                            self.ready.push_back(row);
                        }
                    } else {
                        acc.push(c);
                    }
                }
                _ => {
                    self.quote.step(c, chars.peek().copied());
                    acc.push(c);
                }
            }
        }
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with("--") || line.starts_with("/*") || line.starts_with('#')
}

/// `(` at line start, or a `,(` separator some dumps put at the start of the next line.
fn opens_tuple(line: &str) -> bool {
    line.starts_with('(')
        || line
            .strip_prefix(',')
            .is_some_and(|rest| rest.trim_start().starts_with('('))
}

/// Tuple text following `VALUES` on an `INSERT INTO` line, if any.
fn values_clause(line: &str) -> Option<&str> {
    let upper = line.to_ascii_uppercase();
    if !upper.starts_with("INSERT") {
        return None;
    }
    let idx = upper.find("VALUES")?;
    Some(&line[idx + "VALUES".len()..])
}
