/// SQL string escapes, in priority order at each position.
const ESCAPES: &[(&str, char)] = &[
    ("''", '\''),
    ("\\r\\n", '\n'),
    ("\\n", '\n'),
    ("\\'", '\''),
    ("\\\\", '\\'),
];

/// Unescape a raw field in one left-to-right pass. Substituted output is never
/// rescanned, so `\\n` stays a backslash followed by `n`.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    'scan: while let Some(c) = rest.chars().next() {
        for (pattern, replacement) in ESCAPES {
            if let Some(after) = rest.strip_prefix(pattern) {
                out.push(*replacement);
                rest = after;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}
