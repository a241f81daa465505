pub mod fields;
pub mod normalize;
pub mod tokenizer;

/// Three-stage pipeline: dump text → row tuples → raw fields → unescaped fields.
pub fn parse_dump(text: &str) -> impl Iterator<Item = Vec<String>> + '_ {
    tokenizer::rows(text).map(|row| {
        fields::split_fields(&row)
            .iter()
            .map(|f| normalize::unescape(f))
            .collect()
    })
}
