use ragchat_memory::SearchResult;

pub(crate) const DOC_OPEN: &str = "<doc>";
pub(crate) const DOC_CLOSE: &str = "</doc>";

/// Join retrieved chunks into one context blob, keeping rank order.
///
/// Each chunk is wrapped as `<doc>\n{text}\n</doc>`; chunks are separated by
/// a newline. No hits yields an empty string.
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("{DOC_OPEN}\n{}\n{DOC_CLOSE}", r.record.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_memory::VectorRecord;

    fn hit(text: &str, score: f32) -> SearchResult {
        SearchResult {
            record: VectorRecord::new(text, vec![1.0], text),
            score,
        }
    }

    #[test]
    fn test_format_keeps_rank_order() {
        let ctx = format_context(&[hit("best", 0.9), hit("next", 0.5)]);
        assert_eq!(ctx, "<doc>\nbest\n</doc>\n<doc>\nnext\n</doc>");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_context(&[]), "");
    }
}
