pub mod domain;
pub mod error;
pub mod protocol;

#[cfg(test)]
mod tests {
    use super::domain::{CategoryFilter, Quote, QuoteDraft, QuoteId};
    use super::error::ValidationError;

    #[test]
    fn quote_without_id_omits_field() {
        let quote = Quote::new(None, "text", "Life");
        let json = serde_json::to_string(&quote).expect("json");
        assert_eq!(json, r#"{"text":"text","category":"Life"}"#);
    }

    #[test]
    fn quote_id_is_a_bare_integer_on_the_wire() {
        let quote: Quote =
            serde_json::from_str(r#"{"id":42,"text":"t","category":"c"}"#).expect("json");
        assert_eq!(quote.id, Some(QuoteId(42)));
    }

    #[test]
    fn draft_trims_and_rejects_blank_fields() {
        let draft = QuoteDraft::parse("  hello  ", " Life ").expect("draft");
        assert_eq!(draft.text(), "hello");
        assert_eq!(draft.category(), "Life");

        assert_eq!(
            QuoteDraft::parse("   ", "Life"),
            Err(ValidationError::EmptyText)
        );
        assert_eq!(
            QuoteDraft::parse("hello", "\t"),
            Err(ValidationError::EmptyCategory)
        );
    }

    #[test]
    fn category_filter_parses_sentinel() {
        assert_eq!(CategoryFilter::from("all"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from("Life"),
            CategoryFilter::Only("Life".to_string())
        );
        assert_eq!(CategoryFilter::All.to_string(), "all");
    }

    #[test]
    fn category_filter_matches_exact_category() {
        let quote = Quote::new(None, "t", "Life");
        assert!(CategoryFilter::All.matches(&quote));
        assert!(CategoryFilter::from("Life").matches(&quote));
        assert!(!CategoryFilter::from("life").matches(&quote));
    }
}
