use super::*;
use shared::error::ErrorCode;
use std::io::Write;

fn post(text: &str, category: &str, id: Option<i64>) -> PostQuoteRequest {
    PostQuoteRequest {
        id: id.map(QuoteId),
        text: text.to_string(),
        category: category.to_string(),
    }
}

#[test]
fn seeded_book_assigns_sequential_ids() {
    let book = QuoteBook::seeded();
    let ids: Vec<Option<QuoteId>> = book.quotes().iter().map(|quote| quote.id).collect();
    assert_eq!(
        ids,
        vec![Some(QuoteId(1)), Some(QuoteId(2)), Some(QuoteId(3))]
    );
}

#[test]
fn seed_ids_are_kept_and_counter_continues_after_highest() {
    let mut book = QuoteBook::new(vec![
        Quote::with_id(40, "forty", "X"),
        Quote::new(None, "anonymous", "X"),
    ]);
    assert_eq!(book.quotes()[1].id, Some(QuoteId(41)));

    let created = book.create(post("next", "X", None)).expect("create");
    assert_eq!(created.id, Some(QuoteId(42)));
}

#[test]
fn create_overwrites_client_id_and_trims() {
    let mut book = QuoteBook::seeded();
    let created = book
        .create(post("  fresh  ", " New ", Some(1_700_000_000_000)))
        .expect("create");

    assert_eq!(created, Quote::with_id(4, "fresh", "New"));
    assert_eq!(book.quotes().last(), Some(&created));
}

#[test]
fn create_rejects_blank_fields() {
    let mut book = QuoteBook::seeded();

    let err = book.create(post(" ", "X", None)).expect_err("blank text");
    assert_eq!(err.code, ErrorCode::Validation);
    let err = book.create(post("t", "", None)).expect_err("blank category");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(book.quotes().len(), 3);
}

#[test]
fn list_filters_by_category() {
    let book = QuoteBook::seeded();
    let only = book.list(&ListQuotesQuery {
        category: Some("Engineering".to_string()),
    });
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].category, "Engineering");
    assert_eq!(book.list(&ListQuotesQuery::default()).len(), 3);
}

#[test]
fn load_seed_reads_quote_array() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"[{{"id":7,"text":"seeded","category":"S"}}]"#).expect("write");

    let quotes = load_seed(file.path()).expect("seed");
    assert_eq!(quotes, vec![Quote::with_id(7, "seeded", "S")]);
}

#[test]
fn load_seed_rejects_non_array() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{"text":"t","category":"c"}}"#).expect("write");

    assert!(load_seed(file.path()).is_err());
}
