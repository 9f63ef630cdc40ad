use page_highlighter::{Boundary, DomRange, HighlightStore, MemoryStore, PageRenderer};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;

const PAGE_URL: &str = "https://fuzz.test/article";

fn word_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        4 => "[a-z]{1,7}",
        1 => "[a-zé]{1,4}",
        1 => Just("the".to_string()),
    ]
    .boxed()
}

/// Paragraph text plus a non-empty selection given as char positions.
fn selection_strategy() -> BoxedStrategy<(String, usize, usize)> {
    vec(word_strategy(), 1..16)
        .prop_map(|words| words.join(" "))
        .prop_flat_map(|text| {
            let chars = text.chars().count();
            (Just(text), 0..chars, 1..=chars)
        })
        .prop_map(|(text, start, len)| {
            let chars = text.chars().count();
            let end = (start + len).min(chars);
            (text, start, end)
        })
        .boxed()
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(offset, _)| offset)
}

fn page_html(paragraph: &str) -> String {
    format!("<div><h2>0123 4567</h2><p>0000 1111</p><p>{paragraph}</p><p>9 8 7</p></div>")
}

fn assert_capture_survives_reload(text: &str, start: usize, end: usize) -> TestCaseResult {
    let html = page_html(text);
    let selected = &text[byte_offset(text, start)..byte_offset(text, end)];
    let mut store = MemoryStore::new();

    let mut page = PageRenderer::from_html(PAGE_URL, &html)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    let paragraph = page.dom().elements_by_tag_name("p")[1];
    let node = page.dom().children(paragraph)[0];
    page.set_selection(DomRange::new(
        Boundary::new(node, byte_offset(text, start)),
        Boundary::new(node, byte_offset(text, end)),
    ));
    let created = page
        .capture_selection("#cff09f", &mut store)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    prop_assert!(created.is_some());

    let stored = store
        .get(&page.storage_key())
        .map_err(|err| TestCaseError::fail(err.to_string()))?
        .unwrap_or_default();
    prop_assert_eq!(stored.len(), 1);
    prop_assert_eq!(stored.records()[0].text.as_str(), selected);
    prop_assert_eq!(stored.records()[0].parent_index, 2);

    let mut reloaded = PageRenderer::from_html(PAGE_URL, &html)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    let report = reloaded
        .load(&store)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    prop_assert_eq!(report.applied.len(), 1);
    prop_assert!(report.skipped.is_empty());
    prop_assert_eq!(reloaded.dom().text_content(report.applied[0]), selected);
    prop_assert_eq!(
        reloaded.dom().text_content(reloaded.dom().root()),
        page.dom().text_content(page.dom().root())
    );
    prop_assert_eq!(reloaded.extract(), stored);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn captured_selection_is_restored_after_reload((text, start, end) in selection_strategy()) {
        assert_capture_survives_reload(&text, start, end)?;
    }

    #[test]
    fn html_parser_never_panics_on_generated_markup(words in vec(word_strategy(), 0..12), tags in vec(prop_oneof![Just("p"), Just("b"), Just("br"), Just("/p"), Just("!--"), Just("li")], 0..12)) {
        let mut html = String::new();
        for (index, word) in words.iter().enumerate() {
            if let Some(tag) = tags.get(index) {
                html.push('<');
                html.push_str(tag);
                html.push('>');
            }
            html.push_str(word);
        }
        let outcome = std::panic::catch_unwind(|| page_highlighter::parse_html(&html));
        prop_assert!(outcome.is_ok(), "parse_html panicked for generated markup:\n{html}");
    }
}
