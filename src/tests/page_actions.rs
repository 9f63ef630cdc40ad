use super::*;

const THREE_PARAGRAPHS: &str = r#"
<main>
  <p id='a'>Alpha paragraph talks about apples.</p>
  <p id='b'>Bravo paragraph talks about bananas.</p>
  <p id='c'>Charlie paragraph talks about cherries.</p>
  <input id='search' value='apples'>
</main>
"#;

fn page_with_three_highlights(store: &mut MemoryStore) -> Result<PageRenderer> {
    let mut page = PageRenderer::from_html(STORY_URL, THREE_PARAGRAPHS)?;
    for (needle, color) in [("cherries", state::RED), ("apples", state::YELLOW), ("bananas", state::GREEN)] {
        page.select_text(needle)?;
        page.capture_selection(color, store)?;
    }
    Ok(page)
}

#[test]
fn collapsed_or_missing_selection_is_a_no_op() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut page = PageRenderer::from_html(STORY_URL, "<p>Nothing selected</p>")?;
    assert_eq!(page.capture_selection(state::YELLOW, &mut store)?, None);

    let range = page.select_text("selected")?;
    page.set_selection(DomRange::new(range.start, range.start));
    assert_eq!(page.capture_selection(state::YELLOW, &mut store)?, None);
    assert!(store.is_empty());
    assert!(page.markers().is_empty());
    Ok(())
}

#[test]
fn selection_crossing_an_element_boundary_is_dropped() -> Result<()> {
    let html = "<p>one <b>two</b> three</p>";
    let mut store = MemoryStore::new();
    let mut page = PageRenderer::from_html(STORY_URL, html)?;
    let start = page.select_text("one")?.start;
    let end = page.select_text("two")?.end;
    page.set_selection(DomRange::new(start, end));

    assert_eq!(page.capture_selection(state::YELLOW, &mut store)?, None);
    assert_eq!(page.dom().to_html(), html);
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn stored_order_follows_document_order() -> Result<()> {
    let mut store = MemoryStore::new();
    let page = page_with_three_highlights(&mut store)?;

    let stored = store.get(&page.storage_key())?.unwrap_or_default();
    let texts = stored.iter().map(|r| r.text.as_str()).collect::<Vec<_>>();
    assert_eq!(texts, vec!["apples", "bananas", "cherries"]);
    let indexes = stored.iter().map(|r| r.parent_index).collect::<Vec<_>>();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert_eq!(stored, page.extract());
    Ok(())
}

#[test]
fn deleting_one_marker_keeps_the_other_records_unchanged() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut page = page_with_three_highlights(&mut store)?;
    let before = store.get(&page.storage_key())?.unwrap_or_default();

    let bananas = page.markers()[1];
    assert!(page.ctrl_click(bananas, &mut store)?);

    let after = store.get(&page.storage_key())?.unwrap_or_default();
    assert_eq!(after.len(), 2);
    assert_eq!(after.records()[0], before.records()[0]);
    assert_eq!(after.records()[1], before.records()[2]);
    assert!(after.iter().all(|r| r.text != "bananas"));

    let b = page
        .dom()
        .by_id("b")
        .ok_or_else(|| Error::NodeNotFound("#b".into()))?;
    assert_eq!(page.dom().children(b).len(), 1);
    Ok(())
}

#[test]
fn ctrl_click_on_plain_text_deletes_nothing() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut page = page_with_three_highlights(&mut store)?;
    let a = page
        .dom()
        .by_id("a")
        .ok_or_else(|| Error::NodeNotFound("#a".into()))?;
    assert!(!page.ctrl_click(a, &mut store)?);
    assert_eq!(page.markers().len(), 3);
    Ok(())
}

#[test]
fn toggling_visibility_twice_restores_every_color() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut page = page_with_three_highlights(&mut store)?;
    let rendered = |page: &PageRenderer| {
        page.markers()
            .into_iter()
            .map(|node| marker::rendered_background(page.dom(), node).unwrap_or_default())
            .collect::<Vec<_>>()
    };
    let original = rendered(&page);
    assert_eq!(original, vec![state::YELLOW, state::GREEN, state::RED]);

    assert!(!page.toggle_visibility()?);
    assert_eq!(rendered(&page), vec!["transparent"; 3]);
    assert_eq!(page.markers().len(), 3);

    assert!(page.toggle_visibility()?);
    assert_eq!(rendered(&page), original);
    Ok(())
}

#[test]
fn hidden_state_applies_to_new_and_restored_markers() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut page = page_with_three_highlights(&mut store)?;
    page.toggle_visibility()?;

    page.select_text("Charlie")?;
    let marker = page
        .capture_selection(state::BLUE, &mut store)?
        .ok_or_else(|| Error::NodeNotFound("marker".into()))?;
    assert_eq!(
        marker::rendered_background(page.dom(), marker).as_deref(),
        Some("transparent")
    );
    assert_eq!(marker::marker_color(page.dom(), marker), Some(state::BLUE));

    let report = page.load(&store)?;
    assert_eq!(report.applied.len(), 4);
    for node in page.markers() {
        assert_eq!(
            marker::rendered_background(page.dom(), node).as_deref(),
            Some("transparent")
        );
    }
    Ok(())
}

#[test]
fn clear_page_unwraps_markers_and_forgets_only_this_page() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut other = PageRenderer::from_html("https://example.com/other", "<p>Other words</p>")?;
    other.select_text("words")?;
    other.capture_selection(state::YELLOW, &mut store)?;

    let mut page = page_with_three_highlights(&mut store)?;
    page.handle_message(ToRenderer::ClearPageHighlights, &mut store)?;

    assert!(page.markers().is_empty());
    assert_eq!(
        page.dom().to_html(),
        parse_html(THREE_PARAGRAPHS)?.to_html()
    );
    assert_eq!(store.get(&page.storage_key())?, None);
    assert!(store.get("highlights_example.com/other")?.is_some());
    Ok(())
}

#[test]
fn shortcuts_map_to_controller_requests() -> Result<()> {
    let mut page = PageRenderer::from_html(STORY_URL, THREE_PARAGRAPHS)?;
    assert_eq!(
        page.handle_key("g", None)?,
        Some(ToController::SetStateFromShortcut {
            state: ColorState::Green
        })
    );
    assert_eq!(
        page.handle_key("R", None)?,
        Some(ToController::SetStateFromShortcut {
            state: ColorState::Red
        })
    );
    assert_eq!(page.handle_key("Escape", None)?, Some(ToController::TurnOff));
    assert_eq!(page.handle_key("x", None)?, None);
    assert_eq!(page.handle_key("Enter", None)?, None);

    assert_eq!(page.handle_key("h", None)?, None);
    assert!(!page.highlights_visible());
    Ok(())
}

#[test]
fn shortcuts_are_ignored_inside_editable_fields() -> Result<()> {
    let mut page = PageRenderer::from_html(
        STORY_URL,
        "<input id='name'><div contenteditable='true'><p id='inner'>typing</p></div>",
    )?;
    let input = page
        .dom()
        .by_id("name")
        .ok_or_else(|| Error::NodeNotFound("#name".into()))?;
    let inner = page
        .dom()
        .by_id("inner")
        .ok_or_else(|| Error::NodeNotFound("#inner".into()))?;

    assert_eq!(page.handle_key("y", Some(input))?, None);
    assert_eq!(page.handle_key("Escape", Some(inner))?, None);
    assert_eq!(page.handle_key("h", Some(inner))?, None);
    assert!(page.highlights_visible());
    Ok(())
}

#[test]
fn mouse_up_highlights_only_while_active_and_off_markers() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut page = PageRenderer::from_html(STORY_URL, THREE_PARAGRAPHS)?;

    page.select_text("apples")?;
    assert_eq!(page.mouse_up(None, &mut store)?, None);

    page.handle_message(
        ToRenderer::UpdateExtensionState {
            active: true,
            color: state::RED.into(),
        },
        &mut store,
    )?;
    let marker = page
        .mouse_up(None, &mut store)?
        .ok_or_else(|| Error::NodeNotFound("marker".into()))?;
    assert_eq!(marker::marker_color(page.dom(), marker), Some(state::RED));

    page.select_text("bananas")?;
    assert_eq!(page.mouse_up(Some(marker), &mut store)?, None);
    assert_eq!(page.markers().len(), 1);
    Ok(())
}

#[test]
fn marker_menu_opens_only_over_markers_and_deletes_its_target() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut page = page_with_three_highlights(&mut store)?;
    let a = page
        .dom()
        .by_id("a")
        .ok_or_else(|| Error::NodeNotFound("#a".into()))?;
    let cherries = page.markers()[2];

    assert!(!page.open_context_menu(a));
    assert_eq!(page.marker_menu(), None);
    assert!(!page.delete_from_context_menu(&mut store)?);

    assert!(page.open_context_menu(cherries));
    assert_eq!(page.marker_menu(), Some(cherries));
    page.dismiss_context_menu();
    assert!(!page.delete_from_context_menu(&mut store)?);
    assert_eq!(page.markers().len(), 3);

    page.open_context_menu(cherries);
    assert!(page.delete_from_context_menu(&mut store)?);
    assert_eq!(page.marker_menu(), None);
    assert_eq!(marker_texts(&page), vec!["apples", "bananas"]);
    let stored = store.get(&page.storage_key())?.unwrap_or_default();
    assert!(stored.iter().all(|r| r.text != "cherries"));
    Ok(())
}
