use super::*;

#[test]
fn toolbar_cycles_through_all_five_states() {
    let mut controller = Controller::new();
    let seen = (0..6)
        .map(|_| {
            controller.toolbar_clicked(1);
            controller.state()
        })
        .collect::<Vec<_>>();
    assert_eq!(
        seen,
        vec![
            ColorState::Yellow,
            ColorState::Green,
            ColorState::Blue,
            ColorState::Red,
            ColorState::Off,
            ColorState::Yellow,
        ]
    );
}

#[test]
fn shortcut_toggles_same_color_back_off() {
    let mut machine = StateMachine::new();
    assert_eq!(machine.toggle(ColorState::Blue), ColorState::Blue);
    assert_eq!(machine.toggle(ColorState::Red), ColorState::Red);
    assert_eq!(machine.toggle(ColorState::Red), ColorState::Off);
    assert_eq!(
        machine.snapshot(),
        ExtensionState {
            active: false,
            color: state::YELLOW.into(),
        }
    );
}

#[test]
fn state_requests_reply_without_pushing() {
    let mut controller = Controller::new();
    controller.toolbar_clicked(3);
    let dispatch = controller.handle_message(4, ToController::GetExtensionState);
    assert_eq!(
        dispatch.reply,
        Some(ExtensionState {
            active: true,
            color: state::YELLOW.into(),
        })
    );
    assert!(dispatch.messages.is_empty());
}

#[test]
fn shortcut_and_turn_off_push_state_to_the_sender() {
    let mut controller = Controller::new();
    let dispatch = controller.handle_message(
        7,
        ToController::SetStateFromShortcut {
            state: ColorState::Green,
        },
    );
    assert_eq!(
        dispatch.messages,
        vec![Outgoing {
            tab: 7,
            message: ToRenderer::UpdateExtensionState {
                active: true,
                color: state::GREEN.into(),
            },
        }]
    );
    assert!(controller.is_tab_active(7));
    assert!(!controller.add_highlight_menu_visible());

    let dispatch = controller.handle_message(7, ToController::TurnOff);
    assert_eq!(
        dispatch.messages[0].message,
        ToRenderer::UpdateExtensionState {
            active: false,
            color: state::YELLOW.into(),
        }
    );
    assert!(!controller.is_tab_active(7));
    assert!(controller.add_highlight_menu_visible());

    controller.tab_removed(7);
    assert!(!controller.is_tab_active(7));
}

#[test]
fn add_highlight_menu_always_uses_yellow() -> Result<()> {
    let mut controller = Controller::new();
    let mut store = MemoryStore::new();
    controller.handle_message(
        1,
        ToController::SetStateFromShortcut {
            state: ColorState::Blue,
        },
    );
    let outgoing = controller.menu_clicked(
        1,
        MenuItem::AddHighlight,
        &mut store,
        &mut |_: &str| true,
    )?;
    assert_eq!(
        outgoing[0].message,
        ToRenderer::AddHighlight {
            color: state::YELLOW.into()
        }
    );
    Ok(())
}

#[test]
fn purge_declined_leaves_every_page_untouched() -> Result<()> {
    let mut browser = MockBrowser::new();
    let a = browser.open_tab("https://a.test/one", "<p>alpha words here</p>")?;
    let b = browser.open_tab("https://b.test/two", "<p>bravo words here</p>")?;
    for (tab, needle) in [(a, "alpha"), (b, "bravo")] {
        browser.select_text(tab, needle)?;
        browser.click_menu(tab, MenuItem::AddHighlight, &mut |_: &str| true)?;
    }
    let before = browser.store().keys()?;
    assert_eq!(before.len(), 2);

    let mut prompts = Vec::new();
    browser.click_menu(a, MenuItem::PurgeAllHighlights, &mut |prompt: &str| {
        prompts.push(prompt.to_string());
        false
    })?;

    assert_eq!(prompts, vec![controller::PURGE_PROMPT.to_string()]);
    assert_eq!(browser.store().keys()?, before);
    assert_eq!(browser.page(a)?.markers().len(), 1);
    Ok(())
}

#[test]
fn purge_confirmed_clears_all_pages_and_current_markers() -> Result<()> {
    let mut browser = MockBrowser::new();
    let a = browser.open_tab("https://a.test/one", "<p>alpha words here</p>")?;
    let b = browser.open_tab("https://b.test/two", "<p>bravo words here</p>")?;
    for (tab, needle) in [(a, "alpha"), (b, "bravo")] {
        browser.select_text(tab, needle)?;
        browser.click_menu(tab, MenuItem::AddHighlight, &mut |_: &str| true)?;
    }

    browser.click_menu(a, MenuItem::PurgeAllHighlights, &mut |_: &str| true)?;

    assert!(browser.store().is_empty());
    assert!(browser.page(a)?.markers().is_empty());
    // Only the tab that asked is told to unwrap; the other keeps its DOM
    // until it reloads.
    assert_eq!(browser.page(b)?.markers().len(), 1);
    let report = browser.reload(b)?;
    assert!(report.applied.is_empty());
    Ok(())
}

#[test]
fn keyboard_shortcuts_round_trip_through_the_controller() -> Result<()> {
    let mut browser = MockBrowser::new();
    let tab = browser.open_tab(STORY_URL, "<p>The quick brown fox</p>")?;

    browser.press_key(tab, "b", None)?;
    assert_eq!(browser.controller().state(), ColorState::Blue);
    assert!(browser.page(tab)?.is_active());
    assert_eq!(browser.page(tab)?.color(), state::BLUE);

    browser.press_key(tab, "b", None)?;
    assert_eq!(browser.controller().state(), ColorState::Off);
    assert!(!browser.page(tab)?.is_active());

    browser.press_key(tab, "r", None)?;
    browser.press_key(tab, "Escape", None)?;
    assert_eq!(browser.controller().state(), ColorState::Off);
    Ok(())
}

#[test]
fn color_state_names_parse_case_insensitively() -> Result<()> {
    assert_eq!("Green".parse::<ColorState>()?, ColorState::Green);
    assert_eq!(" off ".parse::<ColorState>()?, ColorState::Off);
    assert_eq!(
        "purple".parse::<ColorState>(),
        Err(Error::UnknownColorState("purple".into()))
    );
    Ok(())
}

#[test]
fn two_tabs_on_one_page_share_a_key_and_last_write_wins() -> Result<()> {
    let mut browser = MockBrowser::new();
    let html = "<p>shared page with two phrases</p>";
    let first = browser.open_tab("https://same.test/page", html)?;
    let second = browser.open_tab("https://same.test/page?tab=2", html)?;

    browser.select_text(first, "shared")?;
    browser.click_menu(first, MenuItem::AddHighlight, &mut |_: &str| true)?;
    browser.select_text(second, "phrases")?;
    browser.click_menu(second, MenuItem::AddHighlight, &mut |_: &str| true)?;

    let stored = browser
        .store()
        .get("highlights_same.test/page")?
        .unwrap_or_default();
    let texts = stored.iter().map(|r| r.text.as_str()).collect::<Vec<_>>();
    assert_eq!(texts, vec!["phrases"]);
    Ok(())
}
