mod support;

use support::TestDeck;

#[test]
fn view_and_theme_persist() {
    let deck = TestDeck::new();

    let defaults = deck.json(&["settings"]);
    assert_eq!(defaults["data"]["currentView"], "LIST");
    assert_eq!(defaults["data"]["theme"], "LIGHT");
    assert!(defaults["data"]["selectedTaskId"].is_null());

    let view = deck.json(&["view", "kanban"]);
    assert_eq!(view["data"]["currentView"], "KANBAN");

    let theme = deck.json(&[
        "theme",
        "custom",
        "--set",
        "primary=#123456",
        "--set",
        "radius = 4px",
    ]);
    assert_eq!(theme["data"]["theme"], "CUSTOM");
    assert_eq!(theme["data"]["customTheme"]["primary"], "#123456");
    assert_eq!(theme["data"]["customTheme"]["radius"], "4px");

    let snapshot = deck.read_snapshot();
    assert_eq!(snapshot["state"]["currentView"], "KANBAN");
    assert_eq!(snapshot["state"]["theme"], "CUSTOM");
    assert_eq!(snapshot["state"]["customTheme"]["primary"], "#123456");

    let shown = deck.json(&["settings"]);
    assert_eq!(shown["data"]["currentView"], "KANBAN");
    assert_eq!(shown["data"]["theme"], "CUSTOM");

    let plain = deck.json(&["theme", "dark"]);
    assert_eq!(plain["data"]["theme"], "DARK");
    assert!(plain["data"]["customTheme"].is_null());
    assert!(deck.read_snapshot()["state"]["customTheme"].is_null());
}

#[test]
fn mind_map_view_accepts_dash_form() {
    let deck = TestDeck::new();
    let view = deck.json(&["view", "mind-map"]);
    assert_eq!(view["data"]["currentView"], "MIND_MAP");
}

#[test]
fn invalid_settings_are_rejected() {
    let deck = TestDeck::new();
    let err = deck.json_err(&["view", "table"], 2);
    assert_eq!(err["command"], "view");
    deck.json_err(&["theme", "neon"], 2);
    deck.json_err(&["theme", "custom", "--set", "nokey"], 2);
    assert!(!deck.snapshot_path().exists());
}
