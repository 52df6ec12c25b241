mod support;

use support::TestDeck;

#[test]
fn tag_add_edit_list() {
    let deck = TestDeck::new();
    let value = deck.json(&["tag", "add", "Work", "--color", "#ff0000"]);
    assert_eq!(value["data"]["name"], "Work");
    assert_eq!(value["data"]["color"], "#ff0000");
    let id = value["data"]["id"].as_str().unwrap().to_string();

    let default_color = deck.json(&["tag", "add", "Home"]);
    assert_eq!(default_color["data"]["color"], "#1890ff");

    let edited = deck.json(&["tag", "edit", &id, "--name", "Office"]);
    assert_eq!(edited["data"]["name"], "Office");
    assert_eq!(edited["data"]["color"], "#ff0000");

    deck.add_task("Standup", &["--tag", &id]);
    let listed = deck.json(&["tag", "list"]);
    let entries = listed["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let office = entries.iter().find(|entry| entry["id"] == id.as_str()).unwrap();
    assert_eq!(office["tasks"], 1);

    deck.json_err(&["tag", "add", "  "], 2);
    deck.json_err(&["tag", "edit", &id], 2);
    let err = deck.json_err(&["tag", "edit", "missing", "--name", "x"], 3);
    assert_eq!(err["error"]["kind"], "not_found");
}

#[test]
fn tag_delete_strips_references() {
    let deck = TestDeck::new();
    let work = deck.add_tag("Work");
    let home = deck.add_tag("Home");
    let a = deck.add_task("A", &["--tag", &work, "--tag", &home]);
    let b = deck.add_task("B", &["--tag", &work]);
    let c = deck.add_task("C", &[]);

    let removed = deck.json(&["tag", "rm", &work]);
    assert_eq!(removed["data"]["tasks_updated"], 2);

    let snapshot = deck.read_snapshot();
    let tasks = &snapshot["state"]["tasks"];
    assert_eq!(tasks[&a]["tags"], serde_json::json!([home]));
    assert_eq!(tasks[&b]["tags"], serde_json::json!([]));
    assert_eq!(tasks[&c]["tags"], serde_json::json!([]));
    assert!(snapshot["state"]["tags"].get(&work).is_none());

    deck.json_err(&["tag", "rm", &work], 3);
}

#[test]
fn folder_filters_tasks() {
    let deck = TestDeck::new();
    let work = deck.add_tag("Work");
    deck.add_task("urgent work", &["--priority", "HIGH", "--tag", &work]);
    deck.add_task("calm work", &["--priority", "LOW", "--tag", &work]);
    deck.add_task("urgent home", &["--priority", "HIGH"]);

    let folder = deck.json(&[
        "folder",
        "add",
        "Urgent work",
        "--filter",
        "priority=HIGH",
        "--filter",
        &format!("tag={work}"),
    ]);
    assert_eq!(folder["data"]["filter"]["priority"], "HIGH");
    let id = folder["data"]["id"].as_str().unwrap().to_string();

    let tasks = deck.json(&["folder", "tasks", &id]);
    assert_eq!(tasks["data"]["folder"]["name"], "Urgent work");
    let matched = tasks["data"]["tasks"].as_array().unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0]["title"], "urgent work");

    deck.json(&["folder", "edit", &id, "--filter", "priority=HIGH"]);
    let tasks = deck.json(&["folder", "tasks", &id]);
    assert_eq!(tasks["data"]["tasks"].as_array().unwrap().len(), 2);

    let listed = deck.json(&["folder", "list"]);
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    deck.json(&["folder", "rm", &id]);
    let err = deck.json_err(&["folder", "tasks", &id], 3);
    assert_eq!(err["command"], "folder tasks");
}

#[test]
fn folder_rejects_unusable_filters() {
    let deck = TestDeck::new();
    deck.json_err(&["folder", "add", "Bad", "--filter", "status=DONE"], 2);
    deck.json_err(&["folder", "add", "Bad", "--filter", "dueDateBefore=soon"], 2);
    deck.json_err(&["folder", "add", "Bad", "--filter", "status"], 2);
    deck.json_err(&["folder", "add", " ", "--filter", "status=TODO"], 2);

    let empty = deck.json(&["folder", "add", "Everything"]);
    let id = empty["data"]["id"].as_str().unwrap().to_string();
    deck.add_task("one", &[]);
    deck.add_task("two", &[]);
    let tasks = deck.json(&["folder", "tasks", &id]);
    assert_eq!(tasks["data"]["tasks"].as_array().unwrap().len(), 2);

    deck.json_err(&["folder", "edit", &id], 2);
}
