mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestDeck;

fn seed(deck: &TestDeck) -> (String, String) {
    let overdue = deck.add_task("late report", &["--due", "2024-06-14T09:00", "--priority", "HIGH"]);
    deck.add_task("upcoming", &["--due", "2024-06-16T10:00"]);
    deck.add_task("someday", &["--priority", "LOW"]);
    let done = deck.add_task("shipped", &["--due", "2024-06-10T09:00", "--priority", "HIGH"]);
    deck.json(&["task", "done", &done]);
    (overdue, done)
}

#[test]
fn stats_reports_counts_and_rates() {
    let deck = TestDeck::new();
    seed(&deck);

    let stats = deck.json(&["stats"]);
    let data = &stats["data"];
    assert_eq!(data["totalTasks"], 4);
    assert_eq!(data["completedTasks"], 1);
    assert_eq!(data["overdueTasks"], 1);
    assert_eq!(data["highPriorityTasks"], 2);
    assert_eq!(data["completionRate"], 25);
    assert_eq!(data["overdueRate"], 25);
    assert_eq!(data["averageCompletionTime"], 0.0);
    assert_eq!(data["tasksByStatus"]["TODO"], 3);
    assert_eq!(data["tasksByStatus"]["OVERDUE"], 0);
    assert_eq!(data["tasksByPriority"]["LOW"], 1);
}

#[test]
fn stats_on_empty_store() {
    let deck = TestDeck::new();
    let stats = deck.json(&["stats"]);
    assert_eq!(stats["data"]["totalTasks"], 0);
    assert!(stats["data"]["averageCompletionTime"].is_null());
    assert_eq!(stats["data"]["completionRate"], 0);
}

#[test]
fn overdue_is_evaluated_at_read_time() {
    let deck = TestDeck::new();
    deck.add_task("tomorrow", &["--due", "2024-06-16T09:00"]);

    let today = deck.json(&["stats"]);
    assert_eq!(today["data"]["overdueTasks"], 0);

    let output = deck
        .cmd_at("2024-06-17T09:00")
        .args(["stats", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let later: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(later["data"]["overdueTasks"], 1);

    let snapshot = deck.read_snapshot();
    let task = snapshot["state"]["tasks"].as_object().unwrap().values().next().unwrap();
    assert_eq!(task["status"], "TODO");
}

#[test]
fn board_groups_by_effective_status() {
    let deck = TestDeck::new();
    let (overdue, done) = seed(&deck);

    let board = deck.json(&["board"]);
    let columns = board["data"].as_array().unwrap();
    assert_eq!(columns.len(), 6);
    let column = |status: &str| -> Vec<String> {
        columns
            .iter()
            .find(|column| column["status"] == status)
            .unwrap()["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|task| task["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(column("OVERDUE"), vec![overdue]);
    assert_eq!(column("COMPLETED"), vec![done]);
    assert_eq!(column("TODO").len(), 2);
}

#[test]
fn calendar_groups_by_due_day() {
    let deck = TestDeck::new();
    seed(&deck);

    let calendar = deck.json(&["calendar"]);
    let days = calendar["data"].as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["date"], "2024-06-10");
    assert_eq!(days[1]["date"], "2024-06-14");
    assert_eq!(days[1]["overdue"], 1);
    assert_eq!(days[1]["high_priority"], 1);

    let bounded = deck.json(&["calendar", "--from", "2024-06-14", "--to", "2024-06-15"]);
    assert_eq!(bounded["data"].as_array().unwrap().len(), 1);

    deck.json_err(&["calendar", "--from", "2024-06-16", "--to", "2024-06-15"], 2);
    deck.json_err(&["calendar", "--from", "June"], 2);
}

#[test]
fn trend_counts_created_and_completed() {
    let deck = TestDeck::new();
    let output = deck
        .cmd_at("2024-06-13T08:00")
        .args(["task", "add", "early", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let early: Value = serde_json::from_slice(&output).unwrap();
    let early_id = early["data"]["id"].as_str().unwrap().to_string();
    deck.add_task("today", &[]);
    deck.json(&["task", "done", &early_id]);

    let trend = deck.json(&["trend", "--days", "3"]);
    let points = trend["data"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["date"], "2024-06-13");
    assert_eq!(points[0]["created"], 1);
    assert_eq!(points[2]["created"], 1);
    assert_eq!(points[2]["completed"], 1);

    let default_window = deck.json(&["trend"]);
    assert_eq!(default_window["data"].as_array().unwrap().len(), 7);

    deck.json_err(&["trend", "--days", "0"], 2);
    deck.json_err(&["trend", "--days", "400"], 2);
}

#[test]
fn stats_human_output() {
    let deck = TestDeck::new();
    seed(&deck);
    deck.cmd()
        .arg("stats")
        .assert()
        .success()
        .stdout(contains("Dashboard"))
        .stdout(contains("Overdue: 1 (25%)"));
}
