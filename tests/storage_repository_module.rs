use serde_json::json;
use stories::storage::{
    Activity, ActivityBundle, Step, StorageError, Story, StoryBundle, StoryStore,
};
use std::collections::BTreeMap;
use tempfile::tempdir;

fn story(id: &str, title: &str) -> Story {
    Story {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{title} description"),
        initial_state: json!({}),
        expected_outcomes: BTreeMap::from([("done".to_string(), true)]),
        completion_criteria: "everything ran".to_string(),
    }
}

fn activity(id: &str, story_id: &str, title: &str) -> Activity {
    Activity {
        id: id.to_string(),
        story_id: story_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        instructions: String::new(),
        prompt_template: "write-tests".to_string(),
        state: json!({"ready": false}),
        expected_outcome: String::new(),
    }
}

fn step(id: &str, activity_id: &str, order_index: i64) -> Step {
    Step {
        id: id.to_string(),
        activity_id: activity_id.to_string(),
        order_index,
        prompt: format!("prompt {id}"),
        input_request: String::new(),
        state_update_logic: String::new(),
        outcome_check: String::new(),
    }
}

#[test]
fn open_creates_parent_directories_and_schema() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("nested/state/stories.db");

    let store = StoryStore::open(&db_path).expect("open");
    store.create_story(&story("s1", "One")).expect("create");
    store.close().expect("close");

    let reopened = StoryStore::open(&db_path).expect("reopen");
    let loaded = reopened.get_story("s1").expect("get").expect("present");
    assert_eq!(loaded, story("s1", "One"));
    assert!(reopened.get_story("nope").expect("get").is_none());
}

#[test]
fn stories_and_activities_list_in_title_order() {
    let store = StoryStore::open_in_memory().expect("store");
    store.create_story(&story("b", "Beta")).expect("beta");
    store.create_story(&story("a", "Alpha")).expect("alpha");
    store.create_activity(&activity("x2", "a", "Write")).expect("x2");
    store.create_activity(&activity("x1", "a", "Scaffold")).expect("x1");
    store.create_activity(&activity("y1", "b", "Other")).expect("y1");

    let titles: Vec<_> = store
        .list_stories()
        .expect("list")
        .into_iter()
        .map(|s| s.title)
        .collect();
    assert_eq!(titles, ["Alpha", "Beta"]);

    let ids: Vec<_> = store
        .activities_for_story("a")
        .expect("activities")
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, ["x1", "x2"]);
}

#[test]
fn steps_order_by_index_then_insertion() {
    let store = StoryStore::open_in_memory().expect("store");
    store.create_step(&step("late", "act", 5)).expect("late");
    store.create_step(&step("tie-first", "act", 2)).expect("tie-first");
    store.create_step(&step("early", "act", 1)).expect("early");
    store.create_step(&step("tie-second", "act", 2)).expect("tie-second");
    store.create_step(&step("elsewhere", "other", 0)).expect("elsewhere");

    let ids: Vec<_> = store
        .steps_for_activity("act")
        .expect("steps")
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, ["early", "tie-first", "tie-second", "late"]);
}

#[test]
fn activity_state_updates_are_write_through() {
    let store = StoryStore::open_in_memory().expect("store");
    store.create_activity(&activity("x1", "s", "Scaffold")).expect("x1");

    store
        .update_activity_state("x1", &json!({"ready": true, "count": 2}))
        .expect("update");
    let loaded = store.get_activity("x1").expect("get").expect("present");
    assert_eq!(loaded.state, json!({"ready": true, "count": 2}));

    store
        .update_activity_state("missing", &json!({}))
        .expect("unknown id is a no-op");
}

#[test]
fn bundle_import_is_all_or_nothing() {
    let mut store = StoryStore::open_in_memory().expect("store");
    store.create_activity(&activity("taken", "elsewhere", "Taken")).expect("taken");

    let bundle = StoryBundle {
        story: story("fresh", "Fresh"),
        activities: vec![
            ActivityBundle {
                activity: activity("ok", "", "Ok"),
                steps: vec![step("ok-1", "", 1)],
            },
            ActivityBundle {
                activity: activity("taken", "", "Clash"),
                steps: Vec::new(),
            },
        ],
    };

    let err = store.import_bundle(&bundle).expect_err("duplicate activity id");
    assert!(matches!(err, StorageError::Sql { .. }));
    assert!(store.get_story("fresh").expect("get").is_none());
    assert!(store.get_activity("ok").expect("get").is_none());
    assert!(store.steps_for_activity("ok").expect("steps").is_empty());
}

#[test]
fn bundle_import_links_parents_and_counts_rows() {
    let mut store = StoryStore::open_in_memory().expect("store");
    let bundle = StoryBundle {
        story: story("fresh", "Fresh"),
        activities: vec![ActivityBundle {
            activity: activity("ok", "", "Ok"),
            steps: vec![step("ok-1", "", 1), step("ok-2", "", 2)],
        }],
    };

    let summary = store.import_bundle(&bundle).expect("import");
    assert_eq!((summary.activities, summary.steps), (1, 2));
    assert_eq!(
        store.get_activity("ok").expect("get").expect("present").story_id,
        "fresh"
    );
    assert_eq!(store.steps_for_activity("ok").expect("steps").len(), 2);
}
