use crate::app::command_support::{
    build_runner, ensure_state_root, load_settings, open_store,
};
use crate::orchestration::RunSummary;
use crate::prompts::{prompt_names, prompt_template, render_prompt};
use crate::storage::StoryStore;
use crate::templates::{
    import_bundle_file, seed_stories, SeedOutcome, SeedStory, EXAMPLE_SEEDS, TEST_SEEDS,
};
use std::path::Path;

fn single_arg<'a>(args: &'a [String], usage: &str) -> Result<&'a str, String> {
    match args {
        [value] => Ok(value.as_str()),
        _ => Err(format!("usage: {usage}")),
    }
}

fn open_default_store() -> Result<StoryStore, String> {
    let paths = ensure_state_root()?;
    let settings = load_settings(&paths)?;
    open_store(&paths, &settings)
}

fn close_store(store: StoryStore) -> Result<(), String> {
    store.close().map_err(|e| e.to_string())
}

pub fn cmd_list() -> Result<String, String> {
    let store = open_default_store()?;
    let stories = store.list_stories().map_err(|e| e.to_string())?;
    close_store(store)?;
    if stories.is_empty() {
        return Ok("No stories found. Run `stories init` to create example stories.".to_string());
    }

    let mut lines = vec!["Available stories:".to_string(), String::new()];
    for (index, story) in stories.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, story.title));
        lines.push(format!("   ID: {}", story.id));
        lines.push(format!("   {}", story.description));
    }
    Ok(lines.join("\n"))
}

pub fn cmd_show(args: &[String]) -> Result<String, String> {
    let story_id = single_arg(args, "show <story-id>")?;
    let store = open_default_store()?;
    let story = store
        .get_story(story_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("story not found: {story_id}"))?;

    let mut lines = vec![
        format!("Story: {}", story.title),
        format!("id={}", story.id),
        format!("description={}", story.description),
        format!("completion_criteria={}", story.completion_criteria),
    ];
    if !story.expected_outcomes.is_empty() {
        let outcomes = story
            .expected_outcomes
            .iter()
            .map(|(name, required)| format!("{name}={required}"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("expected_outcomes={outcomes}"));
    }

    let activities = store
        .activities_for_story(&story.id)
        .map_err(|e| e.to_string())?;
    lines.push(String::new());
    lines.push(format!("Activities ({}):", activities.len()));
    for activity in activities {
        let steps = store
            .steps_for_activity(&activity.id)
            .map_err(|e| e.to_string())?;
        lines.push(format!(
            "- {} ({}) steps={}",
            activity.title,
            activity.id,
            steps.len()
        ));
        lines.push(format!(
            "  state={}",
            serde_json::to_string(&activity.state).unwrap_or_default()
        ));
    }
    close_store(store)?;
    Ok(lines.join("\n"))
}

fn summary_line(summary: &RunSummary) -> String {
    format!(
        "activities={} steps={} completed={} failed={} skipped={} simulated={}",
        summary.activities,
        summary.steps,
        summary.completed,
        summary.failed,
        summary.skipped,
        summary.simulated
    )
}

pub fn cmd_run(args: &[String]) -> Result<String, String> {
    let story_id = single_arg(args, "run <story-id>")?;
    let paths = ensure_state_root()?;
    let mut runner = build_runner(&paths)?;
    println!("Starting story: {story_id}\n");
    let result = runner.run_story(story_id);
    runner.close();
    let summary = result.map_err(|e| e.to_string())?;
    Ok(format!(
        "Story completed successfully!\n{}",
        summary_line(&summary)
    ))
}

pub fn cmd_continue(args: &[String]) -> Result<String, String> {
    let story_id = single_arg(args, "continue <story-id>")?;
    let paths = ensure_state_root()?;
    let mut runner = build_runner(&paths)?;
    println!("Continuing story: {story_id}\n");
    let result = runner.continue_story(story_id);
    runner.close();
    let summary = result.map_err(|e| e.to_string())?;
    Ok(format!(
        "Story continued successfully!\n{}",
        summary_line(&summary)
    ))
}

pub fn cmd_activity(args: &[String]) -> Result<String, String> {
    let activity_id = single_arg(args, "activity <activity-id>")?;
    let paths = ensure_state_root()?;
    let mut runner = build_runner(&paths)?;
    println!("Running activity: {activity_id}\n");
    let result = runner.run_activity(activity_id);
    runner.close();
    let summary = result.map_err(|e| e.to_string())?;
    Ok(format!(
        "Activity completed successfully!\n{}",
        summary_line(&summary)
    ))
}

fn seed(seeds: &[SeedStory]) -> Result<Vec<String>, String> {
    let mut store = open_default_store()?;
    let outcomes = seed_stories(&mut store, seeds).map_err(|e| e.to_string())?;
    close_store(store)?;
    Ok(outcomes
        .into_iter()
        .map(|outcome| match outcome {
            SeedOutcome::Created { story_id, summary } => format!(
                "created story `{story_id}` (activities={} steps={})",
                summary.activities, summary.steps
            ),
            SeedOutcome::AlreadyExists { story_id } => {
                format!("story `{story_id}` already exists, skipping")
            }
        })
        .collect())
}

pub fn cmd_init() -> Result<String, String> {
    let mut lines = seed(EXAMPLE_SEEDS)?;
    lines.push("Example stories ready. Run `stories list` to see them.".to_string());
    Ok(lines.join("\n"))
}

pub fn cmd_test() -> Result<String, String> {
    let mut lines = seed(TEST_SEEDS)?;
    lines.push("Test stories ready:".to_string());
    lines.push("  stories run hello-claude   # two-step test".to_string());
    lines.push("  stories run quick-test     # single step".to_string());
    Ok(lines.join("\n"))
}

pub fn cmd_import(args: &[String]) -> Result<String, String> {
    let file = single_arg(args, "import <file>")?;
    let mut store = open_default_store()?;
    let (story_id, summary) =
        import_bundle_file(&mut store, Path::new(file)).map_err(|e| e.to_string())?;
    close_store(store)?;
    Ok(format!(
        "imported story `{story_id}` (activities={} steps={})",
        summary.activities, summary.steps
    ))
}

pub fn cmd_prompts(args: &[String]) -> Result<String, String> {
    match args {
        [] => Ok(prompt_names()
            .map(|name| format!("{name:22} {}", prompt_template(name).unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n")),
        [name, context @ ..] => {
            let context = context.join(" ");
            render_prompt(name, Some(&context)).map_err(|e| e.to_string())
        }
    }
}
