use super::{Activity, Step, Story, StorageError, StoryBundle};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub activities: usize,
    pub steps: usize,
}

/// Stories, activities and steps in one SQLite database, behind a single
/// connection. JSON columns are stored as text.
pub struct StoryStore {
    connection: Connection,
}

impl StoryStore {
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateParent {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let connection = Connection::open(db_path).map_err(|source| StorageError::Open {
            path: db_path.display().to_string(),
            source,
        })?;
        let store = Self { connection };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let connection = Connection::open_in_memory().map_err(|source| StorageError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        let store = Self { connection };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<(), StorageError> {
        self.connection.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS stories (
                id TEXT PRIMARY KEY,
                title TEXT,
                description TEXT,
                initial_state JSON,
                expected_outcomes JSON,
                completion_criteria TEXT
            );

            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                story_id TEXT,
                title TEXT,
                description TEXT,
                instructions TEXT,
                prompt_template TEXT,
                state JSON,
                expected_outcome TEXT,
                FOREIGN KEY(story_id) REFERENCES stories(id)
            );

            CREATE TABLE IF NOT EXISTS steps (
                id TEXT PRIMARY KEY,
                activity_id TEXT,
                order_index INTEGER,
                prompt TEXT,
                input_request TEXT,
                state_update_logic TEXT,
                outcome_check TEXT,
                FOREIGN KEY(activity_id) REFERENCES activities(id)
            );

            CREATE INDEX IF NOT EXISTS idx_activities_story
                ON activities(story_id, title);
            CREATE INDEX IF NOT EXISTS idx_steps_activity_order
                ON steps(activity_id, order_index);
            ",
        )?;
        Ok(())
    }

    pub fn list_stories(&self) -> Result<Vec<Story>, StorageError> {
        let mut stmt = self.connection.prepare(
            "SELECT id, title, description, initial_state, expected_outcomes, completion_criteria
             FROM stories ORDER BY title, rowid",
        )?;
        let rows = stmt.query_map([], story_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_story(&self, id: &str) -> Result<Option<Story>, StorageError> {
        Ok(self
            .connection
            .query_row(
                "SELECT id, title, description, initial_state, expected_outcomes, completion_criteria
                 FROM stories WHERE id = ?1",
                params![id],
                story_from_row,
            )
            .optional()?)
    }

    pub fn create_story(&self, story: &Story) -> Result<(), StorageError> {
        insert_story(&self.connection, story)
    }

    /// Activities of a story in title order; ties keep insertion order.
    pub fn activities_for_story(&self, story_id: &str) -> Result<Vec<Activity>, StorageError> {
        let mut stmt = self.connection.prepare(
            "SELECT id, story_id, title, description, instructions, prompt_template, state, expected_outcome
             FROM activities WHERE story_id = ?1 ORDER BY title, rowid",
        )?;
        let rows = stmt.query_map(params![story_id], activity_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_activity(&self, id: &str) -> Result<Option<Activity>, StorageError> {
        Ok(self
            .connection
            .query_row(
                "SELECT id, story_id, title, description, instructions, prompt_template, state, expected_outcome
                 FROM activities WHERE id = ?1",
                params![id],
                activity_from_row,
            )
            .optional()?)
    }

    /// The owning story is not checked; a dangling `story_id` is the caller's
    /// responsibility.
    pub fn create_activity(&self, activity: &Activity) -> Result<(), StorageError> {
        insert_activity(&self.connection, activity)
    }

    /// Overwrites the stored state. An unknown id updates nothing.
    pub fn update_activity_state(&self, activity_id: &str, state: &Value) -> Result<(), StorageError> {
        let encoded = encode_json("state", state)?;
        self.connection.execute(
            "UPDATE activities SET state = ?1 WHERE id = ?2",
            params![encoded, activity_id],
        )?;
        Ok(())
    }

    /// Steps of an activity in ascending `order_index`; equal indices keep
    /// insertion order.
    pub fn steps_for_activity(&self, activity_id: &str) -> Result<Vec<Step>, StorageError> {
        let mut stmt = self.connection.prepare(
            "SELECT id, activity_id, order_index, prompt, input_request, state_update_logic, outcome_check
             FROM steps WHERE activity_id = ?1 ORDER BY order_index, rowid",
        )?;
        let rows = stmt.query_map(params![activity_id], step_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn create_step(&self, step: &Step) -> Result<(), StorageError> {
        insert_step(&self.connection, step)
    }

    /// Inserts a story with all of its activities and steps, or nothing at
    /// all when any insert fails (for example a duplicate id).
    pub fn import_bundle(&mut self, bundle: &StoryBundle) -> Result<ImportSummary, StorageError> {
        let mut bundle = bundle.clone();
        bundle.link_parents();

        let tx = self.connection.transaction()?;
        insert_story(&tx, &bundle.story)?;
        for activity in &bundle.activities {
            insert_activity(&tx, &activity.activity)?;
            for step in &activity.steps {
                insert_step(&tx, step)?;
            }
        }
        tx.commit()?;

        Ok(ImportSummary {
            activities: bundle.activities.len(),
            steps: bundle.step_count(),
        })
    }

    pub fn close(self) -> Result<(), StorageError> {
        self.connection
            .close()
            .map_err(|(_, source)| StorageError::Sql { source })
    }
}

fn insert_story(connection: &Connection, story: &Story) -> Result<(), StorageError> {
    connection.execute(
        "INSERT INTO stories (id, title, description, initial_state, expected_outcomes, completion_criteria)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            story.id,
            story.title,
            story.description,
            encode_json("initial_state", &story.initial_state)?,
            serde_json::to_string(&story.expected_outcomes).map_err(|source| {
                StorageError::Encode {
                    column: "expected_outcomes",
                    source,
                }
            })?,
            story.completion_criteria,
        ],
    )?;
    Ok(())
}

fn insert_activity(connection: &Connection, activity: &Activity) -> Result<(), StorageError> {
    connection.execute(
        "INSERT INTO activities (id, story_id, title, description, instructions, prompt_template, state, expected_outcome)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            activity.id,
            activity.story_id,
            activity.title,
            activity.description,
            activity.instructions,
            activity.prompt_template,
            encode_json("state", &activity.state)?,
            activity.expected_outcome,
        ],
    )?;
    Ok(())
}

fn insert_step(connection: &Connection, step: &Step) -> Result<(), StorageError> {
    connection.execute(
        "INSERT INTO steps (id, activity_id, order_index, prompt, input_request, state_update_logic, outcome_check)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            step.id,
            step.activity_id,
            step.order_index,
            step.prompt,
            step.input_request,
            step.state_update_logic,
            step.outcome_check,
        ],
    )?;
    Ok(())
}

fn encode_json(column: &'static str, value: &Value) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Encode { column, source })
}

/// Lenient read of a JSON text column: absent or malformed text becomes
/// `Value::Null` rather than failing the whole query.
fn json_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Value> {
    let raw: Option<String> = row.get(index)?;
    Ok(raw
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or(Value::Null))
}

fn text_column(row: &Row<'_>, index: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(index)?.unwrap_or_default())
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<Story> {
    let expected_outcomes = json_column(row, 4)?;
    Ok(Story {
        id: row.get(0)?,
        title: text_column(row, 1)?,
        description: text_column(row, 2)?,
        initial_state: json_column(row, 3)?,
        expected_outcomes: serde_json::from_value(expected_outcomes).unwrap_or_default(),
        completion_criteria: text_column(row, 5)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        story_id: text_column(row, 1)?,
        title: text_column(row, 2)?,
        description: text_column(row, 3)?,
        instructions: text_column(row, 4)?,
        prompt_template: text_column(row, 5)?,
        state: json_column(row, 6)?,
        expected_outcome: text_column(row, 7)?,
    })
}

fn step_from_row(row: &Row<'_>) -> rusqlite::Result<Step> {
    Ok(Step {
        id: row.get(0)?,
        activity_id: text_column(row, 1)?,
        order_index: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
        prompt: text_column(row, 3)?,
        input_request: text_column(row, 4)?,
        state_update_logic: text_column(row, 5)?,
        outcome_check: text_column(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_state_text_reads_back_as_null() {
        let store = StoryStore::open_in_memory().expect("store");
        store
            .connection
            .execute(
                "INSERT INTO activities (id, story_id, title, state) VALUES ('a', 's', 'A', 'not json')",
                [],
            )
            .expect("raw insert");

        let activity = store.get_activity("a").expect("get").expect("present");
        assert_eq!(activity.state, Value::Null);
        assert_eq!(activity.description, "");
    }
}
