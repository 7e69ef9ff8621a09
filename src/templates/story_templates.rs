use crate::shared::ids::validate_identifier_value;
use crate::storage::{ImportSummary, StorageError, StoryBundle, StoryStore};
use std::fs;
use std::path::Path;

const WEBSITE_BUILDER_YAML: &str = include_str!("assets/website-builder.yaml");
const CODE_AUDIT_YAML: &str = include_str!("assets/code-audit.yaml");
const HELLO_CLAUDE_YAML: &str = include_str!("assets/hello-claude.yaml");
const QUICK_TEST_YAML: &str = include_str!("assets/quick-test.yaml");

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read story file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid story bundle {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid story bundle {origin}: {reason}")]
    Invalid { origin: String, reason: String },
    #[error("story `{story_id}` already exists")]
    AlreadyExists { story_id: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStory {
    WebsiteBuilder,
    CodeAudit,
    HelloClaude,
    QuickTest,
}

/// Seeded by `stories init`.
pub const EXAMPLE_SEEDS: &[SeedStory] = &[
    SeedStory::WebsiteBuilder,
    SeedStory::CodeAudit,
    SeedStory::HelloClaude,
];

/// Seeded by `stories test`.
pub const TEST_SEEDS: &[SeedStory] = &[SeedStory::HelloClaude, SeedStory::QuickTest];

impl SeedStory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebsiteBuilder => "website-builder",
            Self::CodeAudit => "code-audit",
            Self::HelloClaude => "hello-claude",
            Self::QuickTest => "quick-test",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Self::WebsiteBuilder => WEBSITE_BUILDER_YAML,
            Self::CodeAudit => CODE_AUDIT_YAML,
            Self::HelloClaude => HELLO_CLAUDE_YAML,
            Self::QuickTest => QUICK_TEST_YAML,
        }
    }

    pub fn bundle(self) -> Result<StoryBundle, TemplateError> {
        parse_bundle(self.source(), &format!("template `{}`", self.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created {
        story_id: String,
        summary: ImportSummary,
    },
    AlreadyExists {
        story_id: String,
    },
}

/// Parses a YAML (or JSON) story bundle and links activities and steps to
/// their parents.
pub fn parse_bundle(raw: &str, origin: &str) -> Result<StoryBundle, TemplateError> {
    let mut bundle: StoryBundle =
        serde_yaml::from_str(raw).map_err(|source| TemplateError::Parse {
            origin: origin.to_string(),
            source,
        })?;
    bundle.link_parents();
    validate_bundle_ids(&bundle).map_err(|reason| TemplateError::Invalid {
        origin: origin.to_string(),
        reason,
    })?;
    Ok(bundle)
}

pub fn validate_bundle_ids(bundle: &StoryBundle) -> Result<(), String> {
    validate_identifier_value("story id", &bundle.story.id)?;
    for activity in &bundle.activities {
        validate_identifier_value("activity id", &activity.activity.id)?;
        for step in &activity.steps {
            validate_identifier_value("step id", &step.id)?;
        }
    }
    Ok(())
}

/// Inserts each seed story that is not in the store yet. Present stories are
/// reported and left untouched.
pub fn seed_stories(
    store: &mut StoryStore,
    seeds: &[SeedStory],
) -> Result<Vec<SeedOutcome>, TemplateError> {
    let mut outcomes = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let bundle = seed.bundle()?;
        outcomes.push(import_if_absent(store, &bundle)?);
    }
    Ok(outcomes)
}

/// Imports a bundle file. Unlike seeding, an existing story id is an error.
pub fn import_bundle_file(
    store: &mut StoryStore,
    path: &Path,
) -> Result<(String, ImportSummary), TemplateError> {
    let raw = fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let bundle = parse_bundle(&raw, &path.display().to_string())?;
    match import_if_absent(store, &bundle)? {
        SeedOutcome::Created { story_id, summary } => Ok((story_id, summary)),
        SeedOutcome::AlreadyExists { story_id } => Err(TemplateError::AlreadyExists { story_id }),
    }
}

fn import_if_absent(
    store: &mut StoryStore,
    bundle: &StoryBundle,
) -> Result<SeedOutcome, TemplateError> {
    let story_id = bundle.story.id.clone();
    if store.get_story(&story_id)?.is_some() {
        return Ok(SeedOutcome::AlreadyExists { story_id });
    }
    let summary = store.import_bundle(bundle)?;
    Ok(SeedOutcome::Created { story_id, summary })
}
