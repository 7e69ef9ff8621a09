pub mod story_templates;

pub use story_templates::{
    import_bundle_file, parse_bundle, seed_stories, validate_bundle_ids, SeedOutcome, SeedStory,
    TemplateError, EXAMPLE_SEEDS, TEST_SEEDS,
};
