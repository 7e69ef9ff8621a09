#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    List,
    Show,
    Run,
    Continue,
    Activity,
    Init,
    Test,
    Import,
    Prompts,
    Agent,
    Config,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "list" | "ls" => CliVerb::List,
        "show" => CliVerb::Show,
        "run" => CliVerb::Run,
        "continue" => CliVerb::Continue,
        "activity" => CliVerb::Activity,
        "init" => CliVerb::Init,
        "test" => CliVerb::Test,
        "import" => CliVerb::Import,
        "prompts" => CliVerb::Prompts,
        "agent" => CliVerb::Agent,
        "config" => CliVerb::Config,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn banner() -> &'static str {
    "Stories\nRun stories of AI agent steps from the command line."
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  list | ls                            List all stories".to_string(),
        "  show <story-id>                      Show a story, its activities and states"
            .to_string(),
        "  run <story-id>                       Run every activity of a story".to_string(),
        "  continue <story-id>                  Re-run a story (resume is not implemented)"
            .to_string(),
        "  activity <activity-id>               Run a single activity".to_string(),
        "  init                                 Seed the example stories".to_string(),
        "  test                                 Seed the quick test stories".to_string(),
        "  import <file>                        Import a YAML or JSON story bundle".to_string(),
        "  prompts                              List the prompt library".to_string(),
        "  prompts <name> [context...]          Render a base prompt with optional context"
            .to_string(),
        "  agent [list]                         List agents and their availability".to_string(),
        "  agent add <name> <command> [--args <template>]".to_string(),
        "                                       Register a custom agent CLI".to_string(),
        "  agent remove <name>                  Remove a custom agent".to_string(),
        "  agent switch <name>                  Use an installed agent for runs".to_string(),
        "  config                               Show the current configuration".to_string(),
        "  config agent [set <name>]            Show or set the agent provider".to_string(),
        "  config execution <key> <value>       Set auto-confirm, pause-ms or log-level"
            .to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    let mut lines = vec![banner().to_string(), String::new()];
    lines.extend(cli_help_lines());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_the_same_verb() {
        assert_eq!(parse_cli_verb("ls"), CliVerb::List);
        assert_eq!(parse_cli_verb("list"), CliVerb::List);
        assert_eq!(parse_cli_verb("--help"), CliVerb::Help);
        assert_eq!(parse_cli_verb("ui"), CliVerb::Unknown);
    }
}
