use crate::app::cli::{help_text, parse_cli_verb, CliVerb};

pub mod agents;
pub mod config;
pub mod stories;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::List => stories::cmd_list(),
        CliVerb::Show => stories::cmd_show(&args[1..]),
        CliVerb::Run => stories::cmd_run(&args[1..]),
        CliVerb::Continue => stories::cmd_continue(&args[1..]),
        CliVerb::Activity => stories::cmd_activity(&args[1..]),
        CliVerb::Init => stories::cmd_init(),
        CliVerb::Test => stories::cmd_test(),
        CliVerb::Import => stories::cmd_import(&args[1..]),
        CliVerb::Prompts => stories::cmd_prompts(&args[1..]),
        CliVerb::Agent => agents::cmd_agent(&args[1..]),
        CliVerb::Config => config::cmd_config(&args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
