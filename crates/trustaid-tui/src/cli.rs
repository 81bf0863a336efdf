use clap::{Parser, Subcommand};
use trustaid_core::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "trustaid")]
#[command(version, about = "Chat with the TrustAid service navigator and spending-data assistant")]
pub struct Cli {
    /// Backend origin, e.g. http://127.0.0.1:8000 (saved for later sessions)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Answer from canned demo data instead of the backend (saved)
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub demo: Option<bool>,

    /// Preferred pipeline: auto, navigator or trustbot (saved)
    #[arg(long, global = true, value_parser = parse_pipeline)]
    pub pipeline: Option<Pipeline>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive chat (default)
    Chat,
    /// Ask one question and print the answer
    Ask {
        /// Your question
        query: String,
    },
    /// Check that the backend is reachable
    Health,
}

fn parse_pipeline(s: &str) -> Result<Pipeline, String> {
    Pipeline::from_str(s).ok_or_else(|| format!("unknown pipeline '{}' (expected auto, navigator or trustbot)", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_chat() {
        let cli = Cli::try_parse_from(["trustaid"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.demo.is_none());
    }

    #[test]
    fn test_ask_with_overrides() {
        let cli = Cli::try_parse_from([
            "trustaid",
            "--demo",
            "--pipeline",
            "trustbot",
            "ask",
            "top vendors",
        ])
        .unwrap();
        assert_eq!(cli.demo, Some(true));
        assert_eq!(cli.pipeline, Some(Pipeline::Trustbot));
        assert!(matches!(cli.command, Some(Command::Ask { ref query }) if query == "top vendors"));
    }

    #[test]
    fn test_demo_can_be_turned_off() {
        let cli = Cli::try_parse_from(["trustaid", "--demo=false", "health"]).unwrap();
        assert_eq!(cli.demo, Some(false));
    }

    #[test]
    fn test_rejects_unknown_pipeline() {
        assert!(Cli::try_parse_from(["trustaid", "--pipeline", "sql"]).is_err());
    }
}
