use clap::{Parser, builder::styling};

const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::Green.on_default().bold())
    .usage(styling::AnsiColor::Green.on_default().bold())
    .literal(styling::AnsiColor::Cyan.on_default().bold())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// `komitto [context..] [-i] [-v]`
///
/// Two context values are special when they are the only argument:
/// `init` writes the default config, `learn` drafts a style prompt from
/// the commit history. Everything else is free-form annotation attached
/// to the prompt.
#[derive(Parser)]
#[command(name = "komitto")]
#[command(author, version, long_about = None)]
#[command(styles = STYLES)]
pub struct Cli {
    /// Optional context or comments about the changes
    #[arg(trailing_var_arg = true)]
    pub context: Vec<String>,

    /// Enable interactive mode to review/edit the message
    #[arg(short, long)]
    pub interactive: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_context_tokens_collected() {
        let cli = Cli::parse_from(["komitto", "refactor", "the", "parser"]);
        assert_eq!(cli.context, vec!["refactor", "the", "parser"]);
        assert!(!cli.interactive);
    }

    #[test]
    fn test_interactive_flag() {
        let cli = Cli::parse_from(["komitto", "-i"]);
        assert!(cli.interactive);
        assert!(cli.context.is_empty());
    }

    #[test]
    fn test_interactive_with_context() {
        let cli = Cli::parse_from(["komitto", "--interactive", "fix", "typo"]);
        assert!(cli.interactive);
        assert_eq!(cli.context, vec!["fix", "typo"]);
    }

    #[test]
    fn test_init_token_is_plain_context() {
        let cli = Cli::parse_from(["komitto", "init"]);
        assert_eq!(cli.context, vec!["init"]);
    }
}
