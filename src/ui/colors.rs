use colored::Colorize;

use crate::llm::TokenUsage;

/// Horizontal rule used around displayed messages.
const MESSAGE_RULE: &str = "========================================";

/// Success line (green ✓).
pub fn success(msg: &str, colored: bool) {
    if colored {
        println!("{} {}", "✓".green().bold(), msg.green());
    } else {
        println!("✓ {}", msg);
    }
}

/// Error line (red ✗) on stderr.
pub fn error(msg: &str, colored: bool) {
    if colored {
        eprintln!("{} {}", "✗".red().bold(), msg.red());
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// Warning line (yellow ⚠).
pub fn warning(msg: &str, colored: bool) {
    if colored {
        println!("{} {}", "⚠".yellow().bold(), msg.yellow());
    } else {
        println!("⚠ {}", msg);
    }
}

/// Info line (blue ℹ), returned instead of printed so callers can place it.
pub fn info(msg: &str, colored: bool) -> String {
    if colored {
        format!("{} {}", "ℹ".blue().bold(), msg.blue())
    } else {
        format!("ℹ {}", msg)
    }
}

/// Prints a message between horizontal rules.
pub fn boxed(message: &str, colored: bool) {
    if colored {
        println!("\n{}", MESSAGE_RULE.bright_black());
        println!("{}", message.yellow());
        println!("{}\n", MESSAGE_RULE.bright_black());
    } else {
        println!("\n{}", MESSAGE_RULE);
        println!("{}", message);
        println!("{}\n", MESSAGE_RULE);
    }
}

/// One-line token accounting shown after a message when the backend
/// reported usage.
pub fn format_token_usage(usage: &TokenUsage) -> String {
    rust_i18n::t!(
        "ui.token_usage",
        prompt = usage.prompt_tokens,
        completion = usage.completion_tokens,
        total = usage.total_tokens
    )
    .to_string()
}

/// Prints the usage line, dimmed, when usage is present.
pub fn display_usage(usage: Option<&TokenUsage>, colored: bool) {
    if let Some(usage) = usage {
        let line = format_token_usage(usage);
        if colored {
            println!("{}", line.bright_black());
        } else {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_token_usage_contains_counts() {
        let line = format_token_usage(&TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        });
        assert!(line.contains("10"));
        assert!(line.contains("20"));
        assert!(line.contains("30"));
    }
}
