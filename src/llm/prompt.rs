//! Prompt assembly. Pure string composition, no I/O.

/// Section header for the recent-commit history block.
pub const HISTORY_HEADER: &str = "## Recent Commits:";

/// Section header for the free-form user context.
pub const CONTEXT_HEADER: &str = "## Context:";

/// Section header for the staged diff.
pub const DIFF_HEADER: &str = "## Diff:";

/// Builds the final prompt text sent to the provider (or copied to the
/// clipboard when none is configured).
///
/// Fixed section order: system prompt, recent history, user context,
/// diff. The system prompt is skipped when blank, the history section
/// disappears entirely when `history` is `None`, and the context
/// section disappears when `context` is empty. No truncation or token
/// counting happens here.
pub fn build_prompt(
    system_prompt: &str,
    history: Option<&str>,
    user_context: &str,
    diff: &str,
) -> String {
    let mut sections: Vec<String> = Vec::with_capacity(4);

    if !system_prompt.trim().is_empty() {
        sections.push(system_prompt.trim_end().to_string());
    }

    if let Some(history) = history {
        sections.push(format!("{}\n{}", HISTORY_HEADER, history));
    }

    if !user_context.is_empty() {
        sections.push(format!("{}\n{}", CONTEXT_HEADER, user_context));
    }

    sections.push(format!("{}\n{}", DIFF_HEADER, diff));

    sections.join("\n\n")
}

/// Builds the analysis prompt for the `learn` flow: asks the model to
/// draft a system prompt matching the style observed in `history_text`
/// (recent commit messages joined by `---` rules).
pub fn build_style_analysis_prompt(history_text: &str) -> String {
    format!(
        r#"Act as an expert prompt engineer.
Your goal is to write a "System Prompt" for an AI commit message generator that matches the commit style and conventions of a specific repository.

## Input Format (MUST be explained in the system prompt)
The generator receives the staged changes as a unified git diff produced with zero context lines and no path prefixes: only `+`/`-` lines plus hunk headers. The system prompt MUST tell the AI to infer intent from those changed lines alone.

## Source Material: Commit History
Analyze the following history to determine the language, format (e.g. Conventional Commits, emoji prefixes), and tone.
{history_text}

## Task
Write a comprehensive system prompt that:
1. Explains the input format above.
2. Instructs the AI to generate messages that strictly follow the style, language, and format observed in the commit history.
3. If the history uses specific prefixes (feat, fix) or emojis, defines them explicitly.

## Output
Return ONLY the generated system prompt, written in the primary language of the commit history."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_sections_in_order() {
        let prompt = build_prompt(
            "Be terse.",
            Some("Commit: abc123\nMessage:\nfeat: x"),
            "touching the parser",
            "+line1\n-line2",
        );

        let system_pos = prompt.find("Be terse.").unwrap();
        let history_pos = prompt.find(HISTORY_HEADER).unwrap();
        let context_pos = prompt.find(CONTEXT_HEADER).unwrap();
        let diff_pos = prompt.find(DIFF_HEADER).unwrap();

        assert!(system_pos < history_pos);
        assert!(history_pos < context_pos);
        assert!(context_pos < diff_pos);
    }

    #[test]
    fn test_deterministic() {
        let a = build_prompt("sys", Some("hist"), "ctx", "diff");
        let b = build_prompt("sys", Some("hist"), "ctx", "diff");
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_history_removes_section_header() {
        let prompt = build_prompt("sys", None, "ctx", "diff");
        assert!(!prompt.contains(HISTORY_HEADER));
    }

    #[test]
    fn test_empty_context_removes_section_header() {
        let prompt = build_prompt("sys", Some("hist"), "", "diff");
        assert!(!prompt.contains(CONTEXT_HEADER));
    }

    #[test]
    fn test_bare_diff_when_everything_else_empty() {
        let prompt = build_prompt("", None, "", "+line1\n-line2");
        assert_eq!(prompt, "## Diff:\n+line1\n-line2");
    }

    #[test]
    fn test_blank_system_prompt_skipped() {
        let prompt = build_prompt("   \n", None, "", "diff");
        assert!(prompt.starts_with(DIFF_HEADER));
    }

    #[test]
    fn test_diff_always_last_section() {
        let prompt = build_prompt("sys", Some("hist"), "ctx", "+only line");
        assert!(prompt.ends_with("## Diff:\n+only line"));
    }

    #[test]
    fn test_style_analysis_prompt_embeds_history() {
        let prompt = build_style_analysis_prompt("feat: a\n---\nfix: b");
        assert!(prompt.contains("feat: a\n---\nfix: b"));
        assert!(prompt.contains("System Prompt"));
    }
}
