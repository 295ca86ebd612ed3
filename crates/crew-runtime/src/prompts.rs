//! Prompt templates and input interpolation
//!
//! Agent and task prompts are MiniJinja templates rendered from plain
//! serializable values. Configuration text uses the simpler `{name}`
//! placeholder syntax, resolved by [`interpolate_inputs`].

use crew_core::{Error, Inputs, Result};
use minijinja::Environment;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Sent once, with tools withheld, when an agent runs out of iterations
pub const FORCE_FINAL_ANSWER: &str = "Now it's time you MUST give your absolute best final answer. \
You'll ignore all previous instructions, stop using any tools, and just return your absolute BEST Final answer.";

/// `{name}` placeholder in configuration text
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_\-]*)\}")
        .expect("Failed to compile PLACEHOLDER regex - the pattern is hardcoded")
});

const SYSTEM_TEMPLATE: &str = "\
You are {{ role }}. {{ backstory }}
Your personal goal is: {{ goal }}
{%- if tools %}

You can use the following tools as many times as needed:
{%- for tool in tools %}
- {{ tool.name }}: {{ tool.description }}
{%- endfor %}
{%- endif %}

When you have enough information, reply with your final answer and nothing else.";

const TASK_TEMPLATE: &str = "\
Current Task: {{ description }}

This is the expected criteria for your final answer: {{ expected_output }}
You MUST return the actual complete content as the final answer, not a summary.
{%- if output_schema %}

Your final answer must be a single JSON object that matches this JSON schema, with no other text:
{{ output_schema }}
{%- endif %}
{%- if context %}

This is the context you're working with:
{{ context }}
{%- endif %}
{%- if memory %}

{{ memory }}
{%- endif %}

Begin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!";

const COWORKER_TEMPLATE: &str = "\
{{ request }}
{%- if context %}

This is the context you're working with:
{{ context }}
{%- endif %}";

/// Tool summary shown in a system prompt
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Values for the agent system prompt
#[derive(Debug, Clone, Serialize)]
pub struct SystemPrompt<'a> {
    pub role: &'a str,
    pub goal: &'a str,
    pub backstory: &'a str,
    pub tools: Vec<ToolSummary>,
}

/// Values for a task prompt
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPrompt<'a> {
    pub description: &'a str,
    pub expected_output: &'a str,
    /// Pretty-printed JSON schema of the required answer
    pub output_schema: Option<String>,
    /// Outputs of the tasks this one depends on
    pub context: Option<String>,
    /// Contextual memory block
    pub memory: Option<String>,
}

fn render(name: &str, template: &str, vars: impl Serialize) -> Result<String> {
    let env = Environment::new();
    env.render_str(template, minijinja::value::Value::from_serialize(&vars))
        .map_err(|e| Error::ProcessingFailed(format!("Failed to render {name} prompt: {e}")))
}

pub fn render_system_prompt(prompt: &SystemPrompt<'_>) -> Result<String> {
    render("system", SYSTEM_TEMPLATE, prompt)
}

pub fn render_task_prompt(prompt: &TaskPrompt<'_>) -> Result<String> {
    render("task", TASK_TEMPLATE, prompt)
}

/// Prompt a coworker receives for delegated work or a question
pub fn render_coworker_prompt(request: &str, context: Option<&str>) -> Result<String> {
    render(
        "coworker",
        COWORKER_TEMPLATE,
        serde_json::json!({
            "request": request,
            "context": context.filter(|c| !c.trim().is_empty()),
        }),
    )
}

/// Replace every `{name}` placeholder with the matching input
///
/// Names start with a letter or underscore and may contain letters, digits,
/// `_` and `-`. Anything else in braces (JSON, empty braces) is left alone.
/// A placeholder without a matching input is a configuration error.
///
/// ```
/// use crew_core::Inputs;
/// use crew_runtime::interpolate_inputs;
///
/// let inputs = Inputs::new().with("topic", "AI LLMs").with("current_year", "2025");
/// let text = interpolate_inputs("Trends in {topic} for {current_year}", &inputs).unwrap();
/// assert_eq!(text, "Trends in AI LLMs for 2025");
/// ```
pub fn interpolate_inputs(text: &str, inputs: &Inputs) -> Result<String> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .find(|name| inputs.get(name).is_none())
    {
        return Err(Error::Configuration(format!(
            "Missing required template variable '{missing}' in: {text}"
        )));
    }

    Ok(PLACEHOLDER
        .replace_all(text, |cap: &regex::Captures<'_>| {
            inputs.get_text(&cap[1]).unwrap_or_default()
        })
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::ErrorKind;

    #[test]
    fn test_interpolation() {
        let inputs = Inputs::new()
            .with("topic", "AI LLMs")
            .with("current_year", "2025")
            .with("count", 3);

        assert_eq!(
            interpolate_inputs("{topic} in {current_year}, top {count}", &inputs).unwrap(),
            "AI LLMs in 2025, top 3"
        );
        assert_eq!(
            interpolate_inputs(r#"{"name": "x"} {} {1abc}"#, &inputs).unwrap(),
            r#"{"name": "x"} {} {1abc}"#
        );
        assert_eq!(interpolate_inputs("no placeholders", &Inputs::new()).unwrap(), "no placeholders");
    }

    #[test]
    fn test_placeholder_pattern_shared_across_calls() {
        let names: Vec<&str> = PLACEHOLDER
            .captures_iter("{topic} {current_year} {a-b} {9x} {}")
            .map(|cap| cap.get(1).map_or("", |m| m.as_str()))
            .collect();
        assert_eq!(names, ["topic", "current_year", "a-b"]);

        let inputs = Inputs::new().with("topic", "AI LLMs");
        for _ in 0..3 {
            assert_eq!(interpolate_inputs("{topic}", &inputs).unwrap(), "AI LLMs");
        }
    }

    #[test]
    fn test_missing_variable() {
        let err = interpolate_inputs("Research {topic}", &Inputs::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("Missing required template variable 'topic'"));
    }

    #[test]
    fn test_empty_input_value_is_allowed() {
        let inputs = Inputs::new().with("topic", "");
        assert_eq!(interpolate_inputs("[{topic}]", &inputs).unwrap(), "[]");
    }

    #[test]
    fn test_system_prompt() {
        let prompt = render_system_prompt(&SystemPrompt {
            role: "Market Researcher",
            goal: "Find trending companies",
            backstory: "You track markets.",
            tools: vec![ToolSummary {
                name: "search_the_internet".into(),
                description: "Search the web".into(),
            }],
        })
        .unwrap();

        assert!(prompt.starts_with("You are Market Researcher. You track markets."));
        assert!(prompt.contains("Your personal goal is: Find trending companies"));
        assert!(prompt.contains("- search_the_internet: Search the web"));

        let no_tools = render_system_prompt(&SystemPrompt {
            role: "r",
            goal: "g",
            backstory: "b",
            tools: vec![],
        })
        .unwrap();
        assert!(!no_tools.contains("following tools"));
    }

    #[test]
    fn test_task_prompt_sections() {
        let prompt = render_task_prompt(&TaskPrompt {
            description: "Scan the market",
            expected_output: "A list of companies",
            output_schema: Some("{\"type\": \"object\"}".into()),
            context: Some("previous output".into()),
            memory: None,
        })
        .unwrap();

        assert!(prompt.starts_with("Current Task: Scan the market"));
        assert!(prompt.contains("expected criteria for your final answer: A list of companies"));
        assert!(prompt.contains("single JSON object"));
        assert!(prompt.contains("This is the context you're working with:\nprevious output"));
        assert!(!prompt.contains("Historical Data"));
    }

    #[test]
    fn test_coworker_prompt() {
        assert_eq!(render_coworker_prompt("Do it", None).unwrap(), "Do it");
        assert_eq!(render_coworker_prompt("Do it", Some("  ")).unwrap(), "Do it");
        assert_eq!(
            render_coworker_prompt("Do it", Some("ctx")).unwrap(),
            "Do it\n\nThis is the context you're working with:\nctx"
        );
    }
}
