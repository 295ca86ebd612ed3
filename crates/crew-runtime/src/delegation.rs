//! Coworker delegation tools
//!
//! A manager (or any agent with `allow_delegation`) receives two tools over
//! its coworkers: one hands over a piece of work, the other asks a question.
//! Coworkers are addressed by role; matching ignores case, surrounding
//! whitespace and quotes.

use crate::prompts::render_coworker_prompt;
use async_trait::async_trait;
use crew_core::{Agent, Context, Error, Result};
use crew_llm::tools::schema;
use crew_tools::Tool;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

const DELEGATE_WORK: &str = "delegate_work_to_coworker";
const ASK_QUESTION: &str = "ask_question_to_coworker";

/// Agents reachable through delegation
#[derive(Clone)]
struct Coworkers(Arc<Vec<Arc<dyn Agent>>>);

impl Coworkers {
    fn roles(&self) -> Vec<&str> {
        self.0.iter().map(|agent| agent.role()).collect()
    }

    fn find(&self, tool: &str, requested: &str) -> Result<Arc<dyn Agent>> {
        let wanted = normalize_role(requested);
        self.0
            .iter()
            .find(|agent| normalize_role(agent.role()) == wanted)
            .cloned()
            .ok_or_else(|| {
                Error::tool(
                    tool,
                    format!(
                        "Coworker '{requested}' not found. Available coworkers: {}",
                        self.roles().join(", ")
                    ),
                )
            })
    }

    async fn ask(&self, tool: &str, params: &Value, request_key: &str) -> Result<Value> {
        let request = required_str(tool, params, request_key)?;
        let coworker_role = required_str(tool, params, "coworker")?;
        let context = params.get("context").and_then(Value::as_str);

        let coworker = self.find(tool, coworker_role)?;
        info!(tool, coworker = %coworker.role(), "Delegating to coworker");

        let prompt = render_coworker_prompt(request, context)?;
        let answer = coworker.process(prompt, &mut Context::new()).await?;
        Ok(Value::String(answer))
    }

    fn input_schema(&self, request_key: &str, request_description: &str) -> Value {
        schema::object(
            json!({
                request_key: schema::string(request_description),
                "context": schema::string("Everything the coworker needs to know; they know nothing about the task"),
                "coworker": schema::string(&format!("Role of the coworker, one of: {}", self.roles().join(", "))),
            }),
            &[request_key, "context", "coworker"],
        )
    }
}

fn normalize_role(role: &str) -> String {
    role.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
}

fn required_str<'a>(tool: &str, params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::tool(tool, format!("Missing required parameter '{key}'")))
}

/// Hands a piece of work to a coworker and returns their answer
pub struct DelegateWorkTool {
    coworkers: Coworkers,
    description: String,
}

/// Asks a coworker a question and returns their answer
pub struct AskQuestionTool {
    coworkers: Coworkers,
    description: String,
}

/// Both delegation tools over the same coworkers
pub fn delegation_tools(coworkers: Vec<Arc<dyn Agent>>) -> Vec<Arc<dyn Tool>> {
    let coworkers = Coworkers(Arc::new(coworkers));
    let roles = coworkers.roles().join(", ");

    vec![
        Arc::new(DelegateWorkTool {
            description: format!(
                "Delegate a specific task to one of the following coworkers: {roles}. \
                 Provide the coworker, the task and ALL necessary context; they know nothing \
                 about the task, so explain everything instead of referencing it."
            ),
            coworkers: coworkers.clone(),
        }),
        Arc::new(AskQuestionTool {
            description: format!(
                "Ask a specific question to one of the following coworkers: {roles}. \
                 Provide the coworker, the question and ALL necessary context; they know \
                 nothing about the question, so explain everything instead of referencing it."
            ),
            coworkers,
        }),
    ]
}

#[async_trait]
impl Tool for DelegateWorkTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        self.coworkers.ask(DELEGATE_WORK, &params, "task").await
    }

    fn name(&self) -> &str {
        DELEGATE_WORK
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.coworkers
            .input_schema("task", "The task to delegate")
    }
}

#[async_trait]
impl Tool for AskQuestionTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        self.coworkers.ask(ASK_QUESTION, &params, "question").await
    }

    fn name(&self) -> &str {
        ASK_QUESTION
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.coworkers
            .input_schema("question", "The question to ask")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::ErrorKind;
    use std::sync::Mutex;

    struct Recorder {
        role: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(role: &'static str) -> Arc<Self> {
            Arc::new(Self {
                role,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Agent for Recorder {
        async fn process(&self, input: String, _context: &mut Context) -> Result<String> {
            self.prompts.lock().unwrap().push(input);
            Ok(format!("{} done", self.role))
        }

        fn name(&self) -> &str {
            self.role
        }
    }

    fn tools(agents: &[Arc<Recorder>]) -> Vec<Arc<dyn Tool>> {
        delegation_tools(
            agents
                .iter()
                .map(|a| Arc::clone(a) as Arc<dyn Agent>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_delegate_matches_role_loosely() {
        let researcher = Recorder::new("Market Researcher");
        let analyst = Recorder::new("Competitor Analyst");
        let tools = tools(&[Arc::clone(&researcher), Arc::clone(&analyst)]);

        let result = tools[0]
            .execute(json!({
                "task": "Find trending AI companies",
                "context": "Topic is AI LLMs",
                "coworker": "  \"market researcher\" "
            }))
            .await
            .unwrap();

        assert_eq!(result, json!("Market Researcher done"));
        let prompts = researcher.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            "Find trending AI companies\n\nThis is the context you're working with:\nTopic is AI LLMs"
        );
        assert!(analyst.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ask_question() {
        let analyst = Recorder::new("Competitor Analyst");
        let tools = tools(&[Arc::clone(&analyst)]);

        assert_eq!(tools[1].name(), "ask_question_to_coworker");
        let result = tools[1]
            .execute(json!({"question": "Who leads?", "context": "", "coworker": "Competitor Analyst"}))
            .await
            .unwrap();
        assert_eq!(result, json!("Competitor Analyst done"));
        assert_eq!(analyst.prompts.lock().unwrap()[0], "Who leads?");
    }

    #[tokio::test]
    async fn test_unknown_coworker_lists_roles() {
        let tools = tools(&[Recorder::new("Market Researcher"), Recorder::new("Strategist")]);

        let err = tools[0]
            .execute(json!({"task": "x", "context": "y", "coworker": "CEO"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Tool);
        assert_eq!(
            err.to_string(),
            "Tool 'delegate_work_to_coworker' failed: Coworker 'CEO' not found. \
             Available coworkers: Market Researcher, Strategist"
        );
    }

    struct Offline;

    #[async_trait]
    impl Agent for Offline {
        async fn process(&self, _input: String, _context: &mut Context) -> Result<String> {
            Err(Error::unavailable("search_the_internet", "connection refused"))
        }

        fn name(&self) -> &str {
            "Market Researcher"
        }
    }

    #[tokio::test]
    async fn test_coworker_outage_passes_through() {
        let tools = delegation_tools(vec![Arc::new(Offline)]);

        let err = tools[0]
            .execute(json!({"task": "x", "context": "y", "coworker": "Market Researcher"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
        assert_eq!(
            err.to_string(),
            "Tool 'search_the_internet' is unavailable: connection refused"
        );
    }

    #[tokio::test]
    async fn test_missing_task() {
        let tools = tools(&[Recorder::new("Market Researcher")]);
        let err = tools[0]
            .execute(json!({"coworker": "Market Researcher"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Missing required parameter 'task'"));
    }

    #[test]
    fn test_schema_and_description() {
        let tools = tools(&[Recorder::new("Market Researcher")]);
        let schema = tools[0].input_schema();
        assert_eq!(schema["required"], json!(["task", "context", "coworker"]));
        assert!(tools[0].description().contains("Market Researcher"));
        assert_eq!(tools[1].input_schema()["required"][0], "question");
    }
}
