//! Entry points: one crew run per call
//!
//! Every failure raised while building or running the crew is wrapped once
//! into [`MarketIntelError`], keeping the original error as its source.

use crate::crew::MarketIntelligence;
use crate::error::{MarketIntelError, Result};
use chrono::Datelike;
use crew_core::Inputs;
use crew_utils::Settings;
use crew_workflow::CrewOutput;
use serde_json::Value;
use tracing::info;

/// Topic the crew researches by default
pub const DEFAULT_TOPIC: &str = "AI LLMs";

/// Input key carrying a trigger payload
pub const TRIGGER_PAYLOAD_KEY: &str = "crewai_trigger_payload";

/// `topic` and `current_year` for a regular run
pub fn default_inputs() -> Inputs {
    Inputs::new()
        .with("topic", DEFAULT_TOPIC)
        .with("current_year", chrono::Local::now().year().to_string())
}

/// Inputs for a triggered run: the parsed payload plus empty topic and year
pub fn trigger_inputs(payload: Option<&str>) -> Result<Inputs> {
    let payload = payload
        .filter(|p| !p.trim().is_empty())
        .ok_or(MarketIntelError::MissingTriggerPayload)?;
    let payload: Value =
        serde_json::from_str(payload).map_err(MarketIntelError::InvalidTriggerPayload)?;

    Ok(Inputs::new()
        .with(TRIGGER_PAYLOAD_KEY, payload)
        .with("topic", "")
        .with("current_year", ""))
}

/// Build the crew from `settings` and run it with [`default_inputs`]
pub async fn run(settings: &Settings) -> Result<CrewOutput> {
    let inputs = default_inputs();
    info!(topic = DEFAULT_TOPIC, memory_dir = %settings.memory_dir.display(), "Running crew");
    async {
        MarketIntelligence::from_settings(settings)?
            .kickoff(inputs)
            .await
    }
    .await
    .map_err(|source| MarketIntelError::Run { source })
}

/// Run an already assembled application with `inputs`
pub async fn run_app(app: &MarketIntelligence, inputs: Inputs) -> Result<CrewOutput> {
    app.kickoff(inputs)
        .await
        .map_err(|source| MarketIntelError::Run { source })
}

/// Parse `payload` and run the crew with it
pub async fn run_with_trigger(settings: &Settings, payload: Option<&str>) -> Result<CrewOutput> {
    let inputs = trigger_inputs(payload)?;
    info!("Running crew with trigger payload");
    async {
        MarketIntelligence::from_settings(settings)?
            .kickoff(inputs)
            .await
    }
    .await
    .map_err(|source| MarketIntelError::RunWithTrigger { source })
}
