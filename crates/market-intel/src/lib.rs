//! Autonomous market intelligence crew
//!
//! A hierarchical crew that scans a market for trending companies, profiles
//! them against their competitors and writes a strategy report:
//!
//! - `researcher` searches the web and returns a [`MarketScanResult`]
//! - `competitor_analyzer` turns the scan into a [`CompetitorAnalysisResult`]
//! - `strategy_synthesizer` writes the final [`StrategyReport`]
//! - a `manager` runs every task and delegates the work to the three of them
//!
//! Agents and tasks come from `config/agents.yaml` and `config/tasks.yaml`;
//! runs are remembered in `memory/` (SQLite long-term memory plus
//! embedding-backed short-term and entity memory).
//!
//! # Example
//!
//! ```no_run
//! use crew_utils::Settings;
//! use market_intel::{StrategyReport, run};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::from_env()?;
//! let output = run(&settings).await?;
//! let report: StrategyReport = output.typed()?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

pub mod crew;
pub mod error;
pub mod runner;
pub mod schemas;

pub use crew::{LONG_TERM_DB, MarketIntelligence, MarketIntelligenceBuilder, bundled_config, load_config};
pub use error::{MarketIntelError, Result};
pub use runner::{default_inputs, run, run_app, run_with_trigger, trigger_inputs};
pub use schemas::{
    CompetitorAnalysisResult, CompetitorProfile, MarketCompany, MarketScanResult, StrategyReport,
};
