//! Structured outputs of the three tasks
//!
//! Field doc comments end up as descriptions in the JSON schema shown to the
//! LLM, so they are written for the model as much as for readers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A company identified during market scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MarketCompany {
    /// Company name
    pub name: String,
    /// Stock ticker symbol
    pub ticker: String,
    /// Reason company is trending
    pub reason: String,
}

/// Result of collecting market data for trending companies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MarketScanResult {
    /// List of trending companies
    pub companies: Vec<MarketCompany>,
}

/// Detailed competitor analysis for a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CompetitorProfile {
    /// Company name
    pub name: String,
    /// Current market position and competitive analysis
    pub market_position: String,
    /// Future outlook and growth prospects
    pub future_outlook: String,
    /// Investment potential and suitability for investment
    pub investment_potential: String,
}

/// Aggregated competitor analysis output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CompetitorAnalysisResult {
    /// List of competitor profiles with analysis
    pub research_list: Vec<CompetitorProfile>,
}

/// Structured strategic report generated for executives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StrategyReport {
    /// Executive summary of findings
    pub summary: String,
    /// Key market trends
    pub trends: String,
    /// Opportunities identified
    pub opportunities: String,
    /// Risks identified
    pub risks: String,
    /// Actionable recommendations
    pub recommendations: String,
}
