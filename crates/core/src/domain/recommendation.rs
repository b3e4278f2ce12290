use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recommendations produced for one classification, in the order returned upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub classification_id: Uuid,
    pub fixed_income_items: Vec<FixedIncomeItem>,
    pub variable_income_items: Vec<VariableIncomeItem>,
    pub loaded_at: DateTime<Utc>,
}

impl RecommendationSet {
    pub fn len(&self) -> usize {
        self.fixed_income_items.len() + self.variable_income_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedIncomeItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub indexer_rate: f64,
    pub indexer: String,
    pub is_tax_exempt: bool,
    pub daily_liquidity: bool,
    pub maturity_date: String,
    pub minimum_investment_amount: f64,
    pub issuer: String,
    pub issuer_risk_score: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableIncomeItem {
    // Upstream spells these two fields this way.
    #[serde(rename = "ticket")]
    pub ticker: String,
    pub long_name: Option<String>,
    pub currency: String,
    pub logo_url: String,
    pub regular_market_price: f64,
    pub regular_market_change: f64,
    #[serde(rename = "regularMarketChancePercent")]
    pub regular_market_change_percent: f64,
    pub score: f64,
}
