use crate::domain::recommendation::{FixedIncomeItem, VariableIncomeItem};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeProfileRequest {
    pub user_id: String,
    pub answers: BTreeMap<String, String>,
    pub monthly_investment_value: f64,
}

/// Scoring service response. Also the payload sent to the recommender.
///
/// Strings are kept as received and fields this crate does not know about are
/// carried in `extra`, so the recommender sees what scoring returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeProfileResponse {
    pub user_id: String,
    pub total_score: f64,
    pub profile_classification: String,
    pub identified_interests: IdentifiedInterests,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedInterests {
    pub liquidity_needed: bool,
    pub esg_interest: String,
    #[serde(default)]
    pub macroeconomic_concerns: Vec<String>,
    pub risk_tolerance_notes: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    #[serde(rename = "FixedIncomesList", default)]
    pub fixed_incomes: Vec<FixedIncomeItem>,
    #[serde(rename = "VariableIncomesList", default)]
    pub variable_incomes: Vec<VariableIncomeItem>,
}

impl AnalyzeProfileResponse {
    pub fn validate(self, request: &AnalyzeProfileRequest) -> anyhow::Result<Self> {
        ensure!(
            self.total_score.is_finite(),
            "totalScore must be a finite number (got {})",
            self.total_score
        );

        ensure!(
            !self.profile_classification.trim().is_empty(),
            "profileClassification must be non-empty"
        );

        if self.user_id != request.user_id {
            tracing::warn!(
                requested = %request.user_id,
                returned = %self.user_id,
                "scoring response userId differs from request"
            );
        }

        Ok(self)
    }
}

impl RecommendationResponse {
    pub fn validate(self) -> anyhow::Result<Self> {
        let mut variable_incomes = Vec::with_capacity(self.variable_incomes.len());
        for mut item in self.variable_incomes {
            item.ticker = item.ticker.trim().to_string();
            ensure!(!item.ticker.is_empty(), "variable income ticker must be non-empty");
            ensure!(
                item.regular_market_price.is_finite(),
                "price for {} must be finite",
                item.ticker
            );
            variable_incomes.push(item);
        }

        for item in &self.fixed_incomes {
            ensure!(
                !item.name.trim().is_empty(),
                "fixed income name must be non-empty"
            );
        }

        Ok(Self {
            fixed_incomes: self.fixed_incomes,
            variable_incomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> AnalyzeProfileRequest {
        AnalyzeProfileRequest {
            user_id: "user-1".to_string(),
            answers: BTreeMap::from([("q1".to_string(), "b".to_string())]),
            monthly_investment_value: 500.0,
        }
    }

    #[test]
    fn parses_scoring_response_shape() {
        let v = json!({
            "userId": "user-1",
            "totalScore": 6,
            "profileClassification": "moderado",
            "identifiedInterests": {
                "liquidityNeeded": false,
                "esgInterest": "low",
                "macroeconomicConcerns": ["inflation"],
                "riskToleranceNotes": "balanced"
            }
        });

        let parsed: AnalyzeProfileResponse = serde_json::from_value(v).unwrap();
        let validated = parsed.validate(&request()).unwrap();
        assert_eq!(validated.total_score, 6.0);
        assert_eq!(validated.profile_classification, "moderado");
        assert_eq!(
            validated.identified_interests.macroeconomic_concerns,
            vec!["inflation".to_string()]
        );
        assert!(validated.extra.is_empty());
    }

    #[test]
    fn scoring_response_reserializes_as_received() {
        let v = json!({
            "userId": "user-1",
            "totalScore": 6.5,
            "profileClassification": " Moderado ",
            "identifiedInterests": {
                "liquidityNeeded": true,
                "esgInterest": "high",
                "macroeconomicConcerns": [],
                "riskToleranceNotes": "cautious",
                "horizonYears": 10
            },
            "riskBand": "B",
            "scoredBy": {"model": "v2"}
        });

        let parsed: AnalyzeProfileResponse = serde_json::from_value(v.clone()).unwrap();
        let validated = parsed.validate(&request()).unwrap();
        assert_eq!(validated.profile_classification, " Moderado ");
        assert_eq!(validated.extra["riskBand"], "B");
        assert_eq!(serde_json::to_value(&validated).unwrap(), v);
    }

    #[test]
    fn rejects_blank_classification() {
        let res = AnalyzeProfileResponse {
            user_id: "user-1".to_string(),
            total_score: 3.0,
            profile_classification: "  ".to_string(),
            identified_interests: IdentifiedInterests {
                liquidity_needed: true,
                esg_interest: "none".to_string(),
                macroeconomic_concerns: vec![],
                risk_tolerance_notes: String::new(),
                extra: Default::default(),
            },
            extra: Default::default(),
        }
        .validate(&request());
        assert!(res.is_err());
    }

    #[test]
    fn parses_recommendation_lists_with_upstream_field_names() {
        let v = json!({
            "FixedIncomesList": [{
                "name": "CDB Banco X 2027",
                "type": "CDB",
                "indexerRate": 1.1,
                "indexer": "CDI",
                "isTaxExempt": false,
                "dailyLiquidity": true,
                "maturityDate": "2027-01-15",
                "minimumInvestmentAmount": 100.0,
                "issuer": "Banco X",
                "issuerRiskScore": 2.5,
                "source": "broker"
            }],
            "VariableIncomesList": [{
                "ticket": " PETR4 ",
                "longName": null,
                "currency": "BRL",
                "logoUrl": "https://logos.example/petr4.png",
                "regularMarketPrice": 38.2,
                "regularMarketChange": -0.4,
                "regularMarketChancePercent": -1.04,
                "score": 0.82
            }]
        });

        let parsed: RecommendationResponse = serde_json::from_value(v).unwrap();
        let validated = parsed.validate().unwrap();
        assert_eq!(validated.fixed_incomes[0].kind, "CDB");
        assert_eq!(validated.variable_incomes[0].ticker, "PETR4");
        assert_eq!(validated.variable_incomes[0].long_name, None);
        assert_eq!(validated.variable_incomes[0].regular_market_change_percent, -1.04);
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let parsed: RecommendationResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.fixed_incomes.is_empty());
        assert!(parsed.variable_incomes.is_empty());
    }
}
