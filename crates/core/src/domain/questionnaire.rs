use crate::domain::contract::AnalyzeProfileRequest;
use crate::error::ProfileError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A completed questionnaire run, as cached on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSubmission {
    pub id: Uuid,
    pub user_id: String,
    pub answers: BTreeMap<String, String>,
    pub monthly_investment_value: f64,
    pub completed_at: DateTime<Utc>,
}

impl QuestionnaireSubmission {
    pub fn new(
        user_id: String,
        answers: BTreeMap<String, String>,
        monthly_investment_value: f64,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ProfileError> {
        if answers.is_empty() {
            return Err(ProfileError::InvalidSubmission(
                "at least one answer is required".to_string(),
            ));
        }

        let mut normalized = BTreeMap::new();
        for (question, option) in answers {
            let question = question.trim().to_string();
            let option = option.trim().to_string();
            if question.is_empty() || option.is_empty() {
                return Err(ProfileError::InvalidSubmission(
                    "question and option identifiers must be non-empty".to_string(),
                ));
            }
            if normalized.insert(question.clone(), option).is_some() {
                return Err(duplicate_answer(&question));
            }
        }

        if !monthly_investment_value.is_finite() || monthly_investment_value < 0.0 {
            return Err(ProfileError::InvalidSubmission(format!(
                "monthly investment value must be a non-negative amount (got {monthly_investment_value})"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            answers: normalized,
            monthly_investment_value,
            completed_at,
        })
    }

    pub fn to_request(&self) -> AnalyzeProfileRequest {
        AnalyzeProfileRequest {
            user_id: self.user_id.clone(),
            answers: self.answers.clone(),
            monthly_investment_value: self.monthly_investment_value,
        }
    }
}

/// Scoring keys answers as `q<question number>`; bare numbers get the prefix.
pub fn normalize_answer_key(raw: &str) -> String {
    let key = raw.trim();
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        format!("q{key}")
    } else {
        key.to_string()
    }
}

/// Applies [`normalize_answer_key`] to every question, rejecting two answers for one question.
pub fn normalize_answers<I>(raw: I) -> Result<BTreeMap<String, String>, ProfileError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut answers = BTreeMap::new();
    for (question, option) in raw {
        let key = normalize_answer_key(&question);
        if answers.insert(key.clone(), option).is_some() {
            return Err(duplicate_answer(&key));
        }
    }
    Ok(answers)
}

fn duplicate_answer(question: &str) -> ProfileError {
    ProfileError::InvalidSubmission(format!("question {question} is answered more than once"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(q, o)| (q.to_string(), o.to_string()))
            .collect()
    }

    #[test]
    fn rejects_negative_or_nan_monthly_value() {
        let now = Utc::now();
        for value in [-1.0, f64::NAN, f64::INFINITY] {
            let res = QuestionnaireSubmission::new(
                "user-1".to_string(),
                answers(&[("q1", "a")]),
                value,
                now,
            );
            assert!(matches!(res, Err(ProfileError::InvalidSubmission(_))));
        }
    }

    #[test]
    fn rejects_empty_answers() {
        let res = QuestionnaireSubmission::new("user-1".to_string(), BTreeMap::new(), 10.0, Utc::now());
        assert!(matches!(res, Err(ProfileError::InvalidSubmission(_))));
    }

    #[test]
    fn trims_identifiers_and_builds_request() {
        let submission = QuestionnaireSubmission::new(
            "user-1".to_string(),
            answers(&[(" q1 ", " b"), ("q2", "c")]),
            0.0,
            Utc::now(),
        )
        .unwrap();

        let req = submission.to_request();
        assert_eq!(req.user_id, "user-1");
        assert_eq!(req.answers.get("q1").map(String::as_str), Some("b"));
        assert_eq!(req.monthly_investment_value, 0.0);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let submission = QuestionnaireSubmission::new(
            "user-1".to_string(),
            answers(&[("q1", "b")]),
            500.0,
            Utc::now(),
        )
        .unwrap();
        let v = serde_json::to_value(&submission).unwrap();
        assert_eq!(v["userId"], "user-1");
        assert_eq!(v["monthlyInvestmentValue"], 500.0);
        assert!(v.get("completedAt").is_some());
    }

    #[test]
    fn prefixes_numeric_question_ids() {
        assert_eq!(normalize_answer_key("3"), "q3");
        assert_eq!(normalize_answer_key("q3"), "q3");
        assert_eq!(normalize_answer_key(" esg "), "esg");
    }

    #[test]
    fn numeric_and_prefixed_keys_for_one_question_collide() {
        let res = normalize_answers([
            ("1".to_string(), "a".to_string()),
            ("q1".to_string(), "b".to_string()),
        ]);
        assert!(matches!(res, Err(ProfileError::InvalidSubmission(msg)) if msg.contains("q1")));

        let ok = normalize_answers([
            ("1".to_string(), "a".to_string()),
            ("q2".to_string(), "b".to_string()),
        ])
        .unwrap();
        assert_eq!(ok, answers(&[("q1", "a"), ("q2", "b")]));
    }

    #[test]
    fn keys_equal_after_trimming_are_rejected() {
        let res = QuestionnaireSubmission::new(
            "user-1".to_string(),
            answers(&[("q1", "a"), (" q1", "b")]),
            10.0,
            Utc::now(),
        );
        assert!(matches!(res, Err(ProfileError::InvalidSubmission(_))));
    }
}
