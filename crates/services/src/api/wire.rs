//! JSON shapes exchanged with the tutor service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tutor_core::model::Step;

use super::{Grading, ProblemBreakdown};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub(super) struct TextProblemRequest<'a> {
    pub problem: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct AnswerRequest<'a> {
    pub step_data: &'a Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProblemEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    problem: Option<String>,
    #[serde(default)]
    steps: Option<StepsPayload>,
    #[serde(default)]
    error: Option<String>,
}

/// The service nests the list (`{"steps": {"steps": [...]}}`); a bare list is tolerated.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepsPayload {
    Nested { steps: Vec<Step> },
    Flat(Vec<Step>),
}

impl StepsPayload {
    fn into_steps(self) -> Vec<Step> {
        match self {
            StepsPayload::Nested { steps } | StepsPayload::Flat(steps) => steps,
        }
    }
}

impl ProblemEnvelope {
    pub fn into_breakdown(self, submitted_text: Option<&str>) -> Result<ProblemBreakdown, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected { reason: self.error });
        }
        let steps = self
            .steps
            .ok_or_else(|| ApiError::Malformed("response has no steps".into()))?
            .into_steps();
        let problem = self
            .problem
            .filter(|p| !p.trim().is_empty())
            .or_else(|| submitted_text.map(str::to_owned))
            .ok_or_else(|| ApiError::Malformed("response has no problem text".into()))?;
        Ok(ProblemBreakdown { problem, steps })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ValidationEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    validation: Option<ValidationBody>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidationBody {
    is_correct: bool,
    #[serde(default)]
    explanation: Option<String>,
}

impl ValidationEnvelope {
    pub fn into_grading(self) -> Result<Grading, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected { reason: self.error });
        }
        let body = self
            .validation
            .ok_or_else(|| ApiError::Malformed("response has no validation".into()))?;
        Ok(Grading {
            is_correct: body.is_correct,
            explanation: body.explanation,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct HealthResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Pull a human-readable reason out of an error body.
///
/// Accepts `{"detail": "..."}`, `{"detail": [...]}` and `{"error": "..."}`.
pub(super) fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let detail = value.get("detail").or_else(|| value.get("error"))?;
    match detail {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_and_flat_step_lists_parse() {
        let nested: ProblemEnvelope = serde_json::from_str(
            r#"{"success":true,"problem":"2x=8","steps":{"steps":[{"instruction":"Divide","expected_answer":"4"}]}}"#,
        )
        .unwrap();
        let breakdown = nested.into_breakdown(None).unwrap();
        assert_eq!(breakdown.problem, "2x=8");
        assert_eq!(breakdown.steps.len(), 1);

        let flat: ProblemEnvelope = serde_json::from_str(
            r#"{"success":true,"steps":[{"instruction":"Divide","expected_answer":"4"}]}"#,
        )
        .unwrap();
        let breakdown = flat.into_breakdown(Some("2x = 8")).unwrap();
        assert_eq!(breakdown.problem, "2x = 8");
        assert_eq!(breakdown.steps[0].expected_answer(), "4");
    }

    #[test]
    fn unsuccessful_envelope_is_rejected() {
        let env: ProblemEnvelope =
            serde_json::from_str(r#"{"success":false,"error":"quota exceeded"}"#).unwrap();
        let err = env.into_breakdown(Some("x")).unwrap_err();
        assert_eq!(err.detail(), Some("quota exceeded"));
    }

    #[test]
    fn validation_without_body_is_malformed() {
        let env: ValidationEnvelope = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(env.into_grading(), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn error_detail_reads_common_shapes() {
        assert_eq!(
            error_detail(br#"{"detail":"Could not extract problem from image"}"#).as_deref(),
            Some("Could not extract problem from image")
        );
        assert_eq!(
            error_detail(br#"{"success":false,"error":"boom"}"#).as_deref(),
            Some("boom")
        );
        assert!(error_detail(b"<html>bad gateway</html>").is_none());
        assert!(
            error_detail(br#"{"detail":[{"loc":["query","problem"]}]}"#)
                .unwrap()
                .contains("problem")
        );
    }
}
