use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Raised when a step received from upstream cannot be attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepError {
    #[error("step instruction cannot be empty")]
    MissingInstruction,

    #[error("step expected answer cannot be empty")]
    MissingExpectedAnswer,
}

//
// ─── STEP ──────────────────────────────────────────────────────────────────────
//

/// One unit of a multi-step problem, as produced by the problem service.
///
/// Steps are immutable once received. Fields the client does not understand
/// are kept in `extra` so the step can be sent back verbatim for grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, deserialize_with = "lenient_text")]
    instruction: String,
    #[serde(default, deserialize_with = "lenient_text")]
    expected_answer: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    explanation: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    hint: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Scalars become their text form; null, arrays and objects carry no text.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// A single badly typed field must not sink the whole step list; `validate`
// rejects the step when it is reached instead.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

impl Step {
    #[must_use]
    pub fn new(instruction: impl Into<String>, expected_answer: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            expected_answer: expected_answer.into(),
            explanation: None,
            hint: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    #[must_use]
    pub fn expected_answer(&self) -> &str {
        &self.expected_answer
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Upstream fields that are not modelled explicitly.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Check that the step carries what grading and disclosure need.
    ///
    /// # Errors
    ///
    /// Returns `StepError::MissingInstruction` or `StepError::MissingExpectedAnswer`
    /// when the corresponding field is blank.
    pub fn validate(&self) -> Result<(), StepError> {
        if self.instruction.trim().is_empty() {
            return Err(StepError::MissingInstruction);
        }
        if self.expected_answer.trim().is_empty() {
            return Err(StepError::MissingExpectedAnswer);
        }
        Ok(())
    }
}
