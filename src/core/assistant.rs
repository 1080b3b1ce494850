//! Oracle operations: correction suggestions, audit summaries and free-form
//! questions over a dataset.
//!
//! The model's output is never trusted. Correction suggestions are only
//! data here; nothing in this module mutates a dataset.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::retry::{retry_rate_limited, RetryPolicy};
use crate::adapters::{GenerationConfig, Oracle, OracleError};
use crate::domain::Dataset;

/// Returned when the summary call produced no text
pub const NO_SUMMARY_MESSAGE: &str = "No summary could be generated for these audit results.";

/// Returned when the free-form answer came back empty
pub const EMPTY_ANSWER_MESSAGE: &str = "Failed to get a response from the AI. Please try again.";

/// Returned after rate-limit retries are exhausted
pub const DEGRADED_SERVICE_MESSAGE: &str = "The AI service is currently experiencing high demand. \
Please try again later with a simpler question or fewer records.

Suggested actions:
1. Try a more specific question
2. Reduce the amount of data you're analyzing
3. Wait a few minutes before trying again";

/// Smallest output budget for free-form answers; grows 256 per retry
const FREEFORM_BASE_TOKENS: u32 = 1024;
const FREEFORM_TOKEN_STEP: u32 = 256;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("Invalid code fence regex")
});

/// One oracle verdict for a submitted name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleCorrection {
    pub original_name: String,
    pub suggested_name: String,
    pub has_correction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OracleCorrection {
    /// Whether applying this would change anything
    pub fn is_actionable(&self) -> bool {
        let suggested = self.suggested_name.trim();
        self.has_correction && !suggested.is_empty() && suggested != self.original_name
    }
}

fn corrections_prompt(names: &[String]) -> Result<String, OracleError> {
    let names_json =
        serde_json::to_string(names).map_err(|e| OracleError::Malformed(e.to_string()))?;

    Ok(format!(
        r#"You are an assistant specialized in validating and correcting Indian names.

You are given a JSON array of Indian names. For each name:
1. Check for spelling mistakes or formatting issues
2. Suggest a correction if needed, keeping the cultural context of the name intact
3. Give the reason for any correction

Common issues:
- Incorrect capitalization ("rahul sharma" should be "Rahul Sharma")
- Missing spaces between first and last names
- Misspelled common Indian names
- Misplaced syllables

Rules:
- If a name is already correct, suggest the same name and set hasCorrection to false
- Respect the cultural integrity of the name
- Keep the structure of the name unless there is a clear error
- Do not change regional naming conventions (South Indian vs North Indian patterns)

Input JSON:
{names_json}

Respond with JSON only, in this shape:
{{
  "correctionResults": [
    {{
      "originalName": "original name",
      "suggestedName": "corrected name",
      "hasCorrection": true,
      "reason": "explanation (if corrected)"
    }}
  ]
}}
"#
    ))
}

fn summary_prompt(audit_results: &str) -> String {
    format!(
        "You are an assistant who summarizes data audit results.\n\n\
         Given the following audit results, write a concise summary of the data quality \
         issues identified. Focus on the key findings and their implications for data \
         accuracy and reliability.\n\n\
         Audit Results: {audit_results}\n\n\
         Summary: "
    )
}

fn freeform_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an assistant that helps analyze police records data.\n\
         Answer the following question based only on the data provided.\n\n\
         DATA CONTEXT:\n{context}\n\n\
         USER QUESTION: {question}\n\n\
         Provide a clear, accurate, and concise answer based only on the provided data.\n\
         If the answer cannot be determined from the data, say so.\n"
    )
}

/// Strip an optional Markdown code fence around the model's JSON
fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Parse `{"correctionResults": [...]}` leniently.
///
/// Entries without `originalName` are dropped; a missing `suggestedName`
/// falls back to the original and a missing `hasCorrection` is false.
pub fn parse_corrections(text: &str) -> Result<Vec<OracleCorrection>, OracleError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(OracleError::Malformed("empty answer".to_string()));
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))?;

    let entries = value
        .get("correctionResults")
        .and_then(Value::as_array)
        .ok_or_else(|| OracleError::Malformed("missing correctionResults".to_string()))?;

    let corrections = entries
        .iter()
        .filter_map(|entry| {
            let original = entry.get("originalName")?.as_str()?.to_string();
            let suggested = entry
                .get("suggestedName")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| original.clone());
            let has_correction = entry
                .get("hasCorrection")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let reason = entry
                .get("reason")
                .and_then(Value::as_str)
                .filter(|r| !r.trim().is_empty())
                .map(str::to_string);

            Some(OracleCorrection {
                original_name: original,
                suggested_name: suggested,
                has_correction,
                reason,
            })
        })
        .collect();

    Ok(corrections)
}

/// Ask the oracle for corrections to a batch of names
#[instrument(skip_all, fields(oracle = oracle.name(), names = names.len()))]
pub async fn request_corrections(
    oracle: &dyn Oracle,
    config: &GenerationConfig,
    names: &[String],
) -> Result<Vec<OracleCorrection>, OracleError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = corrections_prompt(names)?;
    let answer = oracle.generate(&prompt, config).await?;
    let corrections = parse_corrections(&answer)?;

    info!(
        returned = corrections.len(),
        actionable = corrections.iter().filter(|c| c.is_actionable()).count(),
        "Oracle corrections received"
    );
    Ok(corrections)
}

/// Ask the oracle to summarize audit findings
#[instrument(skip_all, fields(oracle = oracle.name(), input_chars = audit_results.len()))]
pub async fn request_summary(
    oracle: &dyn Oracle,
    config: &GenerationConfig,
    audit_results: &str,
) -> Result<String, OracleError> {
    let answer = oracle.generate(&summary_prompt(audit_results), config).await?;
    let answer = answer.trim();
    if answer.is_empty() {
        warn!("Oracle returned an empty summary");
        return Ok(NO_SUMMARY_MESSAGE.to_string());
    }
    Ok(answer.to_string())
}

/// Answer a question about a dataset.
///
/// Never fails: rate limits are retried with a shrinking context and then
/// degrade to a fixed message, other errors become an "Error: ..." message.
#[instrument(skip_all, fields(oracle = oracle.name(), rows = dataset.len()))]
pub async fn request_freeform_answer(
    oracle: &dyn Oracle,
    config: &GenerationConfig,
    policy: &RetryPolicy,
    dataset: &Dataset,
    question: &str,
) -> String {
    let result = retry_rate_limited(policy, |attempt| {
        let rows = dataset.len() / (attempt as usize + 1);
        let context = serde_json::to_string_pretty(&dataset.to_json_rows(rows))
            .unwrap_or_else(|_| "[]".to_string());
        let prompt = freeform_prompt(&context, question);
        let attempt_config = GenerationConfig {
            max_output_tokens: config
                .max_output_tokens
                .min(FREEFORM_BASE_TOKENS + FREEFORM_TOKEN_STEP * attempt),
            ..config.clone()
        };
        info!(attempt, context_rows = rows, "Sending free-form question");

        async move { oracle.generate(&prompt, &attempt_config).await }
    })
    .await;

    match result {
        Ok(answer) if answer.trim().is_empty() => EMPTY_ANSWER_MESSAGE.to_string(),
        Ok(answer) => answer,
        Err(OracleError::RateLimited) => {
            warn!("Rate limit retries exhausted");
            DEGRADED_SERVICE_MESSAGE.to_string()
        }
        Err(e) => {
            warn!(error = %e, "Free-form question failed");
            format!("Error: {}. Please try again with a different question.", e)
        }
    }
}
