//! Natural-language expense interpreter.
//!
//! A thin client for the Gemini `generateContent` API that turns a chat
//! message into a *candidate* expense: description, total, payer name and
//! claimed per-member amounts. The candidate is data from an untrusted
//! source; the chat handler resolves the names and feeds the amounts to
//! [`ledger::SplitCandidate`], which re-validates the arithmetic before
//! anything is recorded.

use ledger::Money;
use serde::Deserialize;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Long-lived interpreter client, constructed once at startup and passed to
/// request handlers through the server state.
pub struct Interpreter {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

/// One claimed split row, as returned by the model.
#[derive(Clone, Debug, Deserialize)]
pub struct CandidateSplit {
    pub user: String,
    pub amount: serde_json::Number,
    #[serde(default)]
    pub method: Option<String>,
}

/// The candidate expense extracted from the model's reply.
#[derive(Clone, Debug, Deserialize)]
pub struct CandidateExpense {
    pub description: String,
    pub amount: serde_json::Number,
    pub paid_by: String,
    #[serde(default)]
    pub expense_type: Option<String>,
    #[serde(default)]
    pub splits: Vec<CandidateSplit>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ReplyCandidate>,
}

#[derive(Deserialize)]
struct ReplyCandidate {
    content: ReplyContent,
}

#[derive(Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

impl Interpreter {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Asks the model to parse `message` into a candidate expense.
    ///
    /// Returns `Ok(None)` when the reply contains no parseable candidate
    /// (not an expense, or the model answered with its error object).
    pub async fn parse_expense(
        &self,
        message: &str,
        member_names: &[String],
    ) -> Result<Option<CandidateExpense>, reqwest::Error> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt(message, member_names) }] }]
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let response: GenerateResponse = response.json().await?;

        let text = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.clone())
            .unwrap_or_default();
        Ok(extract_candidate(&text))
    }
}

fn prompt(message: &str, member_names: &[String]) -> String {
    let names = if member_names.is_empty() {
        "any member names mentioned".to_string()
    } else {
        member_names.join(", ")
    };

    format!(
        r#"Parse this expense message into a JSON object.

Message: "{message}"
Group members: {names}

Supported scenarios: equal splitting ("split equally among John, Mary and me"),
ratio splitting ("2/3 to Fury, rest to me"), percentage splitting ("70% to
Alice, 30% to me"), explicit amounts ("John owes $30, Mary owes $20"), and
lending ("I lent $50 to Alice").

Return exactly this JSON shape and nothing else:
{{
  "description": "what the money was spent on",
  "amount": 150.00,
  "paid_by": "name of the payer, or 'me'",
  "expense_type": "split" | "lend" | "personal",
  "splits": [
    {{"user": "Fury", "amount": 100.00, "method": "ratio"}},
    {{"user": "me", "amount": 50.00, "method": "ratio"}}
  ]
}}

Rules:
- amounts have at most two decimals and the splits must sum to the total
- use "me" for the message author
- map names to the group members listed above
- if the message is not about an expense, return {{"error": "not an expense"}}"#
    )
}

/// Pulls the first JSON object out of the model's reply. Anything that is
/// not a well-formed candidate, including the model's own error object,
/// yields `None`.
fn extract_candidate(text: &str) -> Option<CandidateExpense> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    let raw = text.get(start..=end)?;

    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    if value.get("error").is_some() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Converts a candidate decimal amount into minor units. Amounts with more
/// than two decimals are interpreter artifacts and are rejected rather than
/// rounded.
pub(crate) fn candidate_amount(amount: &serde_json::Number) -> Option<Money> {
    amount.to_string().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_candidate_from_surrounding_prose() {
        let text = r#"Sure! Here is the parsed expense:
```json
{"description": "food", "amount": 150.0, "paid_by": "me", "expense_type": "split",
 "splits": [{"user": "Fury", "amount": 100.0, "method": "ratio"},
            {"user": "me", "amount": 50.0, "method": "ratio"}]}
```"#;
        let candidate = extract_candidate(text).unwrap();
        assert_eq!(candidate.description, "food");
        assert_eq!(candidate.paid_by, "me");
        assert_eq!(candidate.splits.len(), 2);
        assert_eq!(candidate.splits[0].user, "Fury");
    }

    #[test]
    fn error_replies_yield_none() {
        assert!(extract_candidate(r#"{"error": "not an expense"}"#).is_none());
        assert!(extract_candidate("no json here").is_none());
        assert!(extract_candidate(r#"{"amount": "broken"#).is_none());
    }

    #[test]
    fn candidate_amounts_convert_to_minor_units() {
        let amount: serde_json::Number = serde_json::from_str("150.0").unwrap();
        assert_eq!(candidate_amount(&amount), Some(Money::new(15000)));
        let amount: serde_json::Number = serde_json::from_str("33.33").unwrap();
        assert_eq!(candidate_amount(&amount), Some(Money::new(3333)));
        let amount: serde_json::Number = serde_json::from_str("25").unwrap();
        assert_eq!(candidate_amount(&amount), Some(Money::new(2500)));
    }

    #[test]
    fn overly_precise_amounts_are_rejected() {
        let amount: serde_json::Number = serde_json::from_str("33.333333").unwrap();
        assert_eq!(candidate_amount(&amount), None);
    }
}
