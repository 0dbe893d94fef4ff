use reqwest::Client;
use serde_json::json;

/// Pushes aggregate correct/incorrect counters to the external question
/// bank. Fire-and-forget: failures are logged and never surfaced to the
/// quiz flow. Disabled entirely when no base URL is configured.
#[derive(Clone)]
pub struct QuestionBankService {
    client: Client,
    base_url: Option<String>,
}

impl QuestionBankService {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub async fn record_result(&self, question_id: i64, is_correct: bool) {
        let Some(base_url) = &self.base_url else {
            return;
        };
        let url = format!("{}/questions/{}", base_url.trim_end_matches('/'), question_id);
        let body = json!({
            "correct_delta": if is_correct { 1 } else { 0 },
            "incorrect_delta": if is_correct { 0 } else { 1 },
        });

        match self.client.patch(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                tracing::warn!(
                    question_id,
                    status = %resp.status(),
                    "question bank rejected counter update"
                );
            }
            Err(e) => {
                tracing::warn!(question_id, error = ?e, "question bank counter update failed");
            }
        }
    }
}
