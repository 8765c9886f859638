use anyhow::{bail, Context, Result};
use reqwest::{header::USER_AGENT, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    success: bool,
    record: Option<PunishmentRecord>,
}

#[derive(Debug, Deserialize)]
struct PunishmentRecord {
    staff_total: Option<i64>,
}

/// Client for the punishment-stats endpoint. One GET per call, no retries; a
/// failed call surfaces as `None` and the next tick simply tries again.
pub struct StatsClient {
    client: Client,
    api_url: String,
    user_agent: String,
}

impl StatsClient {
    pub fn new(api_url: &str, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build stats http client")?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    /// Fetches the current staff ban counter. Transport errors, non-200
    /// statuses, empty bodies and malformed or incomplete payloads all
    /// collapse to `None` after a warning; the caller decides what a missed
    /// sample means for the tick.
    pub async fn fetch(&self) -> Option<i64> {
        match self.try_fetch().await {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(url = %self.api_url, error = %err, "stats fetch failed");
                None
            }
        }
    }

    async fn try_fetch(&self) -> Result<i64> {
        let response = self
            .client
            .get(&self.api_url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .context("request failed")?;
        let status = response.status();
        if status != StatusCode::OK {
            bail!("unexpected status {status}");
        }
        let body = response.text().await.context("failed to read body")?;
        decode_stats(&body)
    }
}

/// Decodes the punishment-stats payload down to the staff ban counter.
fn decode_stats(body: &str) -> Result<i64> {
    if body.trim().is_empty() {
        bail!("empty body");
    }
    let payload: StatsResponse =
        serde_json::from_str(body).context("malformed payload")?;
    if !payload.success {
        bail!("payload success flag not set");
    }
    let record = payload.record.context("payload missing record")?;
    record.staff_total.context("record missing staff_total")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_counter_and_ignores_extra_fields() {
        let body = r#"{
            "success": true,
            "record": {
                "watchdog_total": 9000000,
                "staff_total": 1234,
                "staff_rollingDaily": 10
            }
        }"#;
        assert_eq!(decode_stats(body).expect("decode"), 1234);
    }

    #[test]
    fn empty_body_is_rejected() {
        let err = decode_stats("   \n").expect_err("empty body");
        assert!(err.to_string().contains("empty body"));
    }

    #[test]
    fn non_json_body_is_rejected() {
        let err = decode_stats("<html>rate limited</html>").expect_err("html body");
        assert!(err.to_string().contains("malformed payload"));
    }

    #[test]
    fn unset_success_flag_is_rejected() {
        let err = decode_stats(r#"{"success": false, "record": {"staff_total": 5}}"#)
            .expect_err("success false");
        assert!(err.to_string().contains("success flag"));

        // A payload without the flag at all reads the same way.
        let err = decode_stats(r#"{"record": {"staff_total": 5}}"#).expect_err("missing flag");
        assert!(err.to_string().contains("success flag"));
    }

    #[test]
    fn missing_record_is_rejected() {
        let err = decode_stats(r#"{"success": true}"#).expect_err("missing record");
        assert!(err.to_string().contains("missing record"));
    }

    #[test]
    fn missing_counter_is_rejected() {
        let err = decode_stats(r#"{"success": true, "record": {"watchdog_total": 1}}"#)
            .expect_err("missing staff_total");
        assert!(err.to_string().contains("staff_total"));
    }

    #[test]
    fn non_integer_counter_is_rejected() {
        let err = decode_stats(r#"{"success": true, "record": {"staff_total": "many"}}"#)
            .expect_err("string counter");
        assert!(err.to_string().contains("malformed payload"));
    }
}
