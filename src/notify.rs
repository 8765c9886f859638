use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use crate::chart::{DAY_CHART_FILE, HOUR_CHART_FILE};

pub const HOUR_EMBED_TITLE: &str = "Staff bans for the last hour";
pub const DAY_EMBED_TITLE: &str = "Staff bans for the last day";

const HOUR_EMBED_COLOR: u32 = 14_221_148;
const DAY_EMBED_COLOR: u32 = 16_767_327;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers the chart pair to a Discord-compatible webhook as one multipart
/// request: a `payload_json` field with two embeds plus both images as file
/// parts the embeds reference by attachment name.
pub struct Notifier {
    client: Client,
    webhook_url: String,
}

impl Notifier {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .context("failed to build webhook http client")?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
        })
    }

    /// Uploads both images in one request. 200 and 204 count as delivered;
    /// any other status or a transport failure comes back as an error that
    /// carries whatever the webhook said, for the caller to log. Delivery is
    /// fire-and-forget beyond that, there is no retry.
    pub async fn send_chart_pair(&self, hour_png: &Path, day_png: &Path) -> Result<()> {
        let hour_bytes = tokio::fs::read(hour_png)
            .await
            .with_context(|| format!("failed to read hour chart {}", hour_png.display()))?;
        let day_bytes = tokio::fs::read(day_png)
            .await
            .with_context(|| format!("failed to read day chart {}", day_png.display()))?;

        let form = Form::new()
            .text("payload_json", embed_payload().to_string())
            .part(
                "files[0]",
                Part::bytes(hour_bytes)
                    .file_name(HOUR_CHART_FILE)
                    .mime_str("image/png")
                    .context("invalid mime for hour chart part")?,
            )
            .part(
                "files[1]",
                Part::bytes(day_bytes)
                    .file_name(DAY_CHART_FILE)
                    .mime_str("image/png")
                    .context("invalid mime for day chart part")?,
            );

        let response = self
            .client
            .post(&self.webhook_url)
            .multipart(form)
            .send()
            .await
            .context("webhook request failed")?;

        let status = response.status();
        if !matches!(status.as_u16(), 200 | 204) {
            let body = response.text().await.unwrap_or_default();
            bail!("webhook rejected upload: status {status}, body '{body}'");
        }
        Ok(())
    }
}

/// The `payload_json` form field: one embed per chart, each pointing at its
/// file part through an `attachment://` URL.
fn embed_payload() -> serde_json::Value {
    json!({
        "embeds": [
            {
                "title": HOUR_EMBED_TITLE,
                "color": HOUR_EMBED_COLOR,
                "image": { "url": format!("attachment://{HOUR_CHART_FILE}") }
            },
            {
                "title": DAY_EMBED_TITLE,
                "color": DAY_EMBED_COLOR,
                "image": { "url": format!("attachment://{DAY_CHART_FILE}") }
            }
        ]
    })
}
