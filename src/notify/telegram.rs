use crate::models::TradeAction;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sends plain-text messages to one Telegram chat through the Bot API
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    token: String,
    chat_id: String,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// POST `sendMessage` with the chat id and text
    pub async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);

        let response = self
            .client
            .post(&url)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            .context("Telegram request failed")?;

        let status = response.status();
        let body: SendMessageResponse = response
            .json()
            .await
            .with_context(|| format!("Unexpected Telegram response ({})", status))?;

        if !status.is_success() || !body.ok {
            anyhow::bail!(
                "Telegram API error ({}): {}",
                status,
                body.description.unwrap_or_default()
            );
        }

        Ok(())
    }
}

/// Drain `rx` until every sender is dropped, delivering each action.
///
/// Delivery is best-effort: failures are logged and skipped. Without a
/// notifier the actions are just consumed.
///
/// # Returns
/// Number of messages delivered
pub async fn run_notifier(
    notifier: Option<TelegramNotifier>,
    symbol: String,
    mut rx: UnboundedReceiver<TradeAction>,
) -> usize {
    let mut delivered = 0;

    while let Some(action) = rx.recv().await {
        let Some(notifier) = notifier.as_ref() else {
            continue;
        };

        match notifier.send(&action.describe(&symbol)).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!("Telegram alert failed: {:#}", e),
        }
    }

    delivered
}
