use std::time::Duration;

use crate::prelude::*;

#[derive(Debug, serde::Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// Text announcing which sources changed.
pub fn change_message(kinds: &[String], updated_at: &str) -> String {
    f!("Orarul a fost actualizat ({}): {}", updated_at, kinds.join(", "))
}

/// Posts `text` to the webhook.  Callers log the error instead of failing.
pub async fn notify(client: &reqwest::Client, webhook: &str, text: &str) -> Result<()> {
    let response = client
        .post(webhook)
        .timeout(Duration::from_secs(10))
        .json(&WebhookMessage { text })
        .send()
        .await
        .map_err(|e| Error::Network(f!("webhook: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::Network(f!("webhook: HTTP {}", response.status())).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_message_lists_kinds() {
        let msg = change_message(&["liceu".into(), "gimnaziu".into()], "2026-01-05 08:00");
        assert_eq!(
            msg,
            "Orarul a fost actualizat (2026-01-05 08:00): liceu, gimnaziu"
        );
    }

    #[test]
    fn test_webhook_payload_shape() {
        let json = serde_json::to_string(&WebhookMessage { text: "hi" }).unwrap();
        assert_eq!(json, r#"{"text":"hi"}"#);
    }
}
