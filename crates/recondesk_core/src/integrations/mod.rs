//! Outbound integrations: GitHub commits, the REST backend and deploy status.
//!
//! All calls are async (reqwest on tokio). Failures are surfaced with the
//! upstream message; nothing is retried.

pub mod deploy;
pub mod github;
pub mod poller;
pub mod supabase;

/// Extracts the `message` field from an error body, or falls back to the
/// raw body, or to the bare status code.
pub(crate) fn upstream_message(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    if let Some(message) = parsed
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(|value| value.as_str())
    {
        return message.to_string();
    }
    let body = body.trim();
    if body.is_empty() {
        format!("request failed with status {status}")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::upstream_message;

    #[test]
    fn upstream_message_prefers_json_message_field() {
        assert_eq!(
            upstream_message(422, r#"{"message":"Reference update failed","documentation_url":"x"}"#),
            "Reference update failed"
        );
        assert_eq!(upstream_message(502, "bad gateway"), "bad gateway");
        assert_eq!(upstream_message(500, "  "), "request failed with status 500");
    }
}
