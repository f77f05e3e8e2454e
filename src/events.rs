//! Change notifications for downstream price caches.

use serde::Serialize;

use crate::AppState;

/// Publish a JSON event when a NATS client is configured. Publish failures
/// are logged and never fail the admin write that triggered them.
pub async fn publish(state: &AppState, subject: &'static str, payload: &impl Serialize) {
    let Some(client) = &state.nats else { return };
    match serde_json::to_vec(payload) {
        Ok(bytes) => {
            if let Err(e) = client.publish(subject, bytes.into()).await {
                tracing::warn!(subject, error = %e, "event publish failed");
            }
        }
        Err(e) => tracing::warn!(subject, error = %e, "event serialization failed"),
    }
}
