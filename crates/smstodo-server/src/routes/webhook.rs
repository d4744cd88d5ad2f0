//! The inbound-SMS webhook: the gateway POSTs a form-encoded payload
//! here for every message sent to the service number.
//!
//! Per-request pipeline: extract fields → verify signature → parse
//! command → execute against the store → send the reply SMS → 200.
//! Authentication and payload failures terminate before any store
//! access; a failed reply send never changes the committed HTTP status.

use axum::extract::{RawForm, State};
use axum::Json;
use chrono::Utc;

use smstodo_core::command::Command;
use smstodo_core::{executor, phone, signature};

use crate::error::AppError;
use crate::state::AppState;

const INTERNAL_ERROR_REPLY: &str =
    "Sorry, an internal error occurred. Please try again later.";

/// POST /webhooks/inbound-sms
pub async fn inbound_sms(
    State(app): State<AppState>,
    RawForm(body): RawForm,
) -> Result<Json<serde_json::Value>, AppError> {
    // Keep the full parameter list (duplicates included) — the signature
    // covers every parameter the gateway sent.
    let params: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
        .map_err(|e| AppError::bad_request(format!("unparseable form body: {e}")))?;
    let field = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let Some(sender_raw) = field("msisdn") else {
        return Err(AppError::bad_request("missing field: msisdn"));
    };
    let Some(service_raw) = field("to") else {
        return Err(AppError::bad_request("missing field: to"));
    };
    let Some(text) = field("text") else {
        return Err(AppError::bad_request("missing field: text"));
    };
    let message_id = field("messageId").unwrap_or("UNKNOWN").to_string();

    let Some(sender) = phone::normalize(sender_raw) else {
        return Err(AppError::bad_request(format!(
            "unparseable sender number: {sender_raw}"
        )));
    };
    if phone::normalize(service_raw).is_none() {
        return Err(AppError::bad_request(format!(
            "unparseable recipient number: {service_raw}"
        )));
    }

    // Fail closed before touching any state.
    let sig = field("sig").unwrap_or("");
    let timestamp = field("timestamp").unwrap_or("");
    if !signature::verify(
        &params,
        sig,
        &app.signature_secret,
        timestamp,
        Utc::now(),
        app.signature_method,
    ) {
        tracing::warn!(%message_id, "rejected webhook: signature verification failed");
        return Err(AppError::unauthorized("invalid signature"));
    }

    let command = Command::parse(text);
    tracing::info!(%message_id, sender = %sender, command = command.keyword(), "processing message");

    let store = app.store.clone();
    let exec_owner = sender.clone();
    let exec_command = command.clone();
    let executed = tokio::task::spawn_blocking(move || {
        executor::execute(&exec_command, &exec_owner, store.as_ref())
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;

    let reply = match executed {
        Ok(reply) => reply,
        Err(e) => {
            // Store failure: tell the user something went wrong. If even
            // that attempt fails, surface 500 so the gateway retries —
            // reprocessing is safe (idempotent add, done-on-missing no-op).
            tracing::error!(%message_id, error = %e, "command execution failed");
            send_reply(&app, &sender, INTERNAL_ERROR_REPLY.to_string())
                .await
                .map_err(|send_err| {
                    AppError(anyhow::anyhow!(
                        "store failure and failure reply undeliverable: {send_err}"
                    ))
                })?;
            return Ok(Json(serde_json::json!({ "status": "ok" })));
        }
    };

    // Reply delivery is best-effort; the 200 acknowledges webhook receipt,
    // not reply delivery.
    if let Err(e) = send_reply(&app, &sender, reply).await {
        tracing::error!(%message_id, to = %sender, error = %e, "failed to send reply sms");
    }

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn send_reply(app: &AppState, to: &str, text: String) -> anyhow::Result<()> {
    let sms = app.sms.clone();
    let from = app.service_number.clone();
    let to = to.to_string();
    tokio::task::spawn_blocking(move || sms.send(&from, &to, &text))
        .await
        .map_err(|e| anyhow::anyhow!("task join error: {e}"))??;
    Ok(())
}
