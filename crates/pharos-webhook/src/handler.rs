//! The transport-independent webhook handler.

use std::sync::Arc;

use pharos_core::Event;
use pharos_framework::EventBus;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, trace, warn};

use crate::error::{SignatureError, WebhookResult};
use crate::mapping::{EventFlow, route};
use crate::payload::{Challenge, OP_DISPATCH, OP_VALIDATION, Payload};
use crate::sign::ChallengeSigner;

/// Debug switches for the webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookDebugConfig {
    /// Log every raw envelope at debug level.
    pub print_webhook_data: bool,
}

/// Status and JSON body to send back to the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: Value,
}

impl WebhookResponse {
    fn ok() -> Self {
        Self {
            status: 200,
            body: json!({ "status": "ok" }),
        }
    }

    fn invalid_json() -> Self {
        Self {
            status: 400,
            body: json!({ "error": "invalid json" }),
        }
    }
}

struct Inner {
    bus: Arc<dyn EventBus>,
    signer: ChallengeSigner,
    debug: WebhookDebugConfig,
}

/// Answers webhook requests: validation challenges and event dispatch.
///
/// Cheap to clone; every clone shares the bus and the signing key.
#[derive(Clone)]
pub struct WebhookHandler {
    inner: Arc<Inner>,
}

impl WebhookHandler {
    /// Derives the signing key from `secret` once.
    pub fn new(
        bus: Arc<dyn EventBus>,
        secret: &str,
        debug: WebhookDebugConfig,
    ) -> Result<Self, SignatureError> {
        Ok(Self {
            inner: Arc::new(Inner {
                bus,
                signer: ChallengeSigner::new(secret)?,
                debug,
            }),
        })
    }

    pub fn signer(&self) -> &ChallengeSigner {
        &self.inner.signer
    }

    /// Handles one request body.
    ///
    /// Only a body that is not JSON gets a non-200 answer. Events that fail
    /// to build or publish are logged and still acknowledged, the platform
    /// would otherwise redeliver them.
    pub async fn handle(&self, body: &[u8]) -> WebhookResponse {
        let envelope: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, len = body.len(), "Webhook body is not valid JSON");
                return WebhookResponse::invalid_json();
            }
        };

        let op = envelope.get("op").and_then(Value::as_i64);

        if self.inner.debug.print_webhook_data {
            debug!(payload = %envelope, "Webhook data");
        }

        match op {
            Some(OP_DISPATCH) => {
                if let Err(e) = self.dispatch(envelope).await {
                    error!(error = %e, "Failed to handle webhook event");
                }
                WebhookResponse::ok()
            }
            Some(OP_VALIDATION) => self.validate(&envelope),
            other => {
                trace!(op = ?other, "Ignoring webhook op");
                WebhookResponse::ok()
            }
        }
    }

    fn validate(&self, envelope: &Value) -> WebhookResponse {
        let challenge = Challenge::from_envelope(envelope);
        let signature = self
            .inner
            .signer
            .sign_challenge(&challenge.event_ts, &challenge.plain_token);
        info!(event_ts = %challenge.event_ts, "Answered webhook validation");
        WebhookResponse {
            status: 200,
            body: json!({
                "plain_token": challenge.plain_token,
                "signature": signature,
            }),
        }
    }

    async fn dispatch(&self, envelope: Value) -> WebhookResult<()> {
        let payload = Payload::from_value(envelope)?;
        let Some(route) = route(&payload.t) else {
            debug!(event_type = %payload.t, "Unhandled event type");
            return Ok(());
        };

        let event: Event = (route.build)(&payload.d, &payload.id)?;
        let flow = EventFlow::describe(&event);
        info!(
            label = route.label,
            source = %flow.source,
            detail = %flow.detail,
            "Event received"
        );

        let report = self.inner.bus.publish(event).await?;
        trace!(
            event = %report.event,
            invoked = report.invoked,
            skipped = report.skipped,
            failed = report.failed,
            "Event dispatched"
        );
        Ok(())
    }
}

impl std::fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookHandler")
            .field("signer", &self.inner.signer)
            .field("debug", &self.inner.debug)
            .finish_non_exhaustive()
    }
}
