use std::sync::Arc;

use smstodo_core::signature::SignatureMethod;
use smstodo_core::sms::SmsSender;
use smstodo_core::store::ListStore;

/// Shared application state passed to all route handlers.
///
/// Dependencies are trait objects so tests can swap in fakes; there are
/// no process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ListStore>,
    pub sms: Arc<dyn SmsSender>,
    /// The service's own number — `from` on every reply.
    pub service_number: String,
    pub signature_secret: String,
    pub signature_method: SignatureMethod,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ListStore>,
        sms: Arc<dyn SmsSender>,
        service_number: impl Into<String>,
        signature_secret: impl Into<String>,
        signature_method: SignatureMethod,
    ) -> Self {
        Self {
            store,
            sms,
            service_number: service_number.into(),
            signature_secret: signature_secret.into(),
            signature_method,
        }
    }
}
