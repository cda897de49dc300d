//! Centralized sink for delivery faults.

use tracing::error;

use crate::error::DeliveryError;

/// Receives every fault the delivery loop catches. Never rethrows.
pub trait FaultHandler: Send + Sync {
    fn report(&self, client_id: &str, error: &DeliveryError);
}

/// Logs faults and counts them by kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFaultHandler;

impl FaultHandler for TracingFaultHandler {
    fn report(&self, client_id: &str, error: &DeliveryError) {
        crate::metrics::record_fault(error.error_code());
        error!(client = %client_id, kind = error.error_code(), error = %error, "Delivery fault");
    }
}
