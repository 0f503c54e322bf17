use aegis_core::MonitorEvent;
use async_trait::async_trait;

/// Port to the external notification layer (chat bot, pager, ...)
///
/// Delivery failures stay inside the sink; monitoring never fails because
/// an alert could not be sent.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn publish(&self, event: MonitorEvent);
}
