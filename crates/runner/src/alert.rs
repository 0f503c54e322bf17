//! Alert sinks for monitoring events

use aegis_core::MonitorEvent;
use aegis_ports::AlertSink;
use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::mpsc;

/// Writes every event to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn publish(&self, event: MonitorEvent) {
        match &event {
            MonitorEvent::ThresholdBreached { snapshot, quote } => warn!(
                "[MONITOR] ALERT {}: net delta {:.4} exceeds limit {:.4} (spot {:?}, basis {:?})",
                snapshot.asset,
                snapshot.net_delta,
                snapshot.threshold_limit,
                quote.spot,
                quote.basis()
            ),
            MonitorEvent::HedgeExecuted { snapshot, result, .. } => info!(
                "[MONITOR] HEDGE {}: {} {} size {:.4} cost {:.4} (net delta was {:.4})",
                snapshot.asset,
                result.strategy,
                result.instrument,
                result.size,
                result.cost,
                snapshot.net_delta
            ),
            MonitorEvent::DataUnavailable {
                asset,
                exchanges,
                reason,
            } => warn!(
                "[MONITOR] DATA {asset}: unavailable on {:?}: {reason}",
                exchanges
            ),
        }
    }
}

/// Forwards events to the notification layer over a channel
///
/// A closed or full receiver drops the event with a warning.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    tx: mpsc::Sender<MonitorEvent>,
}

impl ChannelAlertSink {
    pub fn new(tx: mpsc::Sender<MonitorEvent>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end, with room for `capacity` pending events
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<MonitorEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl AlertSink for ChannelAlertSink {
    async fn publish(&self, event: MonitorEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!("[MONITOR] Dropping alert for {}: {e}", alert_asset(&e));
        }
    }
}

fn alert_asset(err: &mpsc::error::TrySendError<MonitorEvent>) -> &str {
    match err {
        mpsc::error::TrySendError::Full(event) | mpsc::error::TrySendError::Closed(event) => {
            event.asset()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::ExchangeId;

    fn unavailable(asset: &str) -> MonitorEvent {
        MonitorEvent::DataUnavailable {
            asset: asset.to_string(),
            exchanges: vec![ExchangeId::Deribit],
            reason: "timeout".to_string(),
        }
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelAlertSink::channel(8);
        sink.publish(unavailable("BTC")).await;
        sink.publish(unavailable("ETH")).await;

        assert_eq!(rx.recv().await.unwrap().asset(), "BTC");
        assert_eq!(rx.recv().await.unwrap().asset(), "ETH");
    }

    #[tokio::test]
    async fn test_channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelAlertSink::channel(1);
        drop(rx);
        sink.publish(unavailable("BTC")).await;
    }

    #[tokio::test]
    async fn test_log_sink_accepts_every_event() {
        let _ = env_logger::try_init();
        LogAlertSink.publish(unavailable("SOL")).await;
    }
}
