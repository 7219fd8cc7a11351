use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Domain events emitted after a flow commits. Delivery is best-effort; a
/// failed send is a warning at the call site, never a request failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    UserRegistered(i32),
    MedicineCreated(i32),
    MedicineUpdated(i32),
    MedicineDeleted(i32),
    SupplierCreated(i32),
    SupplierUpdated(i32),
    SupplierDeleted(i32),
    PurchaseCreated(i32),
    PurchaseUpdated(i32),
    PurchaseDeleted(i32),
    SaleCreated(i32),
    SaleUpdated(i32),
    SaleDeleted(i32),
    PasswordResetRequested(i32),
    PasswordResetCompleted(i32),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes events off the channel and logs them. Runs until every sender is
/// dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        info!(?event, "domain event");
    }
    info!("event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender.send(Event::SaleCreated(7)).await.unwrap();
        match rx.recv().await {
            Some(Event::SaleCreated(7)) => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_after_receiver_drops() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::PurchaseCreated(1)).await.is_err());
    }
}
