/// 시장 이벤트 구독 인터페이스
/// 커밋 이후에 발행하며, 발행 실패는 이미 반영된 변경을 되돌리지 않는다.
// region:    --- Imports
use crate::market::events::MarketEvent;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

// endregion: --- Imports

// region:    --- Publisher Trait
#[async_trait]
pub trait MarketEventPublisher: Send + Sync {
    async fn publish(&self, event: &MarketEvent) -> Result<(), String>;
}

/// 발행하지 않음
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl MarketEventPublisher for NoopPublisher {
    async fn publish(&self, event: &MarketEvent) -> Result<(), String> {
        debug!("{:<12} --> 발행 생략: {}", "Publisher", event.event_type());
        Ok(())
    }
}

// endregion: --- Publisher Trait

// region:    --- Broadcast Publisher
/// 프로세스 내 구독자에게 전달
pub struct BroadcastPublisher {
    sender: broadcast::Sender<MarketEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl MarketEventPublisher for BroadcastPublisher {
    async fn publish(&self, event: &MarketEvent) -> Result<(), String> {
        // 구독자가 없으면 버린다
        let receivers = self.sender.send(event.clone()).unwrap_or(0);
        debug!(
            "{:<12} --> {} 전달, 구독자 {}명",
            "Publisher",
            event.event_type(),
            receivers
        );
        Ok(())
    }
}

// endregion: --- Broadcast Publisher

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscriber() {
        let publisher = BroadcastPublisher::new(8);
        let mut receiver = publisher.subscribe();

        let event = MarketEvent::SellRequestCancelled {
            sell_request_id: 3,
            timestamp: Utc::now(),
        };
        publisher.publish(&event).await.unwrap();

        assert_eq!(receiver.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::new(8);
        let event = MarketEvent::TransactionCompleted {
            transaction_id: 1,
            timestamp: Utc::now(),
        };
        assert!(publisher.publish(&event).await.is_ok());
    }
}
// endregion: --- Tests
