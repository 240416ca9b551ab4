// region:    --- Imports
use crate::market::events::MarketEvent;
use crate::notify::MarketEventPublisher;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str) -> Result<Self, String> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| format!("Producer 생성 실패: {:?}", e))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), String> {
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Publisher
/// 시장 이벤트를 Kafka 토픽으로 발행 (판매 요청 id 를 키로 파티션 순서 유지)
pub struct KafkaPublisher {
    producer: KafkaProducer,
    topic: String,
}

impl KafkaPublisher {
    pub fn new(producer: KafkaProducer, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl MarketEventPublisher for KafkaPublisher {
    async fn publish(&self, event: &MarketEvent) -> Result<(), String> {
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;
        self.producer
            .send_message(&self.topic, &event.aggregate_key(), &payload)
            .await
    }
}

// endregion: --- Kafka Publisher

// region:    --- Topic Admin
/// 토픽 생성 (이미 있으면 브로커가 오류를 돌려주므로 로그만 남긴다)
pub async fn create_topic(
    brokers: &str,
    topic_name: &str,
    num_partitions: i32,
    replication_factor: i32,
) -> Result<(), String> {
    info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

    let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .create()
        .map_err(|e| format!("AdminClient 생성 실패: {:?}", e))?;

    let new_topic = NewTopic::new(
        topic_name,
        num_partitions,
        TopicReplication::Fixed(replication_factor),
    );

    match admin_client
        .create_topics(&[new_topic], &AdminOptions::new())
        .await
    {
        Ok(results) => {
            for result in results {
                match result {
                    Ok(topic) => info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", topic),
                    Err((topic, code)) => info!(
                        "{:<12} --> Kafka 토픽 생성 생략: {} ({:?})",
                        "Manager", topic, code
                    ),
                }
            }
            Ok(())
        }
        Err(e) => {
            error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Manager", e);
            Err(format!("토픽 생성 실패: {:?}", e))
        }
    }
}

// endregion: --- Topic Admin
