// region:    --- Imports
use resale_market_service::config::{Config, StoreBackend};
use resale_market_service::database::DatabaseManager;
use resale_market_service::handlers;
use resale_market_service::ledger::{
    InMemoryTransactionLedger, PostgresTransactionLedger, TransactionLedger,
};
use resale_market_service::market::service::MarketService;
use resale_market_service::message_broker::{self, KafkaProducer, KafkaPublisher};
use resale_market_service::notify::{MarketEventPublisher, NoopPublisher};
use resale_market_service::store::{InMemoryMarketStore, MarketStore, PostgresMarketStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // 저장소 구성
    let (store, ledger): (Arc<dyn MarketStore>, Arc<dyn TransactionLedger>) =
        match (&config.backend, &config.database) {
            (StoreBackend::Postgres, Some(database)) => {
                let db_manager = Arc::new(DatabaseManager::new(database).await?);
                if let Err(e) = db_manager.initialize_database(database.reset).await {
                    error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                    return Err(e.into());
                }
                info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
                let store: Arc<dyn MarketStore> =
                    Arc::new(PostgresMarketStore::new(Arc::clone(&db_manager)));
                let ledger: Arc<dyn TransactionLedger> =
                    Arc::new(PostgresTransactionLedger::new(db_manager));
                (store, ledger)
            }
            _ => {
                warn!("{:<12} --> 메모리 저장소로 실행 (재시작 시 데이터 유실)", "Main");
                let store: Arc<dyn MarketStore> = Arc::new(InMemoryMarketStore::new());
                let ledger: Arc<dyn TransactionLedger> = Arc::new(InMemoryTransactionLedger::new());
                (store, ledger)
            }
        };

    // 이벤트 발행 구성
    let publisher: Arc<dyn MarketEventPublisher> = match &config.kafka {
        Some(kafka) => {
            message_broker::create_topic(&kafka.brokers, &kafka.topic, 5, 1).await?;
            let producer = KafkaProducer::new(&kafka.brokers)?;
            info!("{:<12} --> Kafka 발행 활성화: {}", "Main", kafka.topic);
            Arc::new(KafkaPublisher::new(producer, kafka.topic.clone()))
        }
        None => Arc::new(NoopPublisher),
    };

    let service = Arc::new(MarketService::new(store, ledger).with_publisher(publisher));
    let routes_all = handlers::router(service);

    // 리스너 생성
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
