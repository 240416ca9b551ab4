/// 낙찰 이후 거래 장부 (외부 구성요소, 코어는 세 가지 연산만 호출한다)
// region:    --- Imports
use crate::error::MarketResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryTransactionLedger;
pub use postgres::PostgresTransactionLedger;

// endregion: --- Imports

// region:    --- Ledger Model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    InProgress,
    Completed,
}

// 거래 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub sell_request_id: i64,
    pub purchase_offer_id: i64,
    pub wholesaler_id: i64,
    pub seller_id: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// 신규 거래
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub sell_request_id: i64,
    pub purchase_offer_id: i64,
    pub wholesaler_id: i64,
    pub seller_id: i64,
    pub created_at: DateTime<Utc>,
}

// endregion: --- Ledger Model

// region:    --- Transaction Ledger Trait
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    async fn get_by_offer_id(&self, offer_id: i64) -> MarketResult<Option<Transaction>>;

    /// 상태 IN_PROGRESS 로 생성. 같은 제안에 이미 거래가 있으면 StateConflict
    async fn create(&self, new: NewTransaction) -> MarketResult<i64>;

    /// IN_PROGRESS -> COMPLETED. 이미 완료된 거래는 StateConflict
    async fn complete(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()>;
}

// endregion: --- Transaction Ledger Trait
