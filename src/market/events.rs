use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum MarketEvent {
    // 판매 요청 등록
    SellRequestCreated {
        sell_request_id: i64,
        seller_id: i64,
        timestamp: DateTime<Utc>,
    },
    // 매입 제안 등록 (금액은 판매자 채널에서만 노출되므로 싣지 않는다)
    OfferSubmitted {
        sell_request_id: i64,
        offer_id: i64,
        wholesaler_id: i64,
        timestamp: DateTime<Utc>,
    },
    // 낙찰
    OfferSelected {
        sell_request_id: i64,
        offer_id: i64,
        wholesaler_id: i64,
        timestamp: DateTime<Utc>,
    },
    // 판매 요청 취소
    SellRequestCancelled {
        sell_request_id: i64,
        timestamp: DateTime<Utc>,
    },
    // 거래 시작
    TransactionOpened {
        transaction_id: i64,
        sell_request_id: i64,
        purchase_offer_id: i64,
        timestamp: DateTime<Utc>,
    },
    // 거래 완료
    TransactionCompleted {
        transaction_id: i64,
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            MarketEvent::SellRequestCreated { .. } => "SellRequestCreated",
            MarketEvent::OfferSubmitted { .. } => "OfferSubmitted",
            MarketEvent::OfferSelected { .. } => "OfferSelected",
            MarketEvent::SellRequestCancelled { .. } => "SellRequestCancelled",
            MarketEvent::TransactionOpened { .. } => "TransactionOpened",
            MarketEvent::TransactionCompleted { .. } => "TransactionCompleted",
        }
    }

    /// 메시지 키로 쓰는 집계 id
    pub fn aggregate_key(&self) -> String {
        match self {
            MarketEvent::SellRequestCreated { sell_request_id, .. }
            | MarketEvent::OfferSubmitted { sell_request_id, .. }
            | MarketEvent::OfferSelected { sell_request_id, .. }
            | MarketEvent::SellRequestCancelled { sell_request_id, .. }
            | MarketEvent::TransactionOpened { sell_request_id, .. } => {
                format!("sell-request-{}", sell_request_id)
            }
            MarketEvent::TransactionCompleted { transaction_id, .. } => {
                format!("transaction-{}", transaction_id)
            }
        }
    }
}
