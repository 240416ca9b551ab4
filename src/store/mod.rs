/// 판매 요청 / 매입 제안 저장소
/// 중복 입찰과 이중 낙찰 경쟁은 저장소가 조건부 쓰기로 막는다.
// region:    --- Imports
use crate::error::{MarketError, MarketResult};
use crate::market::model::{NewPurchaseOffer, NewSellRequest, PurchaseOffer, SellRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryMarketStore;
pub use postgres::PostgresMarketStore;

// endregion: --- Imports

// region:    --- Market Store Trait
/// 낙찰 요청
#[derive(Debug, Clone, Copy)]
pub struct Award {
    pub sell_request_id: i64,
    pub offer_id: i64,
    pub seller_id: i64,
    pub at: DateTime<Utc>,
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn insert_sell_request(&self, new: NewSellRequest) -> MarketResult<SellRequest>;

    async fn get_sell_request(&self, id: i64) -> MarketResult<Option<SellRequest>>;

    async fn list_open_sell_requests(&self) -> MarketResult<Vec<SellRequest>>;

    async fn list_sell_requests_by_seller(&self, seller_id: i64) -> MarketResult<Vec<SellRequest>>;

    /// OPEN -> CANCELLED (소유자만, 조건부 쓰기)
    async fn cancel_sell_request(
        &self,
        id: i64,
        seller_id: i64,
        at: DateTime<Utc>,
    ) -> MarketResult<SellRequest>;

    /// 매입 제안 등록. 쓰는 시점에 상태와 중복 여부를 다시 확인한다
    async fn insert_offer(&self, new: NewPurchaseOffer) -> MarketResult<PurchaseOffer>;

    async fn get_offer(&self, id: i64) -> MarketResult<Option<PurchaseOffer>>;

    async fn find_offer(
        &self,
        sell_request_id: i64,
        wholesaler_id: i64,
    ) -> MarketResult<Option<PurchaseOffer>>;

    /// 가격 내림차순, 동일 가격은 먼저 들어온 제안 우선
    async fn list_offers(&self, sell_request_id: i64) -> MarketResult<Vec<PurchaseOffer>>;

    /// 판매 요청 마감과 제안 낙찰 표시를 하나의 원자적 단위로 처리
    async fn award_offer(&self, award: Award) -> MarketResult<(SellRequest, PurchaseOffer)>;
}

// endregion: --- Market Store Trait

// region:    --- Shared Checks
pub const MAX_MESSAGE_LEN: usize = 2000;

/// 저장 직전 입력 검증
pub fn validate_new_offer(new: &NewPurchaseOffer) -> MarketResult<()> {
    if new.offer_price <= 0 {
        return Err(MarketError::Validation(format!(
            "제안 금액은 0보다 커야 합니다: {}",
            new.offer_price
        )));
    }
    if new.wholesaler_name.trim().is_empty() {
        return Err(MarketError::Validation(
            "도매상 이름이 비어 있습니다".to_string(),
        ));
    }
    if let Some(message) = &new.message {
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(MarketError::Validation(format!(
                "메시지는 {}자를 넘을 수 없습니다",
                MAX_MESSAGE_LEN
            )));
        }
    }
    Ok(())
}

/// 조건부 취소/마감이 실패했을 때 원인 판별
pub(crate) fn explain_rejected_transition(
    id: i64,
    seller_id: i64,
    current: Option<&SellRequest>,
) -> MarketError {
    match current {
        None => MarketError::not_found("판매 요청", id),
        Some(request) if request.seller_id != seller_id => MarketError::Authorization(
            "판매 요청 소유자만 처리할 수 있습니다".to_string(),
        ),
        Some(request) => MarketError::StateConflict(format!(
            "판매 요청 {}은(는) 이미 {} 상태입니다",
            id, request.status
        )),
    }
}

/// 제안이 해당 판매 요청에 속하는지 확인
pub(crate) fn check_offer_belongs(
    offer: Option<PurchaseOffer>,
    offer_id: i64,
    sell_request_id: i64,
) -> MarketResult<PurchaseOffer> {
    let offer = offer.ok_or_else(|| MarketError::not_found("매입 제안", offer_id))?;
    if offer.sell_request_id != sell_request_id {
        return Err(MarketError::Validation(format!(
            "매입 제안 {}은(는) 판매 요청 {}에 속하지 않습니다",
            offer_id, sell_request_id
        )));
    }
    Ok(offer)
}

// endregion: --- Shared Checks
