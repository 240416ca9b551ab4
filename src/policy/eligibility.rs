// region:    --- Imports
use crate::error::MarketError;
use crate::identity::Caller;
use crate::market::model::{PurchaseOffer, SellRequest};

// endregion: --- Imports

// region:    --- Eligibility Gate
/// 입찰 불가 사유. 입찰 가능하면 None
pub fn ineligibility_reason(
    caller: &Caller,
    sell_request: &SellRequest,
    existing_offer: Option<&PurchaseOffer>,
) -> Option<MarketError> {
    if !caller.is_wholesaler() {
        return Some(MarketError::Authorization(
            "도매상만 매입 제안을 등록할 수 있습니다".to_string(),
        ));
    }

    if !caller.is_verified_or_overridden() {
        return Some(MarketError::Authorization(
            "사업자 인증이 승인된 도매상만 입찰할 수 있습니다".to_string(),
        ));
    }

    // 재입찰은 요청 상태와 무관하게 중복으로 본다
    if existing_offer.is_some() {
        return Some(MarketError::DuplicateOffer {
            sell_request_id: sell_request.id,
            wholesaler_id: caller.id,
        });
    }

    if !sell_request.is_open() {
        return Some(MarketError::InvalidState {
            sell_request_id: sell_request.id,
            status: sell_request.status,
        });
    }

    if caller.id == sell_request.seller_id {
        return Some(MarketError::Authorization(
            "본인의 판매 요청에는 입찰할 수 없습니다".to_string(),
        ));
    }

    None
}

/// 지금 이 호출자가 이 판매 요청에 입찰할 수 있는가
pub fn can_submit_offer(
    caller: &Caller,
    sell_request: &SellRequest,
    existing_offer: Option<&PurchaseOffer>,
) -> bool {
    ineligibility_reason(caller, sell_request, existing_offer).is_none()
}

// endregion: --- Eligibility Gate

// endregion: --- Tests
