// region:    --- Imports
use crate::identity::Caller;
use crate::market::model::{PurchaseOffer, SellRequest};

// endregion: --- Imports

/// 블라인드 입찰 필터
/// - 판매 요청 소유자: 전체 제안
/// - 도매상: 본인 제안만 (0 또는 1개)
/// - 그 외(익명 포함): 빈 목록
pub fn visible_offers(
    viewer: Option<&Caller>,
    sell_request: &SellRequest,
    offers: Vec<PurchaseOffer>,
) -> Vec<PurchaseOffer> {
    match viewer {
        Some(viewer) if viewer.id == sell_request.seller_id => offers,
        Some(viewer) if viewer.is_wholesaler() => offers
            .into_iter()
            .filter(|offer| offer.wholesaler_id == viewer.id)
            .take(1)
            .collect(),
        _ => Vec::new(),
    }
}

// endregion: --- Tests
