use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// 제품 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Computer,
    Smartphone,
}

// 판매 요청 상태 (OPEN -> CLOSED | CANCELLED, 둘 다 종료 상태)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sell_request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellRequestStatus {
    Open,
    Closed,
    Cancelled,
}

impl SellRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SellRequestStatus::Open => "OPEN",
            SellRequestStatus::Closed => "CLOSED",
            SellRequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for SellRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 판매 요청 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SellRequest {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub desired_price: Option<String>,
    pub category: Category,
    pub status: SellRequestStatus,
    pub selected_wholesaler_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl SellRequest {
    pub fn is_open(&self) -> bool {
        self.status == SellRequestStatus::Open
    }
}

// 신규 판매 요청
#[derive(Debug, Clone)]
pub struct NewSellRequest {
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub desired_price: Option<String>,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

// 매입 제안 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseOffer {
    pub id: i64,
    pub sell_request_id: i64,
    pub wholesaler_id: i64,
    pub wholesaler_name: String,
    pub offer_price: i64,
    pub message: Option<String>,
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// 신규 매입 제안
#[derive(Debug, Clone)]
pub struct NewPurchaseOffer {
    pub sell_request_id: i64,
    pub wholesaler_id: i64,
    pub wholesaler_name: String,
    pub offer_price: i64,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 제안 목록 정렬: 가격 내림차순, 동일 가격은 먼저 들어온 제안 우선
pub fn sort_offers(offers: &mut [PurchaseOffer]) {
    offers.sort_by(|a, b| {
        b.offer_price
            .cmp(&a.offer_price)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn offer(id: i64, price: i64, secs: i64) -> PurchaseOffer {
        PurchaseOffer {
            id,
            sell_request_id: 1,
            wholesaler_id: 100 + id,
            wholesaler_name: format!("wholesaler-{}", id),
            offer_price: price,
            message: None,
            is_selected: false,
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_sort_offers_price_desc_then_earliest() {
        let mut offers = vec![offer(1, 500_000, 1), offer(2, 700_000, 2), offer(3, 700_000, 3)];
        offers.reverse();
        sort_offers(&mut offers);

        let ids: Vec<i64> = offers.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_sell_request_serde_round_trip() {
        let now = Utc.timestamp_opt(1_700_000_000, 123_000_000).unwrap();
        let request = SellRequest {
            id: 9,
            seller_id: 1,
            title: "맥북 프로 14".to_string(),
            description: "배터리 사이클 120회".to_string(),
            image_urls: vec!["https://cdn.example.com/a.jpg".to_string()],
            desired_price: Some("150만원 이상".to_string()),
            category: Category::Computer,
            status: SellRequestStatus::Closed,
            selected_wholesaler_id: Some(42),
            created_at: now,
            updated_at: Some(now),
            closed_at: Some(now),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["status"], "CLOSED");
        assert_eq!(json["category"], "COMPUTER");

        let decoded: SellRequest = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_purchase_offer_serde_round_trip_keeps_missing_optionals() {
        let original = offer(5, 320_000, 0);
        let text = serde_json::to_string(&original).unwrap();
        let decoded: PurchaseOffer = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, original);
        assert!(decoded.message.is_none());
        assert!(decoded.updated_at.is_none());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_str::<SellRequestStatus>("\"EXPIRED\"");
        assert!(result.is_err());
        assert_eq!(SellRequestStatus::Cancelled.to_string(), "CANCELLED");
    }
}
// endregion: --- Tests
