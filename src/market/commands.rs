/// 판매 요청 / 매입 제안 커맨드
/// 1. 판매 요청 등록
/// 2. 매입 제안 등록
// region:    --- Imports
use crate::error::{MarketError, MarketResult};
use crate::market::model::Category;
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Commands
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_IMAGES: usize = 10;

/// 1. 판매 요청 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateSellRequestCommand {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub desired_price: Option<String>,
    pub category: Category,
}

impl CreateSellRequestCommand {
    pub fn validate(&self) -> MarketResult<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(MarketError::Validation("제목을 입력해야 합니다".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(MarketError::Validation(format!(
                "제목은 {}자를 넘을 수 없습니다",
                MAX_TITLE_LEN
            )));
        }
        if self.image_urls.len() > MAX_IMAGES {
            return Err(MarketError::Validation(format!(
                "이미지는 최대 {}장까지 등록할 수 있습니다",
                MAX_IMAGES
            )));
        }
        if self.image_urls.iter().any(|url| url.trim().is_empty()) {
            return Err(MarketError::Validation(
                "비어 있는 이미지 주소가 있습니다".to_string(),
            ));
        }
        Ok(())
    }
}

/// 2. 매입 제안 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubmitOfferCommand {
    pub offer_price: i64,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmitOfferCommand {
    pub fn validate(&self) -> MarketResult<()> {
        if self.offer_price <= 0 {
            return Err(MarketError::Validation(format!(
                "제안 금액은 0보다 커야 합니다: {}",
                self.offer_price
            )));
        }
        Ok(())
    }

    /// 공백뿐인 메시지는 없는 것으로 본다
    pub fn normalized_message(&self) -> Option<String> {
        self.message
            .as_ref()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

// endregion: --- Commands

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_command_defaults_from_json() {
        let cmd: CreateSellRequestCommand = serde_json::from_value(serde_json::json!({
            "title": "LG 그램 16",
            "description": "박스 없음",
            "category": "COMPUTER"
        }))
        .unwrap();
        assert!(cmd.image_urls.is_empty());
        assert!(cmd.desired_price.is_none());
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_create_command_rejects_blank_title_and_bad_category() {
        let cmd = CreateSellRequestCommand {
            title: "   ".to_string(),
            description: String::new(),
            image_urls: vec![],
            desired_price: None,
            category: Category::Smartphone,
        };
        assert!(matches!(cmd.validate(), Err(MarketError::Validation(_))));

        let bad = serde_json::from_value::<CreateSellRequestCommand>(serde_json::json!({
            "title": "태블릿",
            "description": "",
            "category": "TABLET"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_offer_price_must_be_positive() {
        for price in [0, -1] {
            let cmd = SubmitOfferCommand {
                offer_price: price,
                message: None,
            };
            assert!(matches!(cmd.validate(), Err(MarketError::Validation(_))));
        }
        let blank = SubmitOfferCommand {
            offer_price: 1,
            message: Some("  ".to_string()),
        };
        assert!(blank.normalized_message().is_none());
    }
}
// endregion: --- Tests
