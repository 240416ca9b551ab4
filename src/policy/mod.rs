/// 입찰 자격 및 블라인드 입찰 조회 정책
/// 모든 진입점(서비스, HTTP)이 동일한 정책 함수를 호출한다.
pub mod eligibility;
pub mod visibility;

pub use eligibility::{can_submit_offer, ineligibility_reason};
pub use visibility::visible_offers;
