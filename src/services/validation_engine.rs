use std::sync::Arc;

use crate::entities::PromotionStatus;
use crate::error::AppResult;
use crate::models::{BookingContext, Promotion, PromotionRejection, ValidationOutcome};
use crate::repositories::PromotionRepository;
use crate::utils::normalize_code;

/// 只读校验, 不占用使用次数
#[derive(Clone)]
pub struct ValidationEngine {
    repo: Arc<dyn PromotionRepository>,
}

impl ValidationEngine {
    pub fn new(repo: Arc<dyn PromotionRepository>) -> Self {
        Self { repo }
    }

    pub async fn validate(&self, code: &str, ctx: &BookingContext) -> AppResult<ValidationOutcome> {
        let code = normalize_code(code);
        let promotion = self.repo.find_promotion_by_code(&code).await?;

        let outcome = match promotion {
            None => ValidationOutcome::Rejected(PromotionRejection::NotFound),
            Some(p) => match check_promotion(&p, ctx) {
                Ok(()) => ValidationOutcome::Valid(p),
                Err(rejection) => ValidationOutcome::Rejected(rejection),
            },
        };

        if let Some(rejection) = outcome.rejection() {
            log::warn!("Promotion code {code} rejected: {}", rejection.code());
        }
        Ok(outcome)
    }
}

/// 按固定顺序检查, 遇到第一个失败即返回
pub fn check_promotion(promotion: &Promotion, ctx: &BookingContext) -> Result<(), PromotionRejection> {
    if promotion.status != PromotionStatus::Active {
        return Err(PromotionRejection::Inactive);
    }
    if !promotion.is_within_window(ctx.now) {
        return Err(PromotionRejection::OutOfWindow);
    }
    if !promotion.has_remaining_uses() {
        return Err(PromotionRejection::LimitReached);
    }
    if let Some(minimum) = promotion.min_booking_price {
        if ctx.total_amount < minimum {
            return Err(PromotionRejection::BelowMinimum { minimum });
        }
    }
    // 平台通用的优惠码对所有酒店有效
    if let (Some(scope), Some(hotel_id)) = (promotion.hotel_id, ctx.hotel_id) {
        if scope != hotel_id {
            return Err(PromotionRejection::HotelMismatch);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DiscountType, PromotionType};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn promotion() -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4(),
            code: "WINTER15".to_string(),
            hotel_id: None,
            name: "Winter deal".to_string(),
            description: None,
            promotion_type: PromotionType::General,
            discount_type: DiscountType::Percentage,
            discount_value: dec!(15),
            max_discount_amount: None,
            min_booking_price: Some(dec!(100000)),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            usage_limit: Some(10),
            used_count: 0,
            status: PromotionStatus::Active,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn accepts_valid_booking() {
        let p = promotion();
        assert_eq!(check_promotion(&p, &BookingContext::new(dec!(200000))), Ok(()));
    }

    #[test]
    fn inactive_reported_before_window() {
        let mut p = promotion();
        p.status = PromotionStatus::Inactive;
        p.valid_from = Utc::now() + Duration::days(3);
        p.valid_until = Utc::now() + Duration::days(5);
        assert_eq!(
            check_promotion(&p, &BookingContext::new(dec!(200000))),
            Err(PromotionRejection::Inactive)
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let p = promotion();
        let ctx = BookingContext::new(dec!(200000)).at(p.valid_until);
        assert_eq!(check_promotion(&p, &ctx), Ok(()));

        let ctx = BookingContext::new(dec!(200000)).at(p.valid_until + Duration::seconds(1));
        assert_eq!(check_promotion(&p, &ctx), Err(PromotionRejection::OutOfWindow));
    }

    #[test]
    fn limit_reached() {
        let mut p = promotion();
        p.used_count = 10;
        assert_eq!(
            check_promotion(&p, &BookingContext::new(dec!(200000))),
            Err(PromotionRejection::LimitReached)
        );
    }

    #[test]
    fn below_minimum_carries_threshold() {
        let p = promotion();
        assert_eq!(
            check_promotion(&p, &BookingContext::new(dec!(99999))),
            Err(PromotionRejection::BelowMinimum {
                minimum: dec!(100000)
            })
        );
    }

    #[test]
    fn hotel_scope() {
        let mut p = promotion();
        let hotel = Uuid::new_v4();
        p.hotel_id = Some(hotel);

        let other = BookingContext::new(dec!(200000)).with_hotel(Uuid::new_v4());
        assert_eq!(check_promotion(&p, &other), Err(PromotionRejection::HotelMismatch));

        let same = BookingContext::new(dec!(200000)).with_hotel(hotel);
        assert_eq!(check_promotion(&p, &same), Ok(()));

        p.hotel_id = None;
        assert_eq!(check_promotion(&p, &other), Ok(()));
    }
}
