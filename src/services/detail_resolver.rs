use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{DiscountRule, Promotion, PromotionDetail, ResolvedRule, RuleSource};
use crate::repositories::PromotionRepository;

/// 房型覆盖优先; 封顶金额始终取自 promotion
pub fn resolve_rule(promotion: &Promotion, detail: Option<&PromotionDetail>) -> ResolvedRule {
    match detail {
        Some(d) if d.promotion_id == promotion.id => ResolvedRule {
            rule: DiscountRule::new(
                d.discount_type,
                d.discount_value,
                promotion.max_discount_amount,
            ),
            source: RuleSource::RoomType {
                detail_id: d.id,
                room_type_id: d.room_type_id,
            },
        },
        _ => ResolvedRule {
            rule: DiscountRule::new(
                promotion.discount_type,
                promotion.discount_value,
                promotion.max_discount_amount,
            ),
            source: RuleSource::Promotion,
        },
    }
}

#[derive(Clone)]
pub struct DetailResolver {
    repo: Arc<dyn PromotionRepository>,
}

impl DetailResolver {
    pub fn new(repo: Arc<dyn PromotionRepository>) -> Self {
        Self { repo }
    }

    pub async fn resolve(
        &self,
        promotion: &Promotion,
        room_type_id: Option<Uuid>,
    ) -> AppResult<ResolvedRule> {
        let detail = match room_type_id {
            Some(room_type_id) => {
                self.repo
                    .find_detail_for_room_type(promotion.id, room_type_id)
                    .await?
            }
            None => None,
        };
        Ok(resolve_rule(promotion, detail.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DiscountType, PromotionStatus, PromotionType};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn promotion() -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4(),
            code: "SPRING10".to_string(),
            hotel_id: None,
            name: "Spring sale".to_string(),
            description: None,
            promotion_type: PromotionType::RoomSpecific,
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            max_discount_amount: Some(dec!(40000)),
            min_booking_price: None,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            usage_limit: None,
            used_count: 0,
            status: PromotionStatus::Active,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    fn detail(promotion_id: Uuid, discount_type: DiscountType, value: rust_decimal::Decimal) -> PromotionDetail {
        PromotionDetail {
            id: Uuid::new_v4(),
            promotion_id,
            room_type_id: Uuid::new_v4(),
            discount_type,
            discount_value: value,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn falls_back_to_promotion_rule() {
        let p = promotion();
        let resolved = resolve_rule(&p, None);
        assert_eq!(resolved.source, RuleSource::Promotion);
        assert_eq!(resolved.rule.discount_value(), dec!(10));
        assert_eq!(resolved.rule.max_discount_amount(), Some(dec!(40000)));
    }

    #[test]
    fn override_keeps_promotion_cap() {
        let p = promotion();
        let d = detail(p.id, DiscountType::Percentage, dec!(20));
        let resolved = resolve_rule(&p, Some(&d));
        assert_eq!(resolved.rule.discount_value(), dec!(20));
        assert_eq!(resolved.rule.max_discount_amount(), Some(dec!(40000)));
        assert_eq!(
            resolved.source,
            RuleSource::RoomType {
                detail_id: d.id,
                room_type_id: d.room_type_id
            }
        );
    }

    #[test]
    fn fixed_override_drops_cap() {
        let p = promotion();
        let d = detail(p.id, DiscountType::FixedAmount, dec!(50000));
        let resolved = resolve_rule(&p, Some(&d));
        assert_eq!(
            resolved.rule,
            DiscountRule::FixedAmount {
                amount: dec!(50000)
            }
        );
    }

    #[test]
    fn ignores_detail_of_other_promotion() {
        let p = promotion();
        let d = detail(Uuid::new_v4(), DiscountType::Percentage, dec!(50));
        let resolved = resolve_rule(&p, Some(&d));
        assert_eq!(resolved.source, RuleSource::Promotion);
    }
}
