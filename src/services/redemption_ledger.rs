use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewUsage, PromotionRejection, PromotionUsage};
use crate::repositories::RedemptionTx;

/// 核销: 条件自增 + 写流水, 在调用方事务内完成
///
/// 不开启也不提交事务; 返回错误时调用方必须回滚整笔预订。
#[derive(Debug, Clone, Copy, Default)]
pub struct RedemptionLedger;

impl RedemptionLedger {
    pub fn new() -> Self {
        Self
    }

    pub async fn redeem<T>(
        &self,
        tx: &mut T,
        promotion_id: Uuid,
        usage: NewUsage,
    ) -> AppResult<PromotionUsage>
    where
        T: RedemptionTx + ?Sized,
    {
        validate_amounts(&usage)?;

        if !tx.increment_used_count(promotion_id).await? {
            // 未命中: 区分不存在与次数已满
            let rejection = match tx.load_promotion(promotion_id).await? {
                None => PromotionRejection::NotFound,
                Some(_) => PromotionRejection::LimitReached,
            };
            log::warn!(
                "Redemption of promotion {promotion_id} for booking {} refused: {}",
                usage.booking_id,
                rejection.code()
            );
            return Err(rejection.into());
        }

        let booking_id = usage.booking_id;
        let record = tx
            .append_usage(usage.into_record(promotion_id, Utc::now()))
            .await?;

        log::info!(
            "Promotion {promotion_id} redeemed for booking {booking_id}, discount {}",
            record.discount_amount
        );
        Ok(record)
    }
}

fn validate_amounts(usage: &NewUsage) -> AppResult<()> {
    if usage.original_amount < Decimal::ZERO
        || usage.discount_amount < Decimal::ZERO
        || usage.final_amount < Decimal::ZERO
    {
        return Err(AppError::ValidationError(
            "Usage amounts must not be negative".to_string(),
        ));
    }
    let expected = usage
        .original_amount
        .checked_sub(usage.discount_amount)
        .ok_or_else(|| AppError::ValidationError("Usage amounts out of range".to_string()))?;
    if expected != usage.final_amount {
        return Err(AppError::ValidationError(
            "final_amount must equal original_amount minus discount_amount".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestMetadata;
    use rust_decimal_macros::dec;

    fn usage(original: Decimal, discount: Decimal, final_amount: Decimal) -> NewUsage {
        NewUsage {
            user_id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            discount_amount: discount,
            original_amount: original,
            final_amount,
            metadata: RequestMetadata::default(),
        }
    }

    #[test]
    fn amounts_must_add_up() {
        assert!(validate_amounts(&usage(dec!(1000), dec!(100), dec!(900))).is_ok());
        assert!(matches!(
            validate_amounts(&usage(dec!(1000), dec!(100), dec!(950))),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn extreme_amounts_do_not_panic() {
        assert!(matches!(
            validate_amounts(&usage(Decimal::MAX, dec!(1), Decimal::MAX)),
            Err(AppError::ValidationError(_))
        ));
        assert!(validate_amounts(&usage(Decimal::MAX, Decimal::ZERO, Decimal::MAX)).is_ok());
    }

    #[test]
    fn negative_amounts_rejected() {
        assert!(matches!(
            validate_amounts(&usage(dec!(1000), dec!(1100), dec!(-100))),
            Err(AppError::ValidationError(_))
        ));
    }
}
