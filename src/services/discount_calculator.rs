use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::{AppError, AppResult};
use crate::models::{DiscountBreakdown, DiscountRule};

fn out_of_range() -> AppError {
    AppError::ValidationError("Booking total out of range".to_string())
}

/// 折扣金额计算, 纯函数
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountCalculator {
    /// 货币最小单位的小数位数, 0 表示整数金额
    minor_units: u32,
}

impl DiscountCalculator {
    pub fn new(minor_units: u32) -> Self {
        Self { minor_units }
    }

    pub fn minor_units(&self) -> u32 {
        self.minor_units
    }

    /// 结果总在 [0, total] 内, 四舍五入 (远离零) 到最小单位
    pub fn compute_discount(&self, rule: &DiscountRule, booking_total: Decimal) -> AppResult<Decimal> {
        let total = booking_total.max(Decimal::ZERO);

        let raw = match rule {
            DiscountRule::Percentage {
                percent,
                max_discount_amount,
            } => {
                let amount = total
                    .checked_mul(*percent)
                    .and_then(|v| v.checked_div(dec!(100)))
                    .ok_or_else(out_of_range)?;
                match max_discount_amount {
                    Some(cap) => amount.min(*cap),
                    None => amount,
                }
            }
            DiscountRule::FixedAmount { amount } => (*amount).min(total),
        };

        let clamped = raw.clamp(Decimal::ZERO, total);
        let rounded =
            clamped.round_dp_with_strategy(self.minor_units, RoundingStrategy::MidpointAwayFromZero);

        // 进位后超出总额时改为向零舍入
        if rounded > total {
            return Ok(clamped.round_dp_with_strategy(self.minor_units, RoundingStrategy::ToZero));
        }
        Ok(rounded)
    }

    pub fn apply(&self, rule: &DiscountRule, booking_total: Decimal) -> AppResult<DiscountBreakdown> {
        let original_amount = booking_total.max(Decimal::ZERO);
        let discount_amount = self.compute_discount(rule, original_amount)?;
        let final_amount = original_amount
            .checked_sub(discount_amount)
            .ok_or_else(out_of_range)?
            .max(Decimal::ZERO);
        Ok(DiscountBreakdown {
            original_amount,
            discount_amount,
            final_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percentage(percent: Decimal, cap: Option<Decimal>) -> DiscountRule {
        DiscountRule::Percentage {
            percent,
            max_discount_amount: cap,
        }
    }

    #[test]
    fn percentage_is_capped() {
        let calc = DiscountCalculator::default();
        let rule = percentage(dec!(10), Some(dec!(40000)));
        assert_eq!(calc.compute_discount(&rule, dec!(500000)).unwrap(), dec!(40000));
    }

    #[test]
    fn percentage_below_cap() {
        let calc = DiscountCalculator::default();
        let rule = percentage(dec!(10), Some(dec!(40000)));
        assert_eq!(calc.compute_discount(&rule, dec!(300000)).unwrap(), dec!(30000));
    }

    #[test]
    fn fixed_amount_never_exceeds_total() {
        let calc = DiscountCalculator::default();
        let rule = DiscountRule::FixedAmount {
            amount: dec!(100000),
        };
        assert_eq!(calc.compute_discount(&rule, dec!(50000)).unwrap(), dec!(50000));

        let breakdown = calc.apply(&rule, dec!(50000)).unwrap();
        assert_eq!(breakdown.final_amount, Decimal::ZERO);
    }

    #[test]
    fn rounds_half_up_to_whole_units() {
        let calc = DiscountCalculator::default();
        // 15% of 1003 = 150.45
        assert_eq!(
            calc.compute_discount(&percentage(dec!(15), None), dec!(1003)).unwrap(),
            dec!(150)
        );
        // 50% of 1001 = 500.5
        assert_eq!(
            calc.compute_discount(&percentage(dec!(50), None), dec!(1001)).unwrap(),
            dec!(501)
        );
    }

    #[test]
    fn rounds_to_configured_minor_units() {
        let calc = DiscountCalculator::new(2);
        // 12.5% of 99.99 = 12.49875
        assert_eq!(
            calc.compute_discount(&percentage(dec!(12.5), None), dec!(99.99)).unwrap(),
            dec!(12.50)
        );
        assert_eq!(calc.minor_units(), 2);
    }

    #[test]
    fn rounding_never_exceeds_total() {
        let calc = DiscountCalculator::default();
        let rule = DiscountRule::FixedAmount { amount: dec!(10) };
        assert_eq!(calc.compute_discount(&rule, dec!(0.6)).unwrap(), Decimal::ZERO);

        let calc = DiscountCalculator::new(2);
        assert_eq!(calc.compute_discount(&rule, dec!(3.456)).unwrap(), dec!(3.45));
    }

    #[test]
    fn huge_total_is_validation_error() {
        let calc = DiscountCalculator::default();
        assert!(matches!(
            calc.compute_discount(&percentage(dec!(10), None), Decimal::MAX),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            calc.apply(&percentage(dec!(10), Some(dec!(40000))), Decimal::MAX),
            Err(AppError::ValidationError(_))
        ));

        let fixed = DiscountRule::FixedAmount { amount: dec!(100) };
        let breakdown = calc.apply(&fixed, Decimal::MAX).unwrap();
        assert_eq!(breakdown.final_amount, Decimal::MAX - dec!(100));
    }

    #[test]
    fn non_positive_total_gives_zero() {
        let calc = DiscountCalculator::default();
        let rule = percentage(dec!(20), None);
        assert_eq!(calc.compute_discount(&rule, Decimal::ZERO).unwrap(), Decimal::ZERO);

        let breakdown = calc.apply(&rule, dec!(-100)).unwrap();
        assert_eq!(breakdown.original_amount, Decimal::ZERO);
        assert_eq!(breakdown.discount_amount, Decimal::ZERO);
        assert_eq!(breakdown.final_amount, Decimal::ZERO);
    }

    #[test]
    fn breakdown_adds_up() {
        let calc = DiscountCalculator::default();
        let breakdown = calc.apply(&percentage(dec!(20), None), dec!(250000)).unwrap();
        assert_eq!(breakdown.discount_amount, dec!(50000));
        assert_eq!(breakdown.final_amount, dec!(200000));
        assert_eq!(
            breakdown.original_amount,
            breakdown.discount_amount + breakdown.final_amount
        );
    }
}
