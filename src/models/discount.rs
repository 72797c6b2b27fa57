use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::DiscountType;

/// 折扣规则; 封顶金额只对百分比类型有意义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discount_type", rename_all = "snake_case")]
pub enum DiscountRule {
    Percentage {
        percent: Decimal,
        max_discount_amount: Option<Decimal>,
    },
    FixedAmount {
        amount: Decimal,
    },
}

impl DiscountRule {
    pub fn new(
        discount_type: DiscountType,
        discount_value: Decimal,
        max_discount_amount: Option<Decimal>,
    ) -> Self {
        match discount_type {
            DiscountType::Percentage => DiscountRule::Percentage {
                percent: discount_value,
                max_discount_amount,
            },
            DiscountType::FixedAmount => DiscountRule::FixedAmount {
                amount: discount_value,
            },
        }
    }

    pub fn discount_type(&self) -> DiscountType {
        match self {
            DiscountRule::Percentage { .. } => DiscountType::Percentage,
            DiscountRule::FixedAmount { .. } => DiscountType::FixedAmount,
        }
    }

    pub fn discount_value(&self) -> Decimal {
        match self {
            DiscountRule::Percentage { percent, .. } => *percent,
            DiscountRule::FixedAmount { amount } => *amount,
        }
    }

    pub fn max_discount_amount(&self) -> Option<Decimal> {
        match self {
            DiscountRule::Percentage {
                max_discount_amount,
                ..
            } => *max_discount_amount,
            DiscountRule::FixedAmount { .. } => None,
        }
    }
}

/// 规则来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum RuleSource {
    Promotion,
    RoomType { detail_id: Uuid, room_type_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRule {
    pub rule: DiscountRule,
    pub source: RuleSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountBreakdown {
    pub original_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}
