use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{DiscountBreakdown, Promotion};

/// 预订子系统传入的上下文
#[derive(Debug, Clone)]
pub struct BookingContext {
    pub total_amount: Decimal,
    pub hotel_id: Option<Uuid>,
    pub room_type_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub now: DateTime<Utc>,
}

impl BookingContext {
    pub fn new(total_amount: Decimal) -> Self {
        Self {
            total_amount,
            hotel_id: None,
            room_type_id: None,
            user_id: None,
            now: Utc::now(),
        }
    }

    pub fn with_hotel(mut self, hotel_id: Uuid) -> Self {
        self.hotel_id = Some(hotel_id);
        self
    }

    pub fn with_room_type(mut self, room_type_id: Uuid) -> Self {
        self.room_type_id = Some(room_type_id);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// 优惠码不可用的具体原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionRejection {
    #[error("Invalid promotion code")]
    NotFound,
    #[error("This promotion is not active")]
    Inactive,
    #[error("This promotion is not valid at this time")]
    OutOfWindow,
    #[error("This promotion has reached its usage limit")]
    LimitReached,
    #[error("Minimum booking total of {minimum} is required")]
    BelowMinimum { minimum: Decimal },
    #[error("This promotion is not available for this hotel")]
    HotelMismatch,
}

impl PromotionRejection {
    pub fn code(&self) -> &'static str {
        match self {
            PromotionRejection::NotFound => "PROMOTION_NOT_FOUND",
            PromotionRejection::Inactive => "PROMOTION_INACTIVE",
            PromotionRejection::OutOfWindow => "PROMOTION_OUT_OF_WINDOW",
            PromotionRejection::LimitReached => "PROMOTION_LIMIT_REACHED",
            PromotionRejection::BelowMinimum { .. } => "PROMOTION_BELOW_MINIMUM",
            PromotionRejection::HotelMismatch => "PROMOTION_HOTEL_MISMATCH",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PromotionRejection::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(Promotion),
    Rejected(PromotionRejection),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn rejection(&self) -> Option<&PromotionRejection> {
        match self {
            ValidationOutcome::Valid(_) => None,
            ValidationOutcome::Rejected(r) => Some(r),
        }
    }

    pub fn into_result(self) -> Result<Promotion, PromotionRejection> {
        match self {
            ValidationOutcome::Valid(p) => Ok(p),
            ValidationOutcome::Rejected(r) => Err(r),
        }
    }
}

/// 校验 + 计算后的报价
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionQuote {
    pub promotion: Promotion,
    pub rule: super::ResolvedRule,
    pub breakdown: DiscountBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePromotionRequest {
    #[schema(example = "SUMMER2025")]
    pub code: String,
    #[schema(example = "500000")]
    pub booking_total: Decimal,
    pub hotel_id: Option<Uuid>,
    pub room_type_id: Option<Uuid>,
}

/// HTTP 边界的校验结果, 不可用时走错误响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePromotionResponse {
    pub is_valid: bool,
    pub discount_value: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub promotion_id: Uuid,
    pub message: String,
}

impl From<&PromotionQuote> for ValidatePromotionResponse {
    fn from(quote: &PromotionQuote) -> Self {
        Self {
            is_valid: true,
            discount_value: quote.rule.rule.discount_value(),
            discount_amount: quote.breakdown.discount_amount,
            final_amount: quote.breakdown.final_amount,
            promotion_id: quote.promotion.id,
            message: "Promotion applied successfully".to_string(),
        }
    }
}
