use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{DiscountType, PromotionStatus, PromotionType, promotion_entity};

/// 优惠码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    /// 为空表示全平台通用
    pub hotel_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub promotion_type: PromotionType,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// 仅百分比类型生效
    pub max_discount_amount: Option<Decimal>,
    pub min_booking_price: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub status: PromotionStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// 时间窗口为闭区间 [valid_from, valid_until]
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }

    pub fn has_remaining_uses(&self) -> bool {
        match self.usage_limit {
            None => true,
            Some(limit) => self.used_count < limit,
        }
    }
}

impl From<promotion_entity::Model> for Promotion {
    fn from(m: promotion_entity::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            hotel_id: m.hotel_id,
            name: m.name,
            description: m.description,
            promotion_type: m.promotion_type,
            discount_type: m.discount_type,
            discount_value: m.discount_value,
            max_discount_amount: m.max_discount_amount,
            min_booking_price: m.min_booking_price,
            valid_from: m.valid_from,
            valid_until: m.valid_until,
            usage_limit: m.usage_limit,
            used_count: m.used_count,
            status: m.status,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePromotionRequest {
    #[schema(example = "SUMMER2025")]
    pub code: String,
    pub hotel_id: Option<Uuid>,
    #[schema(example = "Summer sale")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub promotion_type: PromotionType,
    pub discount_type: DiscountType,
    #[schema(example = "10")]
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub min_booking_price: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub status: Option<PromotionStatus>,
}

/// 部分更新; 可空字段使用 `Some(None)` 表示清空
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePromotionRequest {
    pub code: Option<String>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub hotel_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub promotion_type: Option<PromotionType>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub max_discount_amount: Option<Option<Decimal>>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub min_booking_price: Option<Option<Decimal>>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub usage_limit: Option<Option<i32>>,
    pub status: Option<PromotionStatus>,
}

impl UpdatePromotionRequest {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.hotel_id.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.promotion_type.is_none()
            && self.discount_type.is_none()
            && self.discount_value.is_none()
            && self.max_discount_amount.is_none()
            && self.min_booking_price.is_none()
            && self.valid_from.is_none()
            && self.valid_until.is_none()
            && self.usage_limit.is_none()
            && self.status.is_none()
    }
}

/// 区分 "字段缺省" 与 "显式 null"
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(
        value: &Option<Option<T>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<T>>, D::Error> {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// 列表筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PromotionQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<PromotionStatus>,
    /// 模糊匹配, 不区分大小写
    pub code: Option<String>,
    /// valid_from >= start_date
    pub start_date: Option<DateTime<Utc>>,
    /// valid_until <= end_date
    pub end_date: Option<DateTime<Utc>>,
    pub hotel_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct PromotionFilter {
    pub status: Option<PromotionStatus>,
    pub code: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub hotel_id: Option<Uuid>,
}

impl PromotionFilter {
    pub fn matches(&self, p: &Promotion) -> bool {
        self.status.is_none_or(|s| p.status == s)
            && self
                .code
                .as_ref()
                .is_none_or(|c| p.code.to_lowercase().contains(&c.to_lowercase()))
            && self.start_date.is_none_or(|d| p.valid_from >= d)
            && self.end_date.is_none_or(|d| p.valid_until <= d)
            && self.hotel_id.is_none_or(|h| p.hotel_id == Some(h))
    }
}

impl From<&PromotionQuery> for PromotionFilter {
    fn from(q: &PromotionQuery) -> Self {
        Self {
            status: q.status,
            code: q
                .code
                .as_ref()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            start_date: q.start_date,
            end_date: q.end_date,
            hotel_id: q.hotel_id,
        }
    }
}
