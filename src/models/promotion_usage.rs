use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::promotion_usage_entity;

/// 核销流水, 写入后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionUsage {
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Uuid,
    pub discount_amount: Decimal,
    pub original_amount: Decimal,
    pub final_amount: Decimal,
    pub used_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<promotion_usage_entity::Model> for PromotionUsage {
    fn from(m: promotion_usage_entity::Model) -> Self {
        Self {
            id: m.id,
            promotion_id: m.promotion_id,
            user_id: m.user_id,
            booking_id: m.booking_id,
            discount_amount: m.discount_amount,
            original_amount: m.original_amount,
            final_amount: m.final_amount,
            used_at: m.used_at,
            ip_address: m.ip_address,
            user_agent: m.user_agent,
        }
    }
}

/// 请求来源信息, 仅做记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// 预订确认时提交的核销数据
#[derive(Debug, Clone, PartialEq)]
pub struct NewUsage {
    pub user_id: Uuid,
    pub booking_id: Uuid,
    pub discount_amount: Decimal,
    pub original_amount: Decimal,
    pub final_amount: Decimal,
    pub metadata: RequestMetadata,
}

impl NewUsage {
    pub fn into_record(self, promotion_id: Uuid, used_at: DateTime<Utc>) -> PromotionUsage {
        PromotionUsage {
            id: Uuid::new_v4(),
            promotion_id,
            user_id: self.user_id,
            booking_id: self.booking_id,
            discount_amount: self.discount_amount,
            original_amount: self.original_amount,
            final_amount: self.final_amount,
            used_at,
            ip_address: self.metadata.ip_address,
            user_agent: self.metadata.user_agent,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UsageHistoryQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// 计数器与流水的对账结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReconciliationReport {
    pub promotion_id: Uuid,
    pub used_count: i64,
    pub usage_rows: u64,
    pub consistent: bool,
}
