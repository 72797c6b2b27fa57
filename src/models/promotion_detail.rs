use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{DiscountType, promotion_detail_entity};

/// 房型级覆盖规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionDetail {
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub room_type_id: Uuid,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<promotion_detail_entity::Model> for PromotionDetail {
    fn from(m: promotion_detail_entity::Model) -> Self {
        Self {
            id: m.id,
            promotion_id: m.promotion_id,
            room_type_id: m.room_type_id,
            discount_type: m.discount_type,
            discount_value: m.discount_value,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDetailInput {
    /// 可选; 若填写必须与路径中的 promotion_id 一致
    pub promotion_id: Option<Uuid>,
    pub room_type_id: Uuid,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateDetailInput {
    pub id: Uuid,
    /// 可选; 若填写必须与路径中的 promotion_id 一致
    pub promotion_id: Option<Uuid>,
    pub room_type_id: Option<Uuid>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkCreateDetailsRequest {
    pub details: Vec<CreateDetailInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkUpdateDetailsRequest {
    pub details: Vec<UpdateDetailInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteDetailsRequest {
    pub detail_ids: Vec<Uuid>,
}

/// 单条更新请求 (路径中携带 detail_id)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateDetailRequest {
    pub room_type_id: Option<Uuid>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkDeleteDetailsResponse {
    pub deleted: u64,
}
