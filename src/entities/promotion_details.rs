use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::promotions::DiscountType;

/// 房型级覆盖规则, (promotion_id, room_type_id) 唯一
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "promotion_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub room_type_id: Uuid,
    pub discount_type: DiscountType,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub discount_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
