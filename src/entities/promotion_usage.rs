use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 优惠核销流水 (只追加)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "promotion_usage")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub discount_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub original_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub final_amount: Decimal,
    pub used_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
