use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IntoActiveModel, NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, SqlErr, TransactionTrait, Unchanged,
};
use uuid::Uuid;

use super::{PromotionRepository, RedemptionTx};
use crate::entities::{
    promotion_detail_entity as details, promotion_entity as promotions,
    promotion_usage_entity as usages,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginationParams, Promotion, PromotionDetail, PromotionFilter, PromotionUsage,
};

#[derive(Clone)]
pub struct SeaOrmPromotionRepository {
    db: DatabaseConnection,
}

impl SeaOrmPromotionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 预订子系统可直接复用同一连接开启事务
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn map_unique(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
        _ => AppError::from(err),
    }
}

fn promotion_active_model(p: &Promotion) -> promotions::ActiveModel {
    promotions::ActiveModel {
        id: Set(p.id),
        code: Set(p.code.clone()),
        hotel_id: Set(p.hotel_id),
        name: Set(p.name.clone()),
        description: Set(p.description.clone()),
        promotion_type: Set(p.promotion_type),
        discount_type: Set(p.discount_type),
        discount_value: Set(p.discount_value),
        max_discount_amount: Set(p.max_discount_amount),
        min_booking_price: Set(p.min_booking_price),
        valid_from: Set(p.valid_from),
        valid_until: Set(p.valid_until),
        usage_limit: Set(p.usage_limit),
        used_count: Set(p.used_count),
        status: Set(p.status),
        created_by: Set(p.created_by),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

fn detail_active_model(d: &PromotionDetail) -> details::ActiveModel {
    details::ActiveModel {
        id: Set(d.id),
        promotion_id: Set(d.promotion_id),
        room_type_id: Set(d.room_type_id),
        discount_type: Set(d.discount_type),
        discount_value: Set(d.discount_value),
        created_at: Set(d.created_at),
        updated_at: Set(d.updated_at),
    }
}

#[async_trait]
impl PromotionRepository for SeaOrmPromotionRepository {
    async fn find_promotion(&self, id: Uuid) -> AppResult<Option<Promotion>> {
        let model = promotions::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn find_promotion_by_code(&self, code: &str) -> AppResult<Option<Promotion>> {
        // 枚举顺序 active < inactive
        let model = promotions::Entity::find()
            .filter(promotions::Column::Code.eq(code))
            .order_by_asc(promotions::Column::Status)
            .order_by_desc(promotions::Column::CreatedAt)
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list_promotions(
        &self,
        filter: &PromotionFilter,
        page: &PaginationParams,
    ) -> AppResult<(Vec<Promotion>, u64)> {
        let mut query = promotions::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(promotions::Column::Status.eq(status));
        }
        if let Some(code) = &filter.code {
            // code 统一以大写存储
            query = query.filter(promotions::Column::Code.contains(code.to_uppercase()));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(promotions::Column::ValidFrom.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(promotions::Column::ValidUntil.lte(end));
        }
        if let Some(hotel_id) = filter.hotel_id {
            query = query.filter(promotions::Column::HotelId.eq(hotel_id));
        }

        let total = query.clone().count(&self.db).await?;

        let models = query
            .order_by_desc(promotions::Column::CreatedAt)
            .limit(page.get_limit())
            .offset(page.get_offset())
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn insert_promotion(&self, promotion: Promotion) -> AppResult<Promotion> {
        let model = promotion_active_model(&promotion)
            .insert(&self.db)
            .await
            .map_err(|e| map_unique(e, "Promotion code already exists"))?;
        Ok(model.into())
    }

    async fn update_promotion(&self, promotion: Promotion) -> AppResult<Promotion> {
        let mut am = promotion_active_model(&promotion);
        am.id = Unchanged(promotion.id);
        am.used_count = NotSet;
        am.created_by = NotSet;
        am.created_at = NotSet;
        am.updated_at = Set(Utc::now());

        match am.update(&self.db).await {
            Ok(model) => Ok(model.into()),
            Err(DbErr::RecordNotUpdated) => {
                Err(AppError::NotFound("Promotion not found".to_string()))
            }
            Err(e) => Err(map_unique(e, "Promotion code already exists")),
        }
    }

    async fn delete_promotion(&self, id: Uuid) -> AppResult<bool> {
        if self.count_usages(id).await? > 0 {
            return Err(AppError::Conflict(
                "Promotion has usage records; deactivate it instead".to_string(),
            ));
        }

        // 并发核销写入的流水由外键 RESTRICT 兜底
        let result = promotions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Conflict(
                    "Promotion has usage records; deactivate it instead".to_string(),
                ),
                _ => AppError::from(e),
            })?;
        Ok(result.rows_affected > 0)
    }

    async fn find_detail_for_room_type(
        &self,
        promotion_id: Uuid,
        room_type_id: Uuid,
    ) -> AppResult<Option<PromotionDetail>> {
        let model = details::Entity::find()
            .filter(details::Column::PromotionId.eq(promotion_id))
            .filter(details::Column::RoomTypeId.eq(room_type_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list_details(&self, promotion_id: Uuid) -> AppResult<Vec<PromotionDetail>> {
        let models = details::Entity::find()
            .filter(details::Column::PromotionId.eq(promotion_id))
            .order_by_asc(details::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_details(&self, ids: &[Uuid]) -> AppResult<Vec<PromotionDetail>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = details::Entity::find()
            .filter(details::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn insert_details(
        &self,
        rows: Vec<PromotionDetail>,
    ) -> AppResult<Vec<PromotionDetail>> {
        let txn = self.db.begin().await?;

        let mut created = Vec::with_capacity(rows.len());
        for row in &rows {
            // 出错时 txn 被 drop 即回滚
            let model = detail_active_model(row).insert(&txn).await.map_err(|e| {
                map_unique(e, "Room type already has an override for this promotion")
            })?;
            created.push(model.into());
        }

        txn.commit().await?;
        Ok(created)
    }

    async fn update_details(
        &self,
        promotion_id: Uuid,
        rows: Vec<PromotionDetail>,
    ) -> AppResult<Vec<PromotionDetail>> {
        let txn = self.db.begin().await?;

        let mut updated = Vec::with_capacity(rows.len());
        for row in &rows {
            // 加行锁并在事务内复核归属
            let existing = details::Entity::find_by_id(row.id)
                .filter(details::Column::PromotionId.eq(promotion_id))
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    AppError::ValidationError(format!(
                        "Promotion detail {} does not belong to promotion {promotion_id}",
                        row.id
                    ))
                })?;

            let mut am = existing.into_active_model();
            am.room_type_id = Set(row.room_type_id);
            am.discount_type = Set(row.discount_type);
            am.discount_value = Set(row.discount_value);
            am.updated_at = Set(Utc::now());
            let model = am.update(&txn).await.map_err(|e| {
                map_unique(e, "Room type already has an override for this promotion")
            })?;
            updated.push(model.into());
        }

        txn.commit().await?;
        Ok(updated)
    }

    async fn delete_details(&self, promotion_id: Uuid, ids: &[Uuid]) -> AppResult<u64> {
        let txn = self.db.begin().await?;

        let result = details::Entity::delete_many()
            .filter(details::Column::Id.is_in(ids.iter().copied()))
            .filter(details::Column::PromotionId.eq(promotion_id))
            .exec(&txn)
            .await?;

        if result.rows_affected != ids.len() as u64 {
            // 不提交, drop 时回滚
            return Err(AppError::ValidationError(format!(
                "Some promotion details do not belong to promotion {promotion_id}"
            )));
        }

        txn.commit().await?;
        Ok(result.rows_affected)
    }

    async fn list_usages(
        &self,
        promotion_id: Uuid,
        page: &PaginationParams,
    ) -> AppResult<(Vec<PromotionUsage>, u64)> {
        let query = usages::Entity::find().filter(usages::Column::PromotionId.eq(promotion_id));
        let total = query.clone().count(&self.db).await?;
        let models = query
            .order_by_desc(usages::Column::UsedAt)
            .limit(page.get_limit())
            .offset(page.get_offset())
            .all(&self.db)
            .await?;
        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn count_usages(&self, promotion_id: Uuid) -> AppResult<u64> {
        let total = usages::Entity::find()
            .filter(usages::Column::PromotionId.eq(promotion_id))
            .count(&self.db)
            .await?;
        Ok(total)
    }

    async fn usage_counts(&self, promotion_id: Uuid) -> AppResult<Option<(i32, u64)>> {
        // 单条语句读取, 两个数值来自同一快照
        let row: Option<(i32, i64)> = promotions::Entity::find_by_id(promotion_id)
            .select_only()
            .column(promotions::Column::UsedCount)
            .expr_as_(
                Expr::cust(
                    "(SELECT COUNT(*) FROM promotion_usage \
                     WHERE promotion_usage.promotion_id = promotions.id)",
                ),
                "usage_rows",
            )
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(row.map(|(used_count, rows)| (used_count, u64::try_from(rows).unwrap_or_default())))
    }
}

#[async_trait]
impl RedemptionTx for DatabaseTransaction {
    async fn increment_used_count(&mut self, promotion_id: Uuid) -> AppResult<bool> {
        // 单条条件更新: 行锁保证并发下不会超发
        let result = promotions::Entity::update_many()
            .col_expr(
                promotions::Column::UsedCount,
                Expr::col(promotions::Column::UsedCount).add(1),
            )
            .col_expr(promotions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(promotions::Column::Id.eq(promotion_id))
            .filter(
                Condition::any()
                    .add(promotions::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(promotions::Column::UsedCount)
                            .lt(Expr::col(promotions::Column::UsageLimit)),
                    ),
            )
            .exec(&*self)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn load_promotion(&mut self, promotion_id: Uuid) -> AppResult<Option<Promotion>> {
        let model = promotions::Entity::find_by_id(promotion_id)
            .one(&*self)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn append_usage(&mut self, usage: PromotionUsage) -> AppResult<PromotionUsage> {
        let model = usages::ActiveModel {
            id: Set(usage.id),
            promotion_id: Set(usage.promotion_id),
            user_id: Set(usage.user_id),
            booking_id: Set(usage.booking_id),
            discount_amount: Set(usage.discount_amount),
            original_amount: Set(usage.original_amount),
            final_amount: Set(usage.final_amount),
            used_at: Set(usage.used_at),
            ip_address: Set(usage.ip_address),
            user_agent: Set(usage.user_agent),
        }
        .insert(&*self)
        .await
        .map_err(|e| map_unique(e, "Booking already has a promotion applied"))?;

        Ok(model.into())
    }
}
