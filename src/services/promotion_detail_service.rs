use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::validate_discount;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::repositories::PromotionRepository;

/// 房型覆盖规则的批量维护
///
/// 批次中任一行不合法时整批拒绝, 不写入任何行。
#[derive(Clone)]
pub struct PromotionDetailService {
    repo: Arc<dyn PromotionRepository>,
}

impl PromotionDetailService {
    pub fn new(repo: Arc<dyn PromotionRepository>) -> Self {
        Self { repo }
    }

    async fn load_promotion(&self, promotion_id: Uuid) -> AppResult<Promotion> {
        self.repo
            .find_promotion(promotion_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Promotion not found".to_string()))
    }

    async fn authorize(&self, caller: &Caller, promotion_id: Uuid) -> AppResult<Promotion> {
        let promotion = self.load_promotion(promotion_id).await?;
        if !caller.can_manage(promotion.created_by) {
            log::warn!(
                "User {} may not modify details of promotion {promotion_id}",
                caller.user_id
            );
            return Err(AppError::Forbidden);
        }
        Ok(promotion)
    }

    pub async fn list_details(&self, promotion_id: Uuid) -> AppResult<Vec<PromotionDetail>> {
        self.load_promotion(promotion_id).await?;
        self.repo.list_details(promotion_id).await
    }

    pub async fn bulk_create(
        &self,
        caller: &Caller,
        promotion_id: Uuid,
        request: BulkCreateDetailsRequest,
    ) -> AppResult<Vec<PromotionDetail>> {
        self.authorize(caller, promotion_id).await?;
        if request.details.is_empty() {
            return Err(AppError::ValidationError("details must not be empty".to_string()));
        }

        let mut room_types = HashSet::new();
        let now = Utc::now();
        let mut rows = Vec::with_capacity(request.details.len());
        for input in request.details {
            ensure_same_promotion(input.promotion_id, promotion_id)?;
            validate_discount(input.discount_type, input.discount_value)?;
            if !room_types.insert(input.room_type_id) {
                return Err(duplicate_room_type(input.room_type_id));
            }
            rows.push(PromotionDetail {
                id: Uuid::new_v4(),
                promotion_id,
                room_type_id: input.room_type_id,
                discount_type: input.discount_type,
                discount_value: input.discount_value,
                created_at: now,
                updated_at: now,
            });
        }

        let created = self.repo.insert_details(rows).await?;
        log::info!(
            "{} details created for promotion {promotion_id} by {}",
            created.len(),
            caller.user_id
        );
        Ok(created)
    }

    pub async fn bulk_update(
        &self,
        caller: &Caller,
        promotion_id: Uuid,
        request: BulkUpdateDetailsRequest,
    ) -> AppResult<Vec<PromotionDetail>> {
        self.authorize(caller, promotion_id).await?;
        if request.details.is_empty() {
            return Err(AppError::ValidationError("details must not be empty".to_string()));
        }

        let mut ids = HashSet::new();
        for input in &request.details {
            ensure_same_promotion(input.promotion_id, promotion_id)?;
            if !ids.insert(input.id) {
                return Err(AppError::ValidationError(format!(
                    "Promotion detail {} appears more than once",
                    input.id
                )));
            }
        }

        let id_list: Vec<Uuid> = request.details.iter().map(|d| d.id).collect();
        let existing = self.owned_details(promotion_id, &id_list).await?;

        let mut room_types = HashSet::new();
        let mut rows = Vec::with_capacity(request.details.len());
        for input in request.details {
            let Some(current) = existing.iter().find(|d| d.id == input.id) else {
                return Err(not_owned(input.id, promotion_id));
            };
            let merged = PromotionDetail {
                room_type_id: input.room_type_id.unwrap_or(current.room_type_id),
                discount_type: input.discount_type.unwrap_or(current.discount_type),
                discount_value: input.discount_value.unwrap_or(current.discount_value),
                ..current.clone()
            };
            validate_discount(merged.discount_type, merged.discount_value)?;
            if !room_types.insert(merged.room_type_id) {
                return Err(duplicate_room_type(merged.room_type_id));
            }
            rows.push(merged);
        }

        let updated = self.repo.update_details(promotion_id, rows).await?;
        log::info!(
            "{} details updated for promotion {promotion_id} by {}",
            updated.len(),
            caller.user_id
        );
        Ok(updated)
    }

    pub async fn bulk_delete(
        &self,
        caller: &Caller,
        promotion_id: Uuid,
        request: BulkDeleteDetailsRequest,
    ) -> AppResult<u64> {
        self.authorize(caller, promotion_id).await?;
        if request.detail_ids.is_empty() {
            return Err(AppError::ValidationError(
                "detail_ids must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = request
            .detail_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        self.owned_details(promotion_id, &ids).await?;

        let deleted = self.repo.delete_details(promotion_id, &ids).await?;
        log::info!(
            "{deleted} details deleted from promotion {promotion_id} by {}",
            caller.user_id
        );
        Ok(deleted)
    }

    pub async fn update_detail(
        &self,
        caller: &Caller,
        promotion_id: Uuid,
        detail_id: Uuid,
        request: UpdateDetailRequest,
    ) -> AppResult<PromotionDetail> {
        self.ensure_detail_exists(promotion_id, detail_id).await?;
        let input = UpdateDetailInput {
            id: detail_id,
            promotion_id: Some(promotion_id),
            room_type_id: request.room_type_id,
            discount_type: request.discount_type,
            discount_value: request.discount_value,
        };
        let updated = self
            .bulk_update(
                caller,
                promotion_id,
                BulkUpdateDetailsRequest {
                    details: vec![input],
                },
            )
            .await?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InternalError("Detail update returned no row".to_string()))
    }

    pub async fn delete_detail(
        &self,
        caller: &Caller,
        promotion_id: Uuid,
        detail_id: Uuid,
    ) -> AppResult<()> {
        self.ensure_detail_exists(promotion_id, detail_id).await?;
        self.bulk_delete(
            caller,
            promotion_id,
            BulkDeleteDetailsRequest {
                detail_ids: vec![detail_id],
            },
        )
        .await?;
        Ok(())
    }

    /// 任一 id 不存在或属于其他 promotion 时整批拒绝
    async fn owned_details(
        &self,
        promotion_id: Uuid,
        ids: &[Uuid],
    ) -> AppResult<Vec<PromotionDetail>> {
        let found = self.repo.find_details(ids).await?;
        for id in ids {
            let owned = found
                .iter()
                .any(|d| d.id == *id && d.promotion_id == promotion_id);
            if !owned {
                return Err(not_owned(*id, promotion_id));
            }
        }
        Ok(found)
    }

    async fn ensure_detail_exists(&self, promotion_id: Uuid, detail_id: Uuid) -> AppResult<()> {
        let found = self.repo.find_details(&[detail_id]).await?;
        if found.iter().any(|d| d.promotion_id == promotion_id) {
            Ok(())
        } else {
            Err(AppError::NotFound("Promotion detail not found".to_string()))
        }
    }
}

fn ensure_same_promotion(given: Option<Uuid>, promotion_id: Uuid) -> AppResult<()> {
    match given {
        Some(id) if id != promotion_id => Err(AppError::ValidationError(format!(
            "Detail references promotion {id} but the request targets {promotion_id}"
        ))),
        _ => Ok(()),
    }
}

fn not_owned(detail_id: Uuid, promotion_id: Uuid) -> AppError {
    AppError::ValidationError(format!(
        "Promotion detail {detail_id} does not belong to promotion {promotion_id}"
    ))
}

fn duplicate_room_type(room_type_id: Uuid) -> AppError {
    AppError::ValidationError(format!(
        "Room type {room_type_id} appears more than once in the batch"
    ))
}
