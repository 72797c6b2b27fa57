use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::repositories::PromotionRepository;

#[derive(Clone)]
pub struct PromotionUsageService {
    repo: Arc<dyn PromotionRepository>,
}

impl PromotionUsageService {
    pub fn new(repo: Arc<dyn PromotionRepository>) -> Self {
        Self { repo }
    }

    async fn authorize(&self, caller: &Caller, promotion_id: Uuid) -> AppResult<Promotion> {
        let promotion = self
            .repo
            .find_promotion(promotion_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Promotion not found".to_string()))?;
        if !caller.can_manage(promotion.created_by) {
            log::warn!(
                "User {} may not read usage of promotion {promotion_id}",
                caller.user_id
            );
            return Err(AppError::Forbidden);
        }
        Ok(promotion)
    }

    pub async fn usage_history(
        &self,
        caller: &Caller,
        promotion_id: Uuid,
        query: &UsageHistoryQuery,
    ) -> AppResult<PaginatedResponse<PromotionUsage>> {
        self.authorize(caller, promotion_id).await?;

        let params = PaginationParams::new(query.page, query.per_page);
        let (items, total) = self.repo.list_usages(promotion_id, &params).await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// used_count 应始终等于流水条数
    pub async fn reconcile(
        &self,
        caller: &Caller,
        promotion_id: Uuid,
    ) -> AppResult<ReconciliationReport> {
        self.authorize(caller, promotion_id).await?;
        let (used_count, usage_rows) = self
            .repo
            .usage_counts(promotion_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Promotion not found".to_string()))?;
        let used_count = i64::from(used_count);

        let consistent = u64::try_from(used_count).is_ok_and(|c| c == usage_rows);
        if !consistent {
            log::error!(
                "Promotion {promotion_id} used_count {used_count} does not match {usage_rows} usage rows"
            );
        }
        Ok(ReconciliationReport {
            promotion_id,
            used_count,
            usage_rows,
            consistent,
        })
    }
}
