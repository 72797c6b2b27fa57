use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::{DetailResolver, DiscountCalculator, ValidationEngine};
use crate::entities::{DiscountType, PromotionStatus};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::repositories::PromotionRepository;
use crate::utils::{normalize_code, validate_code};

#[derive(Clone)]
pub struct PromotionService {
    repo: Arc<dyn PromotionRepository>,
    engine: ValidationEngine,
    resolver: DetailResolver,
    calculator: DiscountCalculator,
}

impl PromotionService {
    pub fn new(repo: Arc<dyn PromotionRepository>, calculator: DiscountCalculator) -> Self {
        Self {
            engine: ValidationEngine::new(repo.clone()),
            resolver: DetailResolver::new(repo.clone()),
            repo,
            calculator,
        }
    }

    pub fn validation_engine(&self) -> &ValidationEngine {
        &self.engine
    }

    pub async fn create_promotion(
        &self,
        caller: &Caller,
        request: CreatePromotionRequest,
    ) -> AppResult<Promotion> {
        if !caller.can_create_promotions() {
            log::warn!("User {} ({}) may not create promotions", caller.user_id, caller.role);
            return Err(AppError::Forbidden);
        }

        let now = Utc::now();
        let promotion = Promotion {
            id: Uuid::new_v4(),
            code: validate_code(&request.code)?,
            hotel_id: request.hotel_id,
            name: request.name.trim().to_string(),
            description: request.description,
            promotion_type: request.promotion_type,
            discount_type: request.discount_type,
            discount_value: request.discount_value,
            max_discount_amount: request.max_discount_amount,
            min_booking_price: request.min_booking_price,
            valid_from: request.valid_from,
            valid_until: request.valid_until,
            usage_limit: request.usage_limit,
            used_count: 0,
            status: request.status.unwrap_or(PromotionStatus::Active),
            created_by: caller.user_id,
            created_at: now,
            updated_at: now,
        };
        validate_promotion(&promotion)?;

        let created = self.repo.insert_promotion(promotion).await?;
        log::info!(
            "Promotion {} ({}) created by {}",
            created.code,
            created.id,
            caller.user_id
        );
        Ok(created)
    }

    pub async fn update_promotion(
        &self,
        caller: &Caller,
        id: Uuid,
        request: UpdatePromotionRequest,
    ) -> AppResult<Promotion> {
        let current = self.get_promotion(id).await?;
        if !caller.can_manage(current.created_by) {
            log::warn!("User {} may not modify promotion {id}", caller.user_id);
            return Err(AppError::Forbidden);
        }
        if request.is_empty() {
            return Err(AppError::ValidationError(
                "At least one field must be provided".to_string(),
            ));
        }

        let mut merged = current.clone();
        if let Some(code) = &request.code {
            merged.code = validate_code(code)?;
        }
        if let Some(hotel_id) = request.hotel_id {
            merged.hotel_id = hotel_id;
        }
        if let Some(name) = &request.name {
            merged.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            merged.description = description;
        }
        if let Some(promotion_type) = request.promotion_type {
            merged.promotion_type = promotion_type;
        }
        if let Some(discount_type) = request.discount_type {
            merged.discount_type = discount_type;
        }
        if let Some(discount_value) = request.discount_value {
            merged.discount_value = discount_value;
        }
        if let Some(cap) = request.max_discount_amount {
            merged.max_discount_amount = cap;
        }
        if let Some(minimum) = request.min_booking_price {
            merged.min_booking_price = minimum;
        }
        if let Some(valid_from) = request.valid_from {
            merged.valid_from = valid_from;
        }
        if let Some(valid_until) = request.valid_until {
            merged.valid_until = valid_until;
        }
        if let Some(limit) = request.usage_limit {
            merged.usage_limit = limit;
        }
        if let Some(status) = request.status {
            merged.status = status;
        }

        validate_promotion(&merged)?;
        if let Some(limit) = merged.usage_limit {
            if limit < current.used_count {
                return Err(AppError::ValidationError(format!(
                    "usage_limit cannot be lower than the current used count ({})",
                    current.used_count
                )));
            }
        }

        let updated = self.repo.update_promotion(merged).await?;
        log::info!("Promotion {id} updated by {}", caller.user_id);
        Ok(updated)
    }

    pub async fn delete_promotion(&self, caller: &Caller, id: Uuid) -> AppResult<()> {
        let current = self.get_promotion(id).await?;
        if !caller.can_manage(current.created_by) {
            log::warn!("User {} may not delete promotion {id}", caller.user_id);
            return Err(AppError::Forbidden);
        }

        if !self.repo.delete_promotion(id).await? {
            return Err(AppError::NotFound("Promotion not found".to_string()));
        }
        log::info!("Promotion {} ({id}) deleted by {}", current.code, caller.user_id);
        Ok(())
    }

    pub async fn get_promotion(&self, id: Uuid) -> AppResult<Promotion> {
        self.repo
            .find_promotion(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Promotion not found".to_string()))
    }

    pub async fn get_promotion_by_code(&self, code: &str) -> AppResult<Promotion> {
        self.repo
            .find_promotion_by_code(&normalize_code(code))
            .await?
            .ok_or_else(|| AppError::NotFound("Promotion not found".to_string()))
    }

    pub async fn list_promotions(
        &self,
        query: &PromotionQuery,
    ) -> AppResult<PaginatedResponse<Promotion>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let filter = PromotionFilter::from(query);
        let (items, total) = self.repo.list_promotions(&filter, &params).await?;
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 校验 → 规则解析 → 金额计算; 拒绝原因以 `AppError::Promotion` 返回
    pub async fn quote(&self, code: &str, ctx: &BookingContext) -> AppResult<PromotionQuote> {
        let promotion = self.engine.validate(code, ctx).await?.into_result()?;
        let rule = self.resolver.resolve(&promotion, ctx.room_type_id).await?;
        let breakdown = self.calculator.apply(&rule.rule, ctx.total_amount)?;
        Ok(PromotionQuote {
            promotion,
            rule,
            breakdown,
        })
    }
}

/// 创建与更新共用的字段规则
pub fn validate_promotion(p: &Promotion) -> AppResult<()> {
    let name_len = p.name.chars().count();
    if !(5..=255).contains(&name_len) {
        return Err(AppError::ValidationError(
            "Name must be between 5 and 255 characters".to_string(),
        ));
    }
    validate_discount(p.discount_type, p.discount_value)?;

    if let Some(cap) = p.max_discount_amount {
        if p.discount_type != DiscountType::Percentage {
            return Err(AppError::ValidationError(
                "max_discount_amount is only allowed for percentage promotions".to_string(),
            ));
        }
        if cap < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "max_discount_amount must not be negative".to_string(),
            ));
        }
    }
    if p.min_booking_price.is_some_and(|m| m < Decimal::ZERO) {
        return Err(AppError::ValidationError(
            "min_booking_price must not be negative".to_string(),
        ));
    }
    if p.usage_limit.is_some_and(|l| l < 1) {
        return Err(AppError::ValidationError(
            "usage_limit must be at least 1".to_string(),
        ));
    }
    if p.valid_from >= p.valid_until {
        return Err(AppError::ValidationError(
            "valid_from must be earlier than valid_until".to_string(),
        ));
    }
    Ok(())
}

/// 百分比取值 (0, 100], 固定金额 > 0
pub fn validate_discount(discount_type: DiscountType, value: Decimal) -> AppResult<()> {
    if value <= Decimal::ZERO {
        return Err(AppError::ValidationError(
            "discount_value must be greater than 0".to_string(),
        ));
    }
    if discount_type == DiscountType::Percentage && value > dec!(100) {
        return Err(AppError::ValidationError(
            "Percentage discount_value must not exceed 100".to_string(),
        ));
    }
    Ok(())
}
