#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use promotion_backend::AppResult;
use promotion_backend::entities::{DiscountType, PromotionType};
use promotion_backend::models::*;
use promotion_backend::repositories::{MemoryPromotionRepository, PromotionRepository};
use promotion_backend::services::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

pub struct TestEnv {
    pub store: MemoryPromotionRepository,
    pub promotions: PromotionService,
    pub details: PromotionDetailService,
    pub usages: PromotionUsageService,
    pub ledger: RedemptionLedger,
}

impl TestEnv {
    pub fn new() -> Self {
        let store = MemoryPromotionRepository::new();
        let repo: Arc<dyn PromotionRepository> = Arc::new(store.clone());
        Self {
            promotions: PromotionService::new(repo.clone(), DiscountCalculator::default()),
            details: PromotionDetailService::new(repo.clone()),
            usages: PromotionUsageService::new(repo),
            ledger: RedemptionLedger::new(),
            store,
        }
    }

    pub async fn create(&self, request: CreatePromotionRequest) -> Promotion {
        self.promotions
            .create_promotion(&admin(), request)
            .await
            .expect("create promotion")
    }

    /// 单独事务内核销并提交
    pub async fn redeem_once(&self, promotion_id: Uuid, usage: NewUsage) -> AppResult<PromotionUsage> {
        let mut tx = self.store.begin();
        let result = self.ledger.redeem(&mut tx, promotion_id, usage).await;
        match result {
            Ok(record) => {
                tx.commit().await?;
                Ok(record)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }
}

pub fn admin() -> Caller {
    Caller::new(Uuid::new_v4(), Role::Admin)
}

pub fn hotel_owner() -> Caller {
    Caller::new(Uuid::new_v4(), Role::HotelOwner)
}

pub fn customer() -> Caller {
    Caller::new(Uuid::new_v4(), Role::Customer)
}

pub fn percentage_request(code: &str, percent: Decimal) -> CreatePromotionRequest {
    let now = Utc::now();
    CreatePromotionRequest {
        code: code.to_string(),
        hotel_id: None,
        name: format!("{code} promotion"),
        description: Some("Test promotion".to_string()),
        promotion_type: PromotionType::General,
        discount_type: DiscountType::Percentage,
        discount_value: percent,
        max_discount_amount: None,
        min_booking_price: None,
        valid_from: now - Duration::days(1),
        valid_until: now + Duration::days(30),
        usage_limit: None,
        status: None,
    }
}

pub fn fixed_request(code: &str, amount: Decimal) -> CreatePromotionRequest {
    CreatePromotionRequest {
        discount_type: DiscountType::FixedAmount,
        discount_value: amount,
        ..percentage_request(code, dec!(1))
    }
}

pub fn usage(original: Decimal, discount: Decimal) -> NewUsage {
    NewUsage {
        user_id: Uuid::new_v4(),
        booking_id: Uuid::new_v4(),
        discount_amount: discount,
        original_amount: original,
        final_amount: original - discount,
        metadata: RequestMetadata {
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: Some("integration-test".to_string()),
        },
    }
}

pub fn with_limit(mut request: CreatePromotionRequest, limit: i32) -> CreatePromotionRequest {
    request.usage_limit = Some(limit);
    request
}
