//! 需要真实 Postgres: 设置 TEST_DATABASE_URL 后运行, 未设置时直接跳过

use std::sync::Arc;

use chrono::{Duration, Utc};
use promotion_backend::AppError;
use promotion_backend::config::DatabaseConfig;
use promotion_backend::database::{create_pool, run_migrations};
use promotion_backend::entities::{DiscountType, PromotionStatus};
use promotion_backend::models::*;
use promotion_backend::repositories::{PromotionRepository, SeaOrmPromotionRepository};
use promotion_backend::services::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::TransactionTrait;
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

struct PgEnv {
    repo: SeaOrmPromotionRepository,
    promotions: PromotionService,
    details: PromotionDetailService,
    ledger: RedemptionLedger,
}

async fn connect() -> Option<PgEnv> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = create_pool(&DatabaseConfig {
        url,
        max_connections: 16,
    })
    .await
    .expect("connect to test database");
    MIGRATED
        .get_or_init(|| async {
            run_migrations(&pool).await.expect("run migrations");
        })
        .await;

    let repo = SeaOrmPromotionRepository::new(pool);
    let shared: Arc<dyn PromotionRepository> = Arc::new(repo.clone());
    Some(PgEnv {
        promotions: PromotionService::new(shared.clone(), DiscountCalculator::default()),
        details: PromotionDetailService::new(shared),
        ledger: RedemptionLedger::new(),
        repo,
    })
}

fn admin() -> Caller {
    Caller::new(Uuid::new_v4(), Role::Admin)
}

fn unique_code() -> String {
    format!("PG{}", &Uuid::new_v4().simple().to_string()[..12]).to_uppercase()
}

fn usage(original: Decimal, discount: Decimal) -> NewUsage {
    NewUsage {
        user_id: Uuid::new_v4(),
        booking_id: Uuid::new_v4(),
        discount_amount: discount,
        original_amount: original,
        final_amount: original - discount,
        metadata: RequestMetadata::default(),
    }
}

fn request(code: &str, limit: Option<i32>, status: Option<PromotionStatus>) -> CreatePromotionRequest {
    let now = Utc::now();
    CreatePromotionRequest {
        code: code.to_string(),
        hotel_id: None,
        name: "Postgres promotion".to_string(),
        description: None,
        promotion_type: Default::default(),
        discount_type: DiscountType::Percentage,
        discount_value: dec!(10),
        max_discount_amount: Some(dec!(40000)),
        min_booking_price: None,
        valid_from: now - Duration::days(1),
        valid_until: now + Duration::days(1),
        usage_limit: limit,
        status,
    }
}

impl PgEnv {
    async fn create(&self, request: CreatePromotionRequest) -> Promotion {
        self.promotions
            .create_promotion(&admin(), request)
            .await
            .expect("create promotion")
    }

    async fn redeem_committed(&self, promotion_id: Uuid) -> Result<(), AppError> {
        let mut txn = self.repo.connection().begin().await?;
        self.ledger
            .redeem(&mut txn, promotion_id, usage(dec!(100000), dec!(10000)))
            .await?;
        txn.commit().await?;
        Ok(())
    }

    async fn add_detail(&self, promotion_id: Uuid, value: Decimal) -> PromotionDetail {
        let mut created = self
            .details
            .bulk_create(
                &admin(),
                promotion_id,
                BulkCreateDetailsRequest {
                    details: vec![CreateDetailInput {
                        promotion_id: Some(promotion_id),
                        room_type_id: Uuid::new_v4(),
                        discount_type: DiscountType::Percentage,
                        discount_value: value,
                    }],
                },
            )
            .await
            .expect("create detail");
        created.remove(0)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn postgres_conditional_update_holds_under_concurrency() {
    let Some(env) = connect().await else {
        return;
    };
    let promotion = env.create(request(&unique_code(), Some(3), None)).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = env.repo.connection().clone();
        let ledger = env.ledger;
        let promotion_id = promotion.id;
        handles.push(tokio::spawn(async move {
            let mut txn = db.begin().await?;
            let result = ledger
                .redeem(&mut txn, promotion_id, usage(dec!(100000), dec!(10000)))
                .await;
            match result {
                Ok(_) => {
                    txn.commit().await?;
                    Ok::<(), AppError>(())
                }
                Err(e) => {
                    txn.rollback().await?;
                    Err(e)
                }
            }
        }));
    }

    let mut succeeded = 0;
    let mut limit_reached = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(AppError::Promotion(PromotionRejection::LimitReached)) => limit_reached += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(succeeded, 3);
    assert_eq!(limit_reached, 5);

    assert_eq!(env.repo.usage_counts(promotion.id).await.unwrap(), Some((3, 3)));
}

#[tokio::test]
async fn postgres_rollback_discards_increment() {
    let Some(env) = connect().await else {
        return;
    };
    let promotion = env.create(request(&unique_code(), Some(1), None)).await;

    let mut txn = env.repo.connection().begin().await.unwrap();
    env.ledger
        .redeem(&mut txn, promotion.id, usage(dec!(100000), dec!(10000)))
        .await
        .unwrap();
    txn.rollback().await.unwrap();

    assert_eq!(env.repo.usage_counts(promotion.id).await.unwrap(), Some((0, 0)));
}

#[tokio::test]
async fn postgres_code_lookup_prefers_active() {
    let Some(env) = connect().await else {
        return;
    };
    let code = unique_code();
    let active = env.create(request(&code, None, None)).await;
    // 后创建的 inactive 记录不应抢先返回
    let inactive = env
        .create(request(&code, None, Some(PromotionStatus::Inactive)))
        .await;
    assert_ne!(active.id, inactive.id);

    let found = env.repo.find_promotion_by_code(&code).await.unwrap().unwrap();
    assert_eq!(found.id, active.id);
}

#[tokio::test]
async fn postgres_second_active_code_is_conflict() {
    let Some(env) = connect().await else {
        return;
    };
    let code = unique_code();
    env.create(request(&code, None, None)).await;

    let err = env
        .promotions
        .create_promotion(&admin(), request(&code, None, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn postgres_foreign_detail_update_mutates_nothing() {
    let Some(env) = connect().await else {
        return;
    };
    let mine = env.create(request(&unique_code(), None, None)).await;
    let theirs = env.create(request(&unique_code(), None, None)).await;
    let own = env.add_detail(mine.id, dec!(15)).await;
    let foreign = env.add_detail(theirs.id, dec!(25)).await;

    let mut first = own.clone();
    first.discount_value = dec!(30);
    let mut second = foreign.clone();
    second.discount_value = dec!(30);

    // 直接走仓储, 由事务内的行锁复核拒绝整批
    let err = env
        .repo
        .update_details(mine.id, vec![first, second])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let mine_details = env.repo.list_details(mine.id).await.unwrap();
    assert_eq!(mine_details.len(), 1);
    assert_eq!(mine_details[0].discount_value, dec!(15));
    let theirs_details = env.repo.list_details(theirs.id).await.unwrap();
    assert_eq!(theirs_details[0].discount_value, dec!(25));
}

#[tokio::test]
async fn postgres_foreign_detail_delete_deletes_nothing() {
    let Some(env) = connect().await else {
        return;
    };
    let mine = env.create(request(&unique_code(), None, None)).await;
    let theirs = env.create(request(&unique_code(), None, None)).await;
    let own = env.add_detail(mine.id, dec!(15)).await;
    let foreign = env.add_detail(theirs.id, dec!(25)).await;

    let err = env
        .repo
        .delete_details(mine.id, &[own.id, foreign.id])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    assert_eq!(env.repo.list_details(mine.id).await.unwrap().len(), 1);
    assert_eq!(env.repo.list_details(theirs.id).await.unwrap().len(), 1);

    assert_eq!(env.repo.delete_details(mine.id, &[own.id]).await.unwrap(), 1);
    assert!(env.repo.list_details(mine.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn postgres_delete_with_usage_is_conflict() {
    let Some(env) = connect().await else {
        return;
    };
    let used = env.create(request(&unique_code(), None, None)).await;
    env.redeem_committed(used.id).await.unwrap();

    let err = env.repo.delete_promotion(used.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(env.repo.find_promotion(used.id).await.unwrap().is_some());

    let unused = env.create(request(&unique_code(), None, None)).await;
    env.add_detail(unused.id, dec!(20)).await;
    assert!(env.repo.delete_promotion(unused.id).await.unwrap());
    assert!(env.repo.list_details(unused.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn postgres_limit_below_used_count_is_conflict() {
    let Some(env) = connect().await else {
        return;
    };
    let promotion = env.create(request(&unique_code(), Some(5), None)).await;
    env.redeem_committed(promotion.id).await.unwrap();
    env.redeem_committed(promotion.id).await.unwrap();

    // 绕过服务层检查, 模拟并发核销后才写入的缩减
    let mut stale = promotion.clone();
    stale.usage_limit = Some(1);
    let err = env.repo.update_promotion(stale).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let stored = env.repo.find_promotion(promotion.id).await.unwrap().unwrap();
    assert_eq!(stored.usage_limit, Some(5));
    assert_eq!(stored.used_count, 2);
}
