//! 数据访问层
//!
//! 服务层只依赖这里的 trait, 生产环境使用 [`SeaOrmPromotionRepository`],
//! 测试使用 [`MemoryPromotionRepository`]。

pub mod memory;
pub mod sea_orm_repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    PaginationParams, Promotion, PromotionDetail, PromotionFilter, PromotionUsage,
};

pub use memory::{MemoryPromotionRepository, MemoryTransaction};
pub use sea_orm_repository::SeaOrmPromotionRepository;

#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn find_promotion(&self, id: Uuid) -> AppResult<Option<Promotion>>;

    /// 同一 code 可能存在多条记录, 优先返回 active 的那条
    async fn find_promotion_by_code(&self, code: &str) -> AppResult<Option<Promotion>>;

    /// 返回当前页数据与总数, 按创建时间倒序
    async fn list_promotions(
        &self,
        filter: &PromotionFilter,
        page: &PaginationParams,
    ) -> AppResult<(Vec<Promotion>, u64)>;

    /// active 状态下 code 重复时返回 `Conflict`
    async fn insert_promotion(&self, promotion: Promotion) -> AppResult<Promotion>;

    /// 不会写入 used_count / created_by / created_at
    async fn update_promotion(&self, promotion: Promotion) -> AppResult<Promotion>;

    /// 存在核销流水时返回 `Conflict`
    async fn delete_promotion(&self, id: Uuid) -> AppResult<bool>;

    async fn find_detail_for_room_type(
        &self,
        promotion_id: Uuid,
        room_type_id: Uuid,
    ) -> AppResult<Option<PromotionDetail>>;

    async fn list_details(&self, promotion_id: Uuid) -> AppResult<Vec<PromotionDetail>>;

    async fn find_details(&self, ids: &[Uuid]) -> AppResult<Vec<PromotionDetail>>;

    /// 整批写入, 任一失败则全部回滚
    async fn insert_details(&self, details: Vec<PromotionDetail>)
    -> AppResult<Vec<PromotionDetail>>;

    /// 整批更新; 任一行不存在或不属于 promotion_id 时返回 `ValidationError` 且不修改任何行
    async fn update_details(
        &self,
        promotion_id: Uuid,
        details: Vec<PromotionDetail>,
    ) -> AppResult<Vec<PromotionDetail>>;

    /// 整批删除, 规则同 [`PromotionRepository::update_details`]
    async fn delete_details(&self, promotion_id: Uuid, ids: &[Uuid]) -> AppResult<u64>;

    async fn list_usages(
        &self,
        promotion_id: Uuid,
        page: &PaginationParams,
    ) -> AppResult<(Vec<PromotionUsage>, u64)>;

    async fn count_usages(&self, promotion_id: Uuid) -> AppResult<u64>;

    /// 同一快照下的 (used_count, 流水条数); 活动不存在时返回 `None`
    async fn usage_counts(&self, promotion_id: Uuid) -> AppResult<Option<(i32, u64)>>;
}

/// 调用方 (预订子系统) 持有的事务句柄
///
/// 核销只通过这里读写, 从不自行开启或提交事务。
#[async_trait]
pub trait RedemptionTx: Send {
    /// `used_count = used_count + 1`, 条件为 `usage_limit IS NULL OR used_count < usage_limit`;
    /// 返回是否命中一行
    async fn increment_used_count(&mut self, promotion_id: Uuid) -> AppResult<bool>;

    /// 在同一事务内读取当前行
    async fn load_promotion(&mut self, promotion_id: Uuid) -> AppResult<Option<Promotion>>;

    async fn append_usage(&mut self, usage: PromotionUsage) -> AppResult<PromotionUsage>;
}
