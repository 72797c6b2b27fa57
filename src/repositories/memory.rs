//! 内存实现, 用于测试与本地调试
//!
//! 每条 promotion 有一把行锁, 事务在条件更新时获取并持有到提交或丢弃,
//! 与 Postgres 的 UPDATE 行锁语义一致。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{PromotionRepository, RedemptionTx};
use crate::entities::PromotionStatus;
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginationParams, Promotion, PromotionDetail, PromotionFilter, PromotionUsage,
};

#[derive(Default)]
struct Tables {
    promotions: HashMap<Uuid, Promotion>,
    details: HashMap<Uuid, PromotionDetail>,
    usages: Vec<PromotionUsage>,
}

impl Tables {
    fn active_code_taken(&self, code: &str, except: Option<Uuid>) -> bool {
        self.promotions.values().any(|p| {
            p.status == PromotionStatus::Active && p.code == code && Some(p.id) != except
        })
    }

    fn room_type_taken(&self, promotion_id: Uuid, room_type_id: Uuid, except: Option<Uuid>) -> bool {
        self.details.values().any(|d| {
            d.promotion_id == promotion_id && d.room_type_id == room_type_id && Some(d.id) != except
        })
    }

    fn booking_taken(&self, booking_id: Uuid) -> bool {
        self.usages.iter().any(|u| u.booking_id == booking_id)
    }
}

#[derive(Default)]
struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl Inner {
    async fn row_lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.row_locks.lock().await;
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Clone, Default)]
pub struct MemoryPromotionRepository {
    inner: Arc<Inner>,
}

impl MemoryPromotionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开启一个事务, 供核销使用
    pub fn begin(&self) -> MemoryTransaction {
        MemoryTransaction {
            inner: self.inner.clone(),
            locks: HashMap::new(),
            increments: HashMap::new(),
            usages: Vec::new(),
        }
    }
}

fn conflict_code() -> AppError {
    AppError::Conflict("Promotion code already exists".to_string())
}

fn conflict_room_type() -> AppError {
    AppError::Conflict("Room type already has an override for this promotion".to_string())
}

#[async_trait]
impl PromotionRepository for MemoryPromotionRepository {
    async fn find_promotion(&self, id: Uuid) -> AppResult<Option<Promotion>> {
        let tables = self.inner.tables.lock().await;
        Ok(tables.promotions.get(&id).cloned())
    }

    async fn find_promotion_by_code(&self, code: &str) -> AppResult<Option<Promotion>> {
        let tables = self.inner.tables.lock().await;
        let found = tables
            .promotions
            .values()
            .filter(|p| p.code == code)
            .min_by_key(|p| {
                (
                    p.status != PromotionStatus::Active,
                    std::cmp::Reverse(p.created_at),
                )
            })
            .cloned();
        Ok(found)
    }

    async fn list_promotions(
        &self,
        filter: &PromotionFilter,
        page: &PaginationParams,
    ) -> AppResult<(Vec<Promotion>, u64)> {
        let tables = self.inner.tables.lock().await;
        let mut matched: Vec<Promotion> = tables
            .promotions
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let data = matched
            .into_iter()
            .skip(page.get_offset() as usize)
            .take(page.get_limit() as usize)
            .collect();
        Ok((data, total))
    }

    async fn insert_promotion(&self, promotion: Promotion) -> AppResult<Promotion> {
        let mut tables = self.inner.tables.lock().await;
        if tables.promotions.contains_key(&promotion.id) {
            return Err(AppError::Conflict("Promotion already exists".to_string()));
        }
        if promotion.status == PromotionStatus::Active
            && tables.active_code_taken(&promotion.code, None)
        {
            return Err(conflict_code());
        }
        tables.promotions.insert(promotion.id, promotion.clone());
        Ok(promotion)
    }

    async fn update_promotion(&self, promotion: Promotion) -> AppResult<Promotion> {
        let _row = self.inner.row_lock(promotion.id).await;
        let mut tables = self.inner.tables.lock().await;

        let Some(current) = tables.promotions.get(&promotion.id).cloned() else {
            return Err(AppError::NotFound("Promotion not found".to_string()));
        };
        if promotion.status == PromotionStatus::Active
            && tables.active_code_taken(&promotion.code, Some(promotion.id))
        {
            return Err(conflict_code());
        }
        if let Some(limit) = promotion.usage_limit {
            // 对应表上的 CHECK 约束
            if current.used_count > limit {
                return Err(AppError::Conflict(
                    "Change rejected by constraint, usage_limit is below used_count".to_string(),
                ));
            }
        }

        let updated = Promotion {
            used_count: current.used_count,
            created_by: current.created_by,
            created_at: current.created_at,
            updated_at: Utc::now(),
            ..promotion
        };
        tables.promotions.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete_promotion(&self, id: Uuid) -> AppResult<bool> {
        let _row = self.inner.row_lock(id).await;
        let mut tables = self.inner.tables.lock().await;

        if tables.usages.iter().any(|u| u.promotion_id == id) {
            return Err(AppError::Conflict(
                "Promotion has usage records; deactivate it instead".to_string(),
            ));
        }
        let removed = tables.promotions.remove(&id).is_some();
        if removed {
            tables.details.retain(|_, d| d.promotion_id != id);
        }
        Ok(removed)
    }

    async fn find_detail_for_room_type(
        &self,
        promotion_id: Uuid,
        room_type_id: Uuid,
    ) -> AppResult<Option<PromotionDetail>> {
        let tables = self.inner.tables.lock().await;
        Ok(tables
            .details
            .values()
            .find(|d| d.promotion_id == promotion_id && d.room_type_id == room_type_id)
            .cloned())
    }

    async fn list_details(&self, promotion_id: Uuid) -> AppResult<Vec<PromotionDetail>> {
        let tables = self.inner.tables.lock().await;
        let mut rows: Vec<PromotionDetail> = tables
            .details
            .values()
            .filter(|d| d.promotion_id == promotion_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn find_details(&self, ids: &[Uuid]) -> AppResult<Vec<PromotionDetail>> {
        let tables = self.inner.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.details.get(id).cloned())
            .collect())
    }

    async fn insert_details(
        &self,
        rows: Vec<PromotionDetail>,
    ) -> AppResult<Vec<PromotionDetail>> {
        let mut tables = self.inner.tables.lock().await;

        // 先整体校验, 再一次性写入
        for (i, row) in rows.iter().enumerate() {
            if !tables.promotions.contains_key(&row.promotion_id) {
                return Err(AppError::ValidationError(format!(
                    "Promotion {} does not exist",
                    row.promotion_id
                )));
            }
            let dup_in_batch = rows[..i].iter().any(|r| {
                r.promotion_id == row.promotion_id && r.room_type_id == row.room_type_id
            });
            if dup_in_batch || tables.room_type_taken(row.promotion_id, row.room_type_id, None) {
                return Err(conflict_room_type());
            }
        }

        for row in &rows {
            tables.details.insert(row.id, row.clone());
        }
        Ok(rows)
    }

    async fn update_details(
        &self,
        promotion_id: Uuid,
        rows: Vec<PromotionDetail>,
    ) -> AppResult<Vec<PromotionDetail>> {
        let mut tables = self.inner.tables.lock().await;

        for row in &rows {
            let belongs = tables
                .details
                .get(&row.id)
                .is_some_and(|d| d.promotion_id == promotion_id);
            if !belongs {
                return Err(AppError::ValidationError(format!(
                    "Promotion detail {} does not belong to promotion {promotion_id}",
                    row.id
                )));
            }
        }

        // 在副本上应用, 全部通过后再替换
        let mut staged = tables.details.clone();
        let now = Utc::now();
        let mut updated = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(existing) = staged.get_mut(&row.id) else {
                continue;
            };
            existing.room_type_id = row.room_type_id;
            existing.discount_type = row.discount_type;
            existing.discount_value = row.discount_value;
            existing.updated_at = now;
            updated.push(existing.clone());
        }
        let duplicated = staged.values().any(|a| {
            staged.values().any(|b| {
                a.id != b.id && a.promotion_id == b.promotion_id && a.room_type_id == b.room_type_id
            })
        });
        if duplicated {
            return Err(conflict_room_type());
        }

        tables.details = staged;
        Ok(updated)
    }

    async fn delete_details(&self, promotion_id: Uuid, ids: &[Uuid]) -> AppResult<u64> {
        let mut tables = self.inner.tables.lock().await;

        let all_owned = ids.iter().all(|id| {
            tables
                .details
                .get(id)
                .is_some_and(|d| d.promotion_id == promotion_id)
        });
        if !all_owned {
            return Err(AppError::ValidationError(format!(
                "Some promotion details do not belong to promotion {promotion_id}"
            )));
        }

        let mut deleted = 0;
        for id in ids {
            if tables.details.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn list_usages(
        &self,
        promotion_id: Uuid,
        page: &PaginationParams,
    ) -> AppResult<(Vec<PromotionUsage>, u64)> {
        let tables = self.inner.tables.lock().await;
        let mut rows: Vec<PromotionUsage> = tables
            .usages
            .iter()
            .filter(|u| u.promotion_id == promotion_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.used_at.cmp(&a.used_at));

        let total = rows.len() as u64;
        let data = rows
            .into_iter()
            .skip(page.get_offset() as usize)
            .take(page.get_limit() as usize)
            .collect();
        Ok((data, total))
    }

    async fn count_usages(&self, promotion_id: Uuid) -> AppResult<u64> {
        let tables = self.inner.tables.lock().await;
        Ok(tables
            .usages
            .iter()
            .filter(|u| u.promotion_id == promotion_id)
            .count() as u64)
    }

    async fn usage_counts(&self, promotion_id: Uuid) -> AppResult<Option<(i32, u64)>> {
        let tables = self.inner.tables.lock().await;
        Ok(tables.promotions.get(&promotion_id).map(|p| {
            let rows = tables
                .usages
                .iter()
                .filter(|u| u.promotion_id == promotion_id)
                .count() as u64;
            (p.used_count, rows)
        }))
    }
}

/// 未提交的写入只在本事务内可见; 丢弃即回滚
pub struct MemoryTransaction {
    inner: Arc<Inner>,
    locks: HashMap<Uuid, OwnedMutexGuard<()>>,
    increments: HashMap<Uuid, i32>,
    usages: Vec<PromotionUsage>,
}

impl MemoryTransaction {
    async fn lock_row(&mut self, promotion_id: Uuid) {
        if !self.locks.contains_key(&promotion_id) {
            let guard = self.inner.row_lock(promotion_id).await;
            self.locks.insert(promotion_id, guard);
        }
    }

    fn pending_increment(&self, promotion_id: Uuid) -> i32 {
        self.increments.get(&promotion_id).copied().unwrap_or(0)
    }

    pub async fn commit(self) -> AppResult<()> {
        let mut tables = self.inner.tables.lock().await;

        for usage in &self.usages {
            if tables.booking_taken(usage.booking_id) {
                return Err(AppError::Conflict(
                    "Booking already has a promotion applied".to_string(),
                ));
            }
        }

        let now = Utc::now();
        for (id, delta) in &self.increments {
            if let Some(p) = tables.promotions.get_mut(id) {
                p.used_count += delta;
                p.updated_at = now;
            }
        }
        tables.usages.extend(self.usages);
        // 行锁随 self.locks 释放
        Ok(())
    }

    pub fn rollback(self) {}
}

#[async_trait]
impl RedemptionTx for MemoryTransaction {
    async fn increment_used_count(&mut self, promotion_id: Uuid) -> AppResult<bool> {
        self.lock_row(promotion_id).await;

        let pending = self.pending_increment(promotion_id);
        let allowed = {
            let tables = self.inner.tables.lock().await;
            match tables.promotions.get(&promotion_id) {
                None => false,
                Some(p) => match p.usage_limit {
                    None => true,
                    Some(limit) => p.used_count + pending < limit,
                },
            }
        };

        if allowed {
            *self.increments.entry(promotion_id).or_insert(0) += 1;
        }
        Ok(allowed)
    }

    async fn load_promotion(&mut self, promotion_id: Uuid) -> AppResult<Option<Promotion>> {
        let pending = self.pending_increment(promotion_id);
        let tables = self.inner.tables.lock().await;
        Ok(tables.promotions.get(&promotion_id).cloned().map(|mut p| {
            p.used_count += pending;
            p
        }))
    }

    async fn append_usage(&mut self, usage: PromotionUsage) -> AppResult<PromotionUsage> {
        {
            let tables = self.inner.tables.lock().await;
            if !tables.promotions.contains_key(&usage.promotion_id) {
                return Err(AppError::NotFound("Promotion not found".to_string()));
            }
            if tables.booking_taken(usage.booking_id) {
                return Err(AppError::Conflict(
                    "Booking already has a promotion applied".to_string(),
                ));
            }
        }
        if self.usages.iter().any(|u| u.booking_id == usage.booking_id) {
            return Err(AppError::Conflict(
                "Booking already has a promotion applied".to_string(),
            ));
        }

        self.usages.push(usage.clone());
        Ok(usage)
    }
}
