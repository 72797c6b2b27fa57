use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Promotions {
    Table,
    Id,
}

/// 优惠使用流水 (只追加, 不更新不删除)
#[derive(DeriveIden)]
enum PromotionUsage {
    Table,
    Id,
    PromotionId,
    UserId,
    BookingId,
    DiscountAmount,
    OriginalAmount,
    FinalAmount,
    UsedAt,
    IpAddress,
    UserAgent,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PromotionUsage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromotionUsage::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PromotionUsage::PromotionId).uuid().not_null())
                    .col(ColumnDef::new(PromotionUsage::UserId).uuid().not_null())
                    .col(ColumnDef::new(PromotionUsage::BookingId).uuid().not_null())
                    .col(
                        ColumnDef::new(PromotionUsage::DiscountAmount)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromotionUsage::OriginalAmount)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromotionUsage::FinalAmount)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromotionUsage::UsedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(ColumnDef::new(PromotionUsage::IpAddress).string_len(64).null())
                    .col(ColumnDef::new(PromotionUsage::UserAgent).text().null())
                    // 有使用记录的优惠不能被物理删除
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promotion_usage_promotion")
                            .from(PromotionUsage::Table, PromotionUsage::PromotionId)
                            .to(Promotions::Table, Promotions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_promotion_usage_promotion_id")
                    .table(PromotionUsage::Table)
                    .col(PromotionUsage::PromotionId)
                    .to_owned(),
            )
            .await?;
        // 一笔预订最多使用一次优惠 (不支持叠加)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_promotion_usage_booking_unique")
                    .table(PromotionUsage::Table)
                    .col(PromotionUsage::BookingId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PromotionUsage::Table).if_exists().to_owned())
            .await
    }
}
