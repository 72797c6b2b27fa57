use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Promotions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum PromotionDetails {
    Table,
    Id,
    PromotionId,
    RoomTypeId,
    DiscountType,
    DiscountValue,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PromotionDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromotionDetails::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PromotionDetails::PromotionId).uuid().not_null())
                    .col(ColumnDef::new(PromotionDetails::RoomTypeId).uuid().not_null())
                    .col(
                        ColumnDef::new(PromotionDetails::DiscountType)
                            .custom(Alias::new("discount_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromotionDetails::DiscountValue)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromotionDetails::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(PromotionDetails::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promotion_details_promotion")
                            .from(PromotionDetails::Table, PromotionDetails::PromotionId)
                            .to(Promotions::Table, Promotions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个房型在同一优惠下只能有一条覆盖规则
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_promotion_details_promotion_room_type")
                    .table(PromotionDetails::Table)
                    .col(PromotionDetails::PromotionId)
                    .col(PromotionDetails::RoomTypeId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PromotionDetails::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
