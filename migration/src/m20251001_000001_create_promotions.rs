use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Promotions {
    Table,
    Id,
    Code,
    HotelId,
    Name,
    Description,
    PromotionType,
    DiscountType,
    DiscountValue,
    MaxDiscountAmount,
    MinBookingPrice,
    ValidFrom,
    ValidUntil,
    UsageLimit,
    UsedCount,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // enums
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("discount_type"))
                    .values(vec![Alias::new("percentage"), Alias::new("fixed_amount")])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("promotion_type"))
                    .values(vec![Alias::new("general"), Alias::new("room_specific")])
                    .to_owned(),
            )
            .await?;
        // 枚举顺序决定排序: active 排在 inactive 之前
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("promotion_status"))
                    .values(vec![Alias::new("active"), Alias::new("inactive")])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Promotions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Promotions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Promotions::Code).string_len(20).not_null())
                    .col(ColumnDef::new(Promotions::HotelId).uuid().null())
                    .col(ColumnDef::new(Promotions::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Promotions::Description).text().null())
                    .col(
                        ColumnDef::new(Promotions::PromotionType)
                            .custom(Alias::new("promotion_type"))
                            .not_null()
                            .default(Expr::cust("'general'::promotion_type")),
                    )
                    .col(
                        ColumnDef::new(Promotions::DiscountType)
                            .custom(Alias::new("discount_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::DiscountValue)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::MaxDiscountAmount)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::MinBookingPrice)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::ValidFrom)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::ValidUntil)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Promotions::UsageLimit).integer().null()) // NULL = 不限次数
                    .col(
                        ColumnDef::new(Promotions::UsedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Promotions::Status)
                            .custom(Alias::new("promotion_status"))
                            .not_null()
                            .default(Expr::cust("'active'::promotion_status")),
                    )
                    .col(ColumnDef::new(Promotions::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Promotions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Promotions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .check(Expr::cust("valid_from < valid_until"))
                    .check(Expr::cust("usage_limit IS NULL OR usage_limit >= 1"))
                    .check(Expr::cust(
                        "used_count >= 0 AND (usage_limit IS NULL OR used_count <= usage_limit)",
                    ))
                    .to_owned(),
            )
            .await?;

        // 同一时间只允许一个 active 的同名优惠码
        let stmt = Statement::from_string(
            manager.get_database_backend(),
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_promotions_active_code ON promotions(code) WHERE status = 'active'".to_owned(),
        );
        manager.get_connection().execute(stmt).await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_promotions_code")
                    .table(Promotions::Table)
                    .col(Promotions::Code)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_promotions_hotel_id")
                    .table(Promotions::Table)
                    .col(Promotions::HotelId)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Promotions::Table).if_exists().to_owned())
            .await?;
        for name in ["promotion_status", "promotion_type", "discount_type"] {
            manager
                .drop_type(Type::drop().if_exists().name(Alias::new(name)).to_owned())
                .await?;
        }
        Ok(())
    }
}
