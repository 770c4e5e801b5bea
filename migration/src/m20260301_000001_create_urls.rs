use sea_orm_migration::prelude::*;

/// short_code 唯一约束名，服务层据此区分"短码冲突"与其他约束冲突
pub const SHORT_CODE_UNIQUE_INDEX: &str = "urls_short_code_key";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 urls 表
        manager
            .create_table(
                Table::create()
                    .table(Urls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Urls::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Urls::ShortCode).string_len(20).not_null())
                    .col(ColumnDef::new(Urls::OriginalUrl).text().not_null())
                    .col(
                        ColumnDef::new(Urls::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Urls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Urls::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Urls::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Urls::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一索引：并发写入的冲突由数据库裁决
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(SHORT_CODE_UNIQUE_INDEX)
                    .table(Urls::Table)
                    .col(Urls::ShortCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_expires_at")
                    .table(Urls::Table)
                    .col(Urls::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_urls_expires_at")
                    .table(Urls::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name(SHORT_CODE_UNIQUE_INDEX)
                    .table(Urls::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Urls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Urls {
    Table,
    Id,
    ShortCode,
    OriginalUrl,
    ClickCount,
    CreatedAt,
    UpdatedAt,
    ExpiresAt,
    IsActive,
}
