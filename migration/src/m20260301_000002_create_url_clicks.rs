use sea_orm_migration::prelude::*;

use crate::m20260301_000001_create_urls::Urls;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UrlClicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UrlClicks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UrlClicks::UrlId).big_integer().not_null())
                    .col(
                        ColumnDef::new(UrlClicks::ClickedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UrlClicks::UserAgent).text().null())
                    .col(ColumnDef::new(UrlClicks::Referer).text().null())
                    .col(ColumnDef::new(UrlClicks::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(UrlClicks::DeviceType).string_len(20).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_url_clicks_url_id")
                            .from(UrlClicks::Table, UrlClicks::UrlId)
                            .to(Urls::Table, Urls::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 分析查询按 url_id + 时间范围扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_url_clicks_url_id_clicked_at")
                    .table(UrlClicks::Table)
                    .col(UrlClicks::UrlId)
                    .col(UrlClicks::ClickedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_url_clicks_url_id_clicked_at")
                    .table(UrlClicks::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(UrlClicks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UrlClicks {
    Table,
    Id,
    UrlId,
    ClickedAt,
    UserAgent,
    Referer,
    IpAddress,
    DeviceType,
}
