//! Mutation operations for SeaOrmStorage

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, QueryFilter, TransactionTrait};
use sea_orm::{DbErr, sea_query::Expr};
use tracing::{debug, info};

use super::converters::{click_event_to_active_model, model_to_short_url, new_short_url_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::analytics::ClickEvent;
use crate::storage::{NewShortUrl, ShortUrl, StoreResult, UrlStore};

use migration::entities::{url, url_click};

#[async_trait]
impl UrlStore for SeaOrmStorage {
    async fn create(&self, new_url: NewShortUrl) -> StoreResult<ShortUrl> {
        // 插入不走重试：唯一约束冲突需要原样交给调用方
        let model = new_short_url_to_active_model(&new_url, Utc::now())
            .insert(&self.db)
            .await
            .map_err(retry::classify_db_error)?;

        info!("Short URL created: {} (id {})", model.short_code, model.id);
        Ok(model_to_short_url(model))
    }

    async fn get_by_short_code(&self, short_code: &str) -> StoreResult<ShortUrl> {
        self.find_resolvable(short_code).await
    }
}

impl SeaOrmStorage {
    /// 写入点击日志并累加 click_count，两者在同一事务中完成
    pub(super) async fn insert_click(&self, event: &ClickEvent) -> StoreResult<()> {
        let db = &self.db;

        retry::with_retry(
            &format!("record_click(url_id={})", event.url_id),
            self.retry_config,
            || async {
                let txn = db.begin().await?;
                let now = Utc::now();

                let updated = url::Entity::update_many()
                    .col_expr(
                        url::Column::ClickCount,
                        Expr::col(url::Column::ClickCount).add(1),
                    )
                    .col_expr(url::Column::UpdatedAt, Expr::value(now))
                    .filter(url::Column::Id.eq(event.url_id))
                    .exec(&txn)
                    .await?;

                if updated.rows_affected == 0 {
                    return Err(DbErr::RecordNotFound(format!("url id {}", event.url_id)));
                }

                url_click::Entity::insert(click_event_to_active_model(event))
                    .exec(&txn)
                    .await?;

                txn.commit().await
            },
        )
        .await
        .map_err(retry::classify_db_error)?;

        debug!(
            "Click recorded to {} database (url_id={})",
            self.backend_name.to_uppercase(),
            event.url_id
        );
        Ok(())
    }
}
