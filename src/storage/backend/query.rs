//! Query operations for SeaOrmStorage

use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use tracing::error;

use super::converters::model_to_short_url;
use super::{SeaOrmStorage, retry};
use crate::storage::{ShortUrl, StoreError, StoreResult};

use migration::entities::url;

impl SeaOrmStorage {
    /// 按短码查找启用且未过期的映射
    pub(super) async fn find_resolvable(&self, short_code: &str) -> StoreResult<ShortUrl> {
        let db = &self.db;
        let now = Utc::now();

        let result = retry::with_retry(
            &format!("get_by_short_code({})", short_code),
            self.retry_config,
            || async {
                url::Entity::find()
                    .filter(url::Column::ShortCode.eq(short_code))
                    .filter(url::Column::IsActive.eq(true))
                    .filter(
                        Condition::any()
                            .add(url::Column::ExpiresAt.is_null())
                            .add(url::Column::ExpiresAt.gt(now)),
                    )
                    .one(db)
                    .await
            },
        )
        .await;

        match result {
            Ok(Some(model)) => Ok(model_to_short_url(model)),
            Ok(None) => Err(StoreError::NotFound),
            Err(e) => {
                error!("查询短链接失败（重试后仍失败）: {}", e);
                Err(retry::classify_db_error(e))
            }
        }
    }
}
