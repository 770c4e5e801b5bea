use chrono::{DateTime, Utc};

use crate::analytics::{ClickEvent, DeviceType, UrlClick};
use crate::storage::{NewShortUrl, ShortUrl};
use migration::entities::{url, url_click};

/// 将 Sea-ORM Model 转换为 ShortUrl
pub fn model_to_short_url(model: url::Model) -> ShortUrl {
    ShortUrl {
        id: model.id,
        short_code: model.short_code,
        original_url: model.original_url,
        click_count: model.click_count.max(0),
        created_at: model.created_at,
        updated_at: model.updated_at,
        expires_at: model.expires_at,
        is_active: model.is_active,
    }
}

/// 新映射的 ActiveModel，id 由数据库分配
pub fn new_short_url_to_active_model(new_url: &NewShortUrl, now: DateTime<Utc>) -> url::ActiveModel {
    use sea_orm::ActiveValue::*;

    url::ActiveModel {
        id: NotSet,
        short_code: Set(new_url.short_code.clone()),
        original_url: Set(new_url.original_url.clone()),
        click_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        expires_at: Set(new_url.expires_at),
        is_active: Set(new_url.is_active),
    }
}

pub fn model_to_url_click(model: url_click::Model) -> UrlClick {
    UrlClick {
        id: model.id,
        url_id: model.url_id,
        clicked_at: model.clicked_at,
        user_agent: model.user_agent,
        referer: model.referer,
        ip_address: model.ip_address,
        device_type: model
            .device_type
            .as_deref()
            .map(DeviceType::parse_lossy)
            .unwrap_or_default(),
    }
}

pub fn click_event_to_active_model(event: &ClickEvent) -> url_click::ActiveModel {
    use sea_orm::ActiveValue::*;

    url_click::ActiveModel {
        id: NotSet,
        url_id: Set(event.url_id),
        clicked_at: Set(event.clicked_at),
        user_agent: Set(event.user_agent.clone()),
        referer: Set(event.referer.clone()),
        ip_address: Set(event.ip_address.clone()),
        device_type: Set(Some(event.device_type.to_string())),
    }
}
