use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Notification;

#[derive(Debug, Serialize)]
pub(crate) struct NotificationResponse {
    pub(crate) id: String,
    pub(crate) kind: String,
    pub(crate) payload: serde_json::Value,
    pub(crate) created_at: String,
    pub(crate) read_at: Option<String>,
}

impl NotificationResponse {
    pub(crate) fn from_db(notification: Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            payload: notification.payload.0,
            created_at: format_primitive(notification.created_at),
            read_at: notification.read_at.map(format_primitive),
        }
    }
}
