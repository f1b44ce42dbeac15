use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    errors::Result,
    models::{Notification, NotificationKind},
    services::redis::RedisService,
};

pub const NOTIFICATION_QUEUE: &str = "notifications:queue";

/// Accepts notifications for asynchronous delivery. Callers never wait on delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn enqueue(&self, notification: Notification) -> Result<()>;
}

/// Pushes JSON-encoded notifications onto a Redis list consumed by the mailer.
pub struct RedisNotificationSink {
    redis: RedisService,
    queue: String,
}

impl RedisNotificationSink {
    pub fn new(redis: RedisService) -> Self {
        Self {
            redis,
            queue: NOTIFICATION_QUEUE.to_string(),
        }
    }
}

#[async_trait]
impl NotificationSink for RedisNotificationSink {
    async fn enqueue(&self, notification: Notification) -> Result<()> {
        let payload = serde_json::to_string(&notification)?;
        let mut conn = self.redis.connection_manager().clone();
        redis::cmd("LPUSH")
            .arg(&self.queue)
            .arg(payload)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Used when no queue is configured; notifications only reach the log.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn enqueue(&self, notification: Notification) -> Result<()> {
        tracing::info!(
            recipient = %notification.recipient_id,
            kind = ?notification.kind,
            "notification enqueued"
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNotificationSink {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotificationSink {
    async fn enqueue(&self, notification: Notification) -> Result<()> {
        self.sent.lock().await.push(notification);
        Ok(())
    }
}
