use crate::error::{Error, Result};
use crate::models::change_event::ChangeEvent;
use async_trait::async_trait;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const EVENT_BUFFER: usize = 64;

/// Trigger installed by the candidates migration.
pub const NOTIFY_TRIGGER: &str = "candidates_change_notify";

/// Source of candidate table change notifications.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self) -> Result<Subscription>;
}

/// An open subscription. Dropping it releases the underlying listener.
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    pump: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<ChangeEvent>, pump: JoinHandle<()>) -> Self {
        Self {
            events,
            pump: Some(pump),
        }
    }

    /// A subscription fed directly by the caller, with no background pump.
    pub fn from_channel(events: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { events, pump: None }
    }

    /// Next event, or `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.events.close();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// `LISTEN`s on the channel the candidates trigger notifies.
#[derive(Clone)]
pub struct PgChangeFeed {
    pool: PgPool,
    channel: String,
}

impl PgChangeFeed {
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }

    /// Fails unless the database we listen on carries the notify trigger on
    /// its `candidates` table. Without it no event would ever arrive.
    pub async fn ensure_notifier(&self) -> Result<()> {
        let installed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM pg_trigger t
                JOIN pg_class c ON c.oid = t.tgrelid
                WHERE c.relname = 'candidates' AND t.tgname = $1
            )
            "#,
        )
        .bind(NOTIFY_TRIGGER)
        .fetch_one(&self.pool)
        .await?;

        if !installed {
            return Err(Error::Config(format!(
                "DATABASE_URL has no {} trigger on candidates; \
                 point it at the database that owns the table",
                NOTIFY_TRIGGER
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self) -> Result<Subscription> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener
            .listen(&self.channel)
            .await
            .map_err(|e| Error::Subscription(format!("LISTEN {} failed: {}", self.channel, e)))?;
        tracing::info!(channel = %self.channel, "Subscribed to candidate changes");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let channel = self.channel.clone();
        let pump = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    received = listener.recv() => match received {
                        Ok(notification) => {
                            let event = ChangeEvent::from_payload(notification.payload());
                            tracing::debug!(?event, "candidate change received");
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::error!(
                                channel = %channel,
                                error = ?e,
                                "change listener failed"
                            );
                            break;
                        }
                    },
                }
            }
            if let Err(e) = listener.unlisten_all().await {
                tracing::debug!(error = ?e, "unlisten on closed listener");
            }
            tracing::info!(channel = %channel, "Change subscription released");
        });

        Ok(Subscription::new(rx, pump))
    }
}
