use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::api::{ApiClient, Channel, ChannelUnread, Message};

/// Updates produced by the resource pollers, drained by the event loop.
///
/// Payloads are full server snapshots; reconciliation replaces local state
/// wholesale. `Messages`/`Replies` carry their key so snapshots for a view
/// that has since closed can be discarded on arrival.
#[derive(Debug, Clone)]
pub enum SyncUpdate {
    Channels(Vec<Channel>),
    UnreadCounts(Vec<ChannelUnread>),
    Messages {
        channel_id: i64,
        messages: Vec<Message>,
    },
    Replies {
        message_id: i64,
        replies: Vec<Message>,
    },
    SessionExpired,
}

pub type UpdateQueue = Arc<Mutex<Vec<SyncUpdate>>>;

pub fn new_queue() -> UpdateQueue {
    Arc::new(Mutex::new(Vec::new()))
}

/// Drain everything queued so far.
pub async fn take_updates(queue: &UpdateQueue) -> Vec<SyncUpdate> {
    let mut updates = queue.lock().await;
    std::mem::take(&mut *updates)
}

/// One running poll loop. Dropping the handle cancels the timer; an
/// in-flight request is never aborted, its result is simply discarded at
/// reconciliation once the owning view is gone.
pub struct PollerHandle {
    handle: Option<JoinHandle<()>>,
    shutdown: broadcast::Sender<()>,
}

impl PollerHandle {
    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }

    /// Stop and wait briefly for the task to wind down (used at exit).
    pub async fn join(mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

/// Run `fetch` on a fixed schedule, pushing each successful snapshot into
/// the queue. Errors are logged and the schedule continues unchanged; an
/// authentication failure ends the loop after reporting `SessionExpired`.
fn spawn<F, Fut>(name: &'static str, every: Duration, queue: UpdateQueue, fetch: F) -> PollerHandle
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<SyncUpdate, crate::error::ApiError>> + Send,
{
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    let handle = tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match fetch().await {
                        Ok(update) => {
                            queue.lock().await.push(update);
                        }
                        Err(err) if err.is_auth_failure() => {
                            queue.lock().await.push(SyncUpdate::SessionExpired);
                            break;
                        }
                        Err(err) => {
                            tracing::warn!(poller = name, "fetch failed: {}", err);
                        }
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
        tracing::debug!(poller = name, "stopped");
    });

    PollerHandle {
        handle: Some(handle),
        shutdown: shutdown_tx,
    }
}

pub fn spawn_channel_poller(
    client: ApiClient,
    queue: UpdateQueue,
    every: Duration,
) -> PollerHandle {
    spawn("channels", every, queue, move || {
        let client = client.clone();
        async move { client.channels().await.map(SyncUpdate::Channels) }
    })
}

pub fn spawn_unread_poller(client: ApiClient, queue: UpdateQueue, every: Duration) -> PollerHandle {
    spawn("unread", every, queue, move || {
        let client = client.clone();
        async move { client.unread_counts().await.map(SyncUpdate::UnreadCounts) }
    })
}

pub fn spawn_message_poller(
    client: ApiClient,
    queue: UpdateQueue,
    every: Duration,
    channel_id: i64,
) -> PollerHandle {
    spawn("messages", every, queue, move || {
        let client = client.clone();
        async move {
            client.messages(channel_id).await.map(|messages| {
                SyncUpdate::Messages {
                    channel_id,
                    messages,
                }
            })
        }
    })
}

pub fn spawn_reply_poller(
    client: ApiClient,
    queue: UpdateQueue,
    every: Duration,
    message_id: i64,
) -> PollerHandle {
    spawn("replies", every, queue, move || {
        let client = client.clone();
        async move {
            client.replies(message_id).await.map(|replies| {
                SyncUpdate::Replies {
                    message_id,
                    replies,
                }
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_poller_ticks_and_stops() {
        let queue = new_queue();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let poller = spawn("test", Duration::from_millis(10), queue.clone(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(SyncUpdate::Channels(Vec::new()))
            }
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert!(!take_updates(&queue).await.is_empty());

        poller.join().await;
        let after_stop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_schedule() {
        let queue = new_queue();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let poller = spawn("flaky", Duration::from_millis(10), queue.clone(), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n % 2 == 0 {
                    Err(ApiError::Server(500))
                } else {
                    Ok(SyncUpdate::Channels(Vec::new()))
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        poller.join().await;
        // Failures did not stop the loop: successes kept arriving.
        assert!(calls.load(Ordering::SeqCst) >= 4);
        assert!(!take_updates(&queue).await.is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_ends_loop_with_session_expired() {
        let queue = new_queue();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let _poller = spawn("auth", Duration::from_millis(10), queue.clone(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::Unauthorized)
            }
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        let updates = take_updates(&queue).await;
        assert!(matches!(updates.as_slice(), [SyncUpdate::SessionExpired]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
