//! Intake loop: poll the chat transport and spawn one task per inbound message.
//!
//! The loop itself never waits on fetching, formatting or the usage counter;
//! all of that happens inside the spawned task. Fan-out is unbounded unless a
//! `max_in_flight` limit is set, in which case tasks wait for a semaphore permit.
//!
//! The `end` log line is written right after spawning, so it does not mean the
//! reply went out; the task logs `sent` for that.

use crate::domain::InboundMessage;
use crate::ports::{MessageHandler, UpdatesPort};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Pause after a failed poll before asking the transport again.
const DEFAULT_POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

pub struct IntakeService {
    updates: Arc<dyn UpdatesPort>,
    handler: Arc<dyn MessageHandler>,
    limiter: Option<Arc<Semaphore>>,
    poll_error_pause: Duration,
}

impl IntakeService {
    pub fn new(updates: Arc<dyn UpdatesPort>, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            updates,
            handler,
            limiter: None,
            poll_error_pause: DEFAULT_POLL_ERROR_PAUSE,
        }
    }

    /// Cap the number of messages handled at the same time.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(max_in_flight.max(1))));
        self
    }

    pub fn with_poll_error_pause(mut self, pause: Duration) -> Self {
        self.poll_error_pause = pause;
        self
    }

    /// Poll and dispatch until `shutdown` resolves. In-flight tasks are not awaited.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            bounded = self.limiter.is_some(),
            "intake started; waiting for messages"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested; intake stopped");
                    return;
                }
                batch = self.updates.poll() => match batch {
                    Ok(messages) => {
                        for message in messages {
                            self.dispatch(message);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "polling updates failed");
                        tokio::time::sleep(self.poll_error_pause).await;
                    }
                },
            }
        }
    }

    fn dispatch(&self, message: InboundMessage) {
        let user = message.sender.log_name();
        let text = message.text.clone();
        info!(user = %user, text = %text, "start");

        let handler = Arc::clone(&self.handler);
        let limiter = self.limiter.clone();
        tokio::spawn(async move {
            let _permit = match limiter {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            handler.handle(message).await;
        });

        info!(user = %user, text = %text, "end");
    }
}
