//! # Registry Watcher
//!
//! Follows one service's registry entry and calls back whenever it may have
//! changed.
//!
//! ```text
//! Starting ──► Watching ──► (Firing ──► Watching)* ──► Stopped
//! ```
//!
//! Every cycle re-reads the entry and fires the pre-hook, then waits for a
//! trigger: a change to the service's file, the periodic interval, or the stop
//! signal. A change or an elapsed interval fires the post-hook with a fresh
//! read and starts the next cycle. The pre-hook therefore runs once at start
//! and once per cycle, the post-hook once per cycle and never at start.
//!
//! A missing or malformed entry reaches the hooks as `None`; it never ends the
//! session. Hooks run inline on the watcher task, so a slow hook delays the
//! next wait.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use dockport_common::config::{MAX_WATCH_INTERVAL, WatchConfig};
use dockport_common::error::ValidationError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, info, warn};

use super::read_entry;

/// Callback receiving the current address, or `None` when the entry is
/// absent or invalid.
pub type Hook = Box<dyn FnMut(Option<&str>) + Send + 'static>;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("failed to watch registry directory {}: {source}", path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Changed,
    Elapsed,
    Stopped,
}

pub struct ServiceWatcher {
    config: WatchConfig,
    pre_hook: Hook,
    post_hook: Option<Hook>,
    stop: CancellationToken,
    events: UnboundedReceiver<notify::Result<Event>>,
    subscription: RecommendedWatcher,
    span: Span,
}

impl ServiceWatcher {
    /// Validates `config` and subscribes to changes in the registry directory.
    ///
    /// Nothing fires until [`ServiceWatcher::run`]. A subscription that cannot
    /// be established is returned as an error and leaves nothing behind.
    pub fn new<F>(config: WatchConfig, pre_hook: F, stop: CancellationToken, span: Span) -> Result<Self, WatchError>
    where
        F: FnMut(Option<&str>) + Send + 'static,
    {
        config.validate()?;

        let subscribe_error = |source| WatchError::Subscribe {
            path: config.registry_path.clone(),
            source,
        };
        let (tx, events) = mpsc::unbounded_channel();
        let mut subscription = notify::recommended_watcher(move |event: notify::Result<Event>| {
            let _ = tx.send(event);
        })
        .map_err(subscribe_error)?;
        subscription
            .watch(&config.registry_path, RecursiveMode::NonRecursive)
            .map_err(subscribe_error)?;

        Ok(Self {
            config,
            pre_hook: Box::new(pre_hook),
            post_hook: None,
            stop,
            events,
            subscription,
            span,
        })
    }

    pub fn with_post_hook<F>(mut self, post_hook: F) -> Self
    where
        F: FnMut(Option<&str>) + Send + 'static,
    {
        self.post_hook = Some(Box::new(post_hook));
        self
    }

    /// Runs the session on a dedicated task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drives the session until the stop signal fires or the change stream
    /// closes. The directory subscription is released when this returns.
    pub async fn run(self) {
        let Self {
            config,
            mut pre_hook,
            mut post_hook,
            stop,
            events,
            subscription,
            span,
        } = self;

        async move {
            let _subscription = subscription;
            let mut triggers = Triggers::new(&config, stop, events);
            info!(service = %config.service, path = %config.registry_path.display(), "watching service");

            loop {
                let address = current_address(&config).await;
                pre_hook(address.as_deref());

                let trigger = triggers.next().await;
                if trigger == Trigger::Stopped {
                    break;
                }
                debug!(?trigger, "registry cycle");

                if let Some(post_hook) = post_hook.as_mut() {
                    let address = current_address(&config).await;
                    post_hook(address.as_deref());
                }
            }
            info!(service = %config.service, "stopped watching service");
        }
        .instrument(span)
        .await
    }
}

async fn current_address(config: &WatchConfig) -> Option<String> {
    match read_entry(&config.service, &config.registry_path).await {
        Ok(entry) => Some(entry.address().to_string()),
        Err(err) => {
            warn!(service = %config.service, error = %err, "registry entry unavailable");
            None
        }
    }
}

struct Triggers {
    service: String,
    stop: CancellationToken,
    events: UnboundedReceiver<notify::Result<Event>>,
    ticker: Interval,
    settle: Duration,
}

impl Triggers {
    fn new(config: &WatchConfig, stop: CancellationToken, events: UnboundedReceiver<notify::Result<Event>>) -> Self {
        let period = config.interval.min(MAX_WATCH_INTERVAL);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            service: config.service.clone(),
            stop,
            events,
            ticker,
            settle: config.settle,
        }
    }

    /// The stop signal always wins over a change or tick that is ready at the
    /// same time.
    async fn next(&mut self) -> Trigger {
        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => return Trigger::Stopped,
                event = self.events.recv() => match event {
                    None => {
                        debug!("registry change stream closed");
                        return Trigger::Stopped;
                    }
                    Some(Err(err)) => warn!(error = %err, "registry watch error"),
                    Some(Ok(event)) if touches(&event, &self.service) => return self.settle().await,
                    Some(Ok(_)) => {}
                },
                _ = self.ticker.tick() => return Trigger::Elapsed,
            }
        }
    }

    /// Absorbs the burst of events a single write produces.
    async fn settle(&mut self) -> Trigger {
        let quiet = time::sleep(self.settle);
        tokio::pin!(quiet);
        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => return Trigger::Stopped,
                _ = &mut quiet => return Trigger::Changed,
                event = self.events.recv() => {
                    if event.is_none() {
                        return Trigger::Stopped;
                    }
                }
            }
        }
    }
}

/// Reads are not changes; our own reads of the entry must not retrigger.
fn touches(event: &Event, service: &str) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(OsStr::new(service)))
}
