use std::{future::pending, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::{JoinError, JoinHandle},
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::sync::{SyncConfig, SyncError, SyncEvent, SyncMachine, SyncStatus};

/// Something the scheduler can poll
#[async_trait]
pub trait SyncSource: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    async fn fetch(&self) -> anyhow::Result<Self::Output>;
}

/// `true` while the consumer is hidden
pub type VisibilitySignal = watch::Receiver<bool>;

type FetchResult<T> = Result<Arc<T>, SyncError>;

enum Command<T> {
    MarkActive,
    Pause,
    Resume,
    RefetchNow(oneshot::Sender<FetchResult<T>>),
}

/// Handle to a running adaptive scheduler.
///
/// Dropping the handle stops the driver task. A fetch that is in flight at
/// that point runs to completion in the background and its result is
/// discarded.
pub struct AdaptiveSync<S: SyncSource> {
    commands: mpsc::UnboundedSender<Command<S::Output>>,
    status: watch::Receiver<SyncStatus>,
    data: watch::Receiver<Option<Arc<S::Output>>>,
    shutdown_token: CancellationToken,
    driver: Option<JoinHandle<()>>,
    _source: PhantomData<fn() -> S>,
}

impl<S: SyncSource> AdaptiveSync<S> {
    /// Validate `config` and start the driver on the current tokio runtime.
    pub fn spawn(
        source: S,
        config: SyncConfig,
        visibility: Option<VisibilitySignal>,
    ) -> Result<Self, SyncError> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let machine = SyncMachine::new(config, Timestamp::now());
        let (status_tx, status_rx) = watch::channel(machine.status().clone());
        let (data_tx, data_rx) = watch::channel(None);
        let shutdown_token = CancellationToken::new();

        let driver = Driver {
            source: Arc::new(source),
            machine,
            commands: command_rx,
            status_tx,
            data_tx,
            visibility,
            shutdown_token: shutdown_token.clone(),
            in_flight: None,
            waiters: Vec::new(),
            tick_at: None,
            idle_at: None,
        };

        Ok(Self {
            commands: command_tx,
            status: status_rx,
            data: data_rx,
            shutdown_token,
            driver: Some(tokio::spawn(driver.run())),
            _source: PhantomData,
        })
    }

    /// Record user activity.
    pub fn mark_active(&self) {
        let _ = self.commands.send(Command::MarkActive);
    }

    pub fn pause(&self) {
        let _ = self.commands.send(Command::Pause);
    }

    pub fn resume(&self) {
        let _ = self.commands.send(Command::Resume);
    }

    /// Fetch immediately and wait for the outcome. Joins the fetch already in
    /// flight instead of starting a second one.
    pub async fn refetch_now(&self) -> FetchResult<S::Output> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::RefetchNow(tx))
            .map_err(|_| SyncError::Stopped)?;
        rx.await.map_err(|_| SyncError::Stopped)?
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Latest successfully fetched value
    pub fn data(&self) -> Option<Arc<S::Output>> {
        self.data.borrow().clone()
    }

    pub fn subscribe_data(&self) -> watch::Receiver<Option<Arc<S::Output>>> {
        self.data.clone()
    }

    /// Stop the driver and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.shutdown_token.cancel();
        if let Some(driver) = self.driver.take()
            && let Err(e) = driver.await
        {
            warn!("Sync driver exited abnormally: {}", e);
        }
    }
}

impl<S: SyncSource> Drop for AdaptiveSync<S> {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

enum Wake<T> {
    Shutdown,
    Fetched(Result<anyhow::Result<T>, JoinError>),
    Command(Option<Command<T>>),
    Visibility(Option<bool>),
    Idle,
    Tick,
}

struct Driver<S: SyncSource> {
    source: Arc<S>,
    machine: SyncMachine,
    commands: mpsc::UnboundedReceiver<Command<S::Output>>,
    status_tx: watch::Sender<SyncStatus>,
    data_tx: watch::Sender<Option<Arc<S::Output>>>,
    visibility: Option<VisibilitySignal>,
    shutdown_token: CancellationToken,
    in_flight: Option<JoinHandle<anyhow::Result<S::Output>>>,
    waiters: Vec<oneshot::Sender<FetchResult<S::Output>>>,
    tick_at: Option<Instant>,
    idle_at: Option<Instant>,
}

impl<S: SyncSource> Driver<S> {
    async fn run(mut self) {
        self.start();

        loop {
            let wake = tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => Wake::Shutdown,
                result = join_in_flight(&mut self.in_flight) => Wake::Fetched(result),
                command = self.commands.recv() => Wake::Command(command),
                hidden = visibility_change(&mut self.visibility) => Wake::Visibility(hidden),
                _ = sleep_until_opt(self.idle_at) => Wake::Idle,
                _ = sleep_until_opt(self.tick_at) => Wake::Tick,
            };

            match wake {
                Wake::Shutdown | Wake::Command(None) => break,
                Wake::Fetched(result) => {
                    self.in_flight = None;
                    self.finish_fetch(result);
                }
                Wake::Command(Some(command)) => self.handle_command(command),
                Wake::Visibility(Some(hidden)) => {
                    debug!("Sync visibility changed: hidden={}", hidden);
                    self.apply(if hidden {
                        SyncEvent::Hidden
                    } else {
                        SyncEvent::Visible
                    });
                }
                Wake::Visibility(None) => self.visibility = None,
                Wake::Idle => {
                    self.idle_at = None;
                    debug!("Sync session went idle");
                    self.apply(SyncEvent::IdleTimeout);
                }
                Wake::Tick => {
                    self.tick_at = None;
                    // an in-flight fetch re-arms the tick when it completes
                    if self.in_flight.is_none() && self.machine.polling() {
                        self.start_fetch();
                    }
                }
            }
        }

        info!("Sync driver stopped");
    }

    fn start(&mut self) {
        self.idle_at = Some(Instant::now() + self.machine.config().idle_timeout);

        let hidden = self
            .visibility
            .as_mut()
            .is_some_and(|visibility| *visibility.borrow_and_update());
        if hidden {
            self.apply(SyncEvent::Hidden);
        }

        if self.machine.polling() {
            self.start_fetch();
        } else {
            self.publish();
        }
    }

    fn handle_command(&mut self, command: Command<S::Output>) {
        match command {
            Command::MarkActive => self.apply(SyncEvent::MarkActive),
            Command::Pause => self.apply(SyncEvent::Pause),
            Command::Resume => self.apply(SyncEvent::Resume),
            Command::RefetchNow(waiter) => {
                self.apply(SyncEvent::MarkActive);
                self.waiters.push(waiter);
                if self.in_flight.is_none() {
                    self.start_fetch();
                }
            }
        }
    }

    fn start_fetch(&mut self) {
        let source = Arc::clone(&self.source);
        self.in_flight = Some(tokio::spawn(async move { source.fetch().await }));
        debug!("Sync fetch started");
        self.apply(SyncEvent::FetchStarted);
    }

    fn finish_fetch(&mut self, result: Result<anyhow::Result<S::Output>, JoinError>) {
        let outcome = match result {
            Ok(Ok(output)) => {
                let output = Arc::new(output);
                self.data_tx.send_replace(Some(Arc::clone(&output)));
                self.apply(SyncEvent::FetchSucceeded);
                debug!("Sync fetch succeeded");
                Ok(output)
            }
            Ok(Err(e)) => {
                self.apply(SyncEvent::FetchFailed);
                Err(SyncError::Fetch(Arc::new(e)))
            }
            Err(e) => {
                self.apply(SyncEvent::FetchFailed);
                warn!("Sync fetch task aborted: {}", e);
                Err(SyncError::Aborted)
            }
        };

        if let Err(e) = &outcome {
            if self.waiters.is_empty() {
                warn!(
                    "Background sync failed (consecutive errors: {}): {}",
                    self.machine.status().error_count,
                    e
                );
            }
        }

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
    }

    fn apply(&mut self, event: SyncEvent) {
        let effects = self.machine.apply(event, Timestamp::now());
        let now = Instant::now();

        if effects.rearm_tick {
            self.tick_at = self
                .machine
                .status()
                .current_interval
                .map(|interval| now + interval);
        }
        if effects.reset_idle {
            self.idle_at = Some(now + self.machine.config().idle_timeout);
        }

        self.publish();
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.machine.status().clone());
    }
}

async fn join_in_flight<T>(in_flight: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

async fn visibility_change(visibility: &mut Option<VisibilitySignal>) -> Option<bool> {
    match visibility {
        Some(receiver) => match receiver.changed().await {
            Ok(()) => Some(*receiver.borrow_and_update()),
            Err(_) => None,
        },
        None => pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
