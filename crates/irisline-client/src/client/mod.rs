//! Push client: one logical device session over a reconnecting connection.
//!
//! [`PushClient::run`] drives the supervisor loop (connect, serve, back off,
//! retry) on the caller's task. [`PushHandle`] is the cloneable outbound
//! side; every handle call validates synchronously and only enqueues a
//! command that is ready to publish.

mod connect;
mod session;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use irisline_core::command::validate::Id;
use irisline_core::command::{
    Command, DirectCommand, IrisSubscribe, ItemOptions, PreparedCommand, ReactionStatus,
};
use irisline_core::error::{PushError, Result};
use irisline_core::parsers::ParserRegistry;
use irisline_core::subscription::{Subscription, SubscriptionSet};

use crate::auth::AuthProvider;
use crate::config::ClientConfig;
use crate::dispatch::HandlerRegistry;
use crate::events::{ClientEvent, EventBus, EventKind};
use crate::handlers::{self, IrisState};
use crate::supervisor::ConnectionSupervisor;
use crate::transport::Connector;

use session::SessionEnd;

pub struct PushClient {
    cfg: Arc<ClientConfig>,
    auth: Arc<dyn AuthProvider>,
    connector: Arc<dyn Connector>,
    supervisor: ConnectionSupervisor,
    events: Arc<EventBus>,
    parsers: ParserRegistry,
    handlers: HandlerRegistry,
    iris: Arc<IrisState>,
    subscriptions: Arc<Mutex<SubscriptionSet>>,
    connected: Arc<AtomicBool>,
    out_tx: mpsc::Sender<PreparedCommand>,
    out_rx: Mutex<Option<mpsc::Receiver<PreparedCommand>>>,
}

impl PushClient {
    pub fn new(
        cfg: ClientConfig,
        auth: Arc<dyn AuthProvider>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        cfg.validate()?;
        let iris = Arc::new(IrisState::new());
        let (out_tx, out_rx) = mpsc::channel(cfg.connection.outbound_queue);

        let mut subscriptions = SubscriptionSet::new();
        subscriptions.add(default_subscriptions(&cfg, auth.as_ref())?);

        Ok(Self {
            supervisor: ConnectionSupervisor::from_config(&cfg.reconnect),
            cfg: Arc::new(cfg),
            auth,
            connector,
            events: Arc::new(EventBus::new()),
            parsers: ParserRegistry::with_default_routes(),
            handlers: handlers::default_registry(iris.clone()),
            iris,
            subscriptions: Arc::new(Mutex::new(subscriptions)),
            connected: Arc::new(AtomicBool::new(false)),
            out_tx,
            out_rx: Mutex::new(Some(out_rx)),
        })
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    pub fn handle(&self) -> PushHandle {
        PushHandle {
            out_tx: self.out_tx.clone(),
            connected: self.connected.clone(),
            subscriptions: self.subscriptions.clone(),
            iris: self.iris.clone(),
            supervisor: self.supervisor.clone(),
            events: self.events.clone(),
        }
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    /// Run until stopped. Only one `run` may be active per client.
    pub async fn run(&self) -> Result<()> {
        let taken = lock(&self.out_rx).take();
        let mut out_rx =
            taken.ok_or_else(|| PushError::Internal("client is already running".into()))?;

        if !self.supervisor.start() {
            *lock(&self.out_rx) = Some(out_rx);
            return Err(PushError::Internal("supervisor is already active".into()));
        }

        let result = self.supervise(&mut out_rx).await;
        *lock(&self.out_rx) = Some(out_rx);
        result
    }

    async fn supervise(&self, out_rx: &mut mpsc::Receiver<PreparedCommand>) -> Result<()> {
        let params = connect::connect_params(&self.cfg, self.auth.as_ref());
        let timeout = self.cfg.connection.connect_timeout();

        while self.supervisor.is_active() {
            tracing::info!(host = %params.host, port = params.port, "connecting");
            let attempt = tokio::time::timeout(timeout, self.connector.connect(&params))
                .await
                .unwrap_or_else(|_| Err(PushError::Transport("connect timed out".into())));

            match attempt {
                Ok(conn) if self.supervisor.is_active() => {
                    self.supervisor.on_success();
                    let end = self.serve(conn, out_rx).await;
                    let reason = match &end {
                        SessionEnd::Stopped => "stopped".to_string(),
                        SessionEnd::Failed(e) => e.to_string(),
                    };
                    if self.events.has_listeners(EventKind::Disconnected) {
                        self.events.emit(ClientEvent::Disconnected { reason });
                    }
                    match end {
                        SessionEnd::Stopped => break,
                        SessionEnd::Failed(e) => tracing::warn!(error = %e, "connection lost"),
                    }
                }
                // stopped while the attempt was in flight
                Ok(_) => break,
                Err(e) => tracing::warn!(error = %e, "connect failed"),
            }

            if self.supervisor.on_failure().is_none() || !self.supervisor.wait_backoff().await {
                break;
            }
        }
        tracing::info!("push client stopped");
        Ok(())
    }
}

/// Subscriptions implied by the session flags.
fn default_subscriptions(cfg: &ClientConfig, auth: &dyn AuthProvider) -> Result<Vec<Subscription>> {
    let s = &cfg.session;
    let user_id = auth.user_id();
    let mut subs = vec![Subscription::skywalker_direct(Id::from(&user_id))?];
    if s.enable_live {
        subs.push(Subscription::skywalker_live(Id::from(&user_id))?);
    }
    if s.enable_presence {
        subs.push(Subscription::app_presence(None)?);
    }
    if s.enable_typing {
        subs.push(Subscription::direct_typing(Id::from(&user_id))?);
    }
    if s.enable_zero_provision {
        subs.push(Subscription::zero_provision(&auth.device_id(), None)?);
    }
    Ok(subs)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable outbound side of a [`PushClient`].
#[derive(Clone)]
pub struct PushHandle {
    out_tx: mpsc::Sender<PreparedCommand>,
    connected: Arc<AtomicBool>,
    subscriptions: Arc<Mutex<SubscriptionSet>>,
    iris: Arc<IrisState>,
    supervisor: ConnectionSupervisor,
    events: Arc<EventBus>,
}

impl PushHandle {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    pub fn send_text(
        &self,
        thread_id: Id<'_>,
        text: &str,
        client_context: Option<&str>,
    ) -> Result<()> {
        self.enqueue(&DirectCommand::send_text(thread_id, text, client_context)?)
    }

    pub fn send_like(&self, thread_id: Id<'_>, client_context: Option<&str>) -> Result<()> {
        self.enqueue(&DirectCommand::send_like(thread_id, client_context)?)
    }

    pub fn send_reaction(
        &self,
        thread_id: Id<'_>,
        item_id: Id<'_>,
        client_context: Option<&str>,
    ) -> Result<()> {
        let status = ReactionStatus::Created;
        self.enqueue(&DirectCommand::send_reaction(thread_id, item_id, status, client_context)?)
    }

    pub fn delete_reaction(
        &self,
        thread_id: Id<'_>,
        item_id: Id<'_>,
        client_context: Option<&str>,
    ) -> Result<()> {
        let status = ReactionStatus::Deleted;
        self.enqueue(&DirectCommand::send_reaction(thread_id, item_id, status, client_context)?)
    }

    pub fn send_post(
        &self,
        thread_id: Id<'_>,
        media_id: &str,
        opts: &ItemOptions<'_>,
    ) -> Result<()> {
        self.enqueue(&DirectCommand::send_post(thread_id, media_id, opts)?)
    }

    pub fn send_story(
        &self,
        thread_id: Id<'_>,
        story_id: &str,
        opts: &ItemOptions<'_>,
    ) -> Result<()> {
        self.enqueue(&DirectCommand::send_story(thread_id, story_id, opts)?)
    }

    pub fn send_profile(
        &self,
        thread_id: Id<'_>,
        user_id: Id<'_>,
        opts: &ItemOptions<'_>,
    ) -> Result<()> {
        self.enqueue(&DirectCommand::send_profile(thread_id, user_id, opts)?)
    }

    pub fn send_location(
        &self,
        thread_id: Id<'_>,
        location_id: Id<'_>,
        opts: &ItemOptions<'_>,
    ) -> Result<()> {
        self.enqueue(&DirectCommand::send_location(thread_id, location_id, opts)?)
    }

    pub fn send_hashtag(
        &self,
        thread_id: Id<'_>,
        hashtag: &str,
        opts: &ItemOptions<'_>,
    ) -> Result<()> {
        self.enqueue(&DirectCommand::send_hashtag(thread_id, hashtag, opts)?)
    }

    pub fn mark_seen(&self, thread_id: Id<'_>, item_id: Id<'_>) -> Result<()> {
        self.enqueue(&DirectCommand::mark_seen(thread_id, item_id)?)
    }

    pub fn indicate_activity(
        &self,
        thread_id: Id<'_>,
        active: bool,
        client_context: Option<&str>,
    ) -> Result<()> {
        self.enqueue(&DirectCommand::indicate_activity(thread_id, active, client_context)?)
    }

    /// Resume message sync from `seq_id`. Remembered and replayed on every reconnect.
    pub fn receive_offline_messages(&self, seq_id: i64, snapshot_at_ms: Option<i64>) -> Result<()> {
        let cmd = IrisSubscribe::new(seq_id, snapshot_at_ms)?;
        let _ordering = lock(&self.subscriptions);
        self.iris.record(seq_id, snapshot_at_ms);
        if self.is_connected() {
            self.enqueue(&cmd)?;
        }
        Ok(())
    }

    /// Add to the subscription set; published now when connected, and on
    /// every reconnect either way.
    pub fn subscribe(&self, subs: Vec<Subscription>) -> Result<()> {
        let mut set = lock(&self.subscriptions);
        let cmds = set.add(subs);
        self.enqueue_if_connected(&cmds)
    }

    pub fn unsubscribe(&self, subs: Vec<Subscription>) -> Result<()> {
        let mut set = lock(&self.subscriptions);
        let cmds = set.remove(subs);
        self.enqueue_if_connected(&cmds)
    }

    /// Make `subs` the whole set for each topic they name.
    pub fn replace_subscriptions(&self, subs: Vec<Subscription>) -> Result<()> {
        let mut set = lock(&self.subscriptions);
        let cmds = set.replace(subs);
        self.enqueue_if_connected(&cmds)
    }

    /// Idempotent.
    pub fn stop(&self) {
        self.supervisor.stop();
    }

    fn enqueue_if_connected<C: Command>(&self, cmds: &[C]) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }
        cmds.iter().try_for_each(|c| self.enqueue(c))
    }

    fn enqueue<C: Command>(&self, cmd: &C) -> Result<()> {
        let prepared = cmd.prepare()?;
        if !self.is_connected() {
            return Err(PushError::Transport("not connected".into()));
        }
        self.out_tx.try_send(prepared).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                PushError::Transport("outbound queue is full".into())
            }
            mpsc::error::TrySendError::Closed(_) => PushError::Stopped,
        })
    }
}
