//! Application events and the listener registry.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::types::{
    AckAction, ActionBadge, DirectThread, DirectThreadItem, IrisSubscribeAck, LiveBroadcast,
    SeenPayload, StoryScreenshot, ThreadActivity, ThreadNotify, UnseenCount, UserPresence,
    ZeroProvisionEvent,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected,
    Disconnected { reason: String },
    /// Per-packet failure surfaced to the application; the session stays up.
    Error { code: &'static str, message: String },

    ThreadCreated { thread_id: String, thread: DirectThread },
    ThreadUpdated { thread_id: String, thread: DirectThread },
    ThreadNotify { thread_id: String, item_id: String, notify: ThreadNotify },
    ThreadSeen { thread_id: String, user_id: String, seen: SeenPayload },
    ThreadActivity { thread_id: String, context: String, activity: ThreadActivity },
    ThreadItemCreated { thread_id: String, item_id: String, item: DirectThreadItem },
    ThreadItemUpdated { thread_id: String, item_id: String, item: DirectThreadItem },
    ThreadItemRemoved { thread_id: String, item_id: String },
    /// `inbox` is `"inbox"` or `"visual_inbox"`.
    UnseenCountUpdate { inbox: &'static str, count: UnseenCount },

    DirectStoryCreated { thread_id: String, thread: DirectThread },
    DirectStoryUpdated { thread_id: String, item_id: String, item: DirectThreadItem },
    DirectStoryScreenshot { thread_id: String, screenshot: StoryScreenshot },
    DirectStoryAction { thread_id: String, badge: ActionBadge },

    ClientContextAck(AckAction),
    IrisSubscribed(IrisSubscribeAck),

    LiveStarted(LiveBroadcast),
    LiveStopped { broadcast_id: String },
    Presence(UserPresence),
    RegionHint(String),
    ZeroProvision(ZeroProvisionEvent),
}

/// Discriminant of [`ClientEvent`], used to register listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    Error,
    ThreadCreated,
    ThreadUpdated,
    ThreadNotify,
    ThreadSeen,
    ThreadActivity,
    ThreadItemCreated,
    ThreadItemUpdated,
    ThreadItemRemoved,
    UnseenCountUpdate,
    DirectStoryCreated,
    DirectStoryUpdated,
    DirectStoryScreenshot,
    DirectStoryAction,
    ClientContextAck,
    IrisSubscribed,
    LiveStarted,
    LiveStopped,
    Presence,
    RegionHint,
    ZeroProvision,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::Error => "error",
            EventKind::ThreadCreated => "thread-created",
            EventKind::ThreadUpdated => "thread-updated",
            EventKind::ThreadNotify => "thread-notify",
            EventKind::ThreadSeen => "thread-seen",
            EventKind::ThreadActivity => "thread-activity",
            EventKind::ThreadItemCreated => "thread-item-created",
            EventKind::ThreadItemUpdated => "thread-item-updated",
            EventKind::ThreadItemRemoved => "thread-item-removed",
            EventKind::UnseenCountUpdate => "unseen-count-update",
            EventKind::DirectStoryCreated => "direct-story-created",
            EventKind::DirectStoryUpdated => "direct-story-updated",
            EventKind::DirectStoryScreenshot => "direct-story-screenshot",
            EventKind::DirectStoryAction => "direct-story-action",
            EventKind::ClientContextAck => "client-context-ack",
            EventKind::IrisSubscribed => "iris-subscribed",
            EventKind::LiveStarted => "live-started",
            EventKind::LiveStopped => "live-stopped",
            EventKind::Presence => "presence",
            EventKind::RegionHint => "region-hint",
            EventKind::ZeroProvision => "zero-provision",
        }
    }
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::Connected => EventKind::Connected,
            ClientEvent::Disconnected { .. } => EventKind::Disconnected,
            ClientEvent::Error { .. } => EventKind::Error,
            ClientEvent::ThreadCreated { .. } => EventKind::ThreadCreated,
            ClientEvent::ThreadUpdated { .. } => EventKind::ThreadUpdated,
            ClientEvent::ThreadNotify { .. } => EventKind::ThreadNotify,
            ClientEvent::ThreadSeen { .. } => EventKind::ThreadSeen,
            ClientEvent::ThreadActivity { .. } => EventKind::ThreadActivity,
            ClientEvent::ThreadItemCreated { .. } => EventKind::ThreadItemCreated,
            ClientEvent::ThreadItemUpdated { .. } => EventKind::ThreadItemUpdated,
            ClientEvent::ThreadItemRemoved { .. } => EventKind::ThreadItemRemoved,
            ClientEvent::UnseenCountUpdate { .. } => EventKind::UnseenCountUpdate,
            ClientEvent::DirectStoryCreated { .. } => EventKind::DirectStoryCreated,
            ClientEvent::DirectStoryUpdated { .. } => EventKind::DirectStoryUpdated,
            ClientEvent::DirectStoryScreenshot { .. } => EventKind::DirectStoryScreenshot,
            ClientEvent::DirectStoryAction { .. } => EventKind::DirectStoryAction,
            ClientEvent::ClientContextAck(_) => EventKind::ClientContextAck,
            ClientEvent::IrisSubscribed(_) => EventKind::IrisSubscribed,
            ClientEvent::LiveStarted(_) => EventKind::LiveStarted,
            ClientEvent::LiveStopped { .. } => EventKind::LiveStopped,
            ClientEvent::Presence(_) => EventKind::Presence,
            ClientEvent::RegionHint(_) => EventKind::RegionHint,
            ClientEvent::ZeroProvision(_) => EventKind::ZeroProvision,
        }
    }
}

type Listener = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Listeners per event kind, plus channel taps that receive every event.
///
/// Handlers ask [`EventBus::has_listeners`] before decoding, so a kind with
/// nobody listening costs nothing.
#[derive(Default)]
pub struct EventBus {
    listeners: DashMap<EventKind, Vec<Listener>>,
    taps: Mutex<Vec<mpsc::UnboundedSender<ClientEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, kind: EventKind, f: F)
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.listeners.entry(kind).or_default().push(Arc::new(f));
    }

    /// Channel receiving every event. Dropping the receiver unregisters it.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ClientEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_taps().push(tx);
        rx
    }

    pub fn has_listeners(&self, kind: EventKind) -> bool {
        let direct = self.listeners.get(&kind).map(|l| !l.is_empty()).unwrap_or(false);
        direct || self.lock_taps().iter().any(|t| !t.is_closed())
    }

    pub fn emit(&self, event: ClientEvent) {
        let kind = event.kind();
        tracing::trace!(event = kind.as_str(), "emit");
        // clone out so a listener may register others without deadlocking
        let listeners: Vec<Listener> = self
            .listeners
            .get(&kind)
            .map(|l| l.value().clone())
            .unwrap_or_default();
        for l in &listeners {
            l(&event);
        }
        self.lock_taps().retain(|t| t.send(event.clone()).is_ok());
    }

    fn lock_taps(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<ClientEvent>>> {
        self.taps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
