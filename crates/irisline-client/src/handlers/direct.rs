//! Direct handler: send acknowledgements and the inbox patch state machine.
//!
//! Patch ops are routed through [`ROUTES`], an ordered `(op, prefix, rule)`
//! table evaluated first-match-wins. Overlapping prefixes put the more
//! specific rule first (`.../has_seen` before other thread replaces,
//! `.../screenshot` before other visual thread replaces).

use std::sync::Arc;

use serde_json::Value;

use irisline_core::error::{PushError, Result};
use irisline_core::message::modules;
use irisline_core::Message;

use crate::dispatch::Handler;
use crate::events::{ClientEvent, EventBus, EventKind};
use crate::types::{AckAction, UnseenCount};

use super::iris::IrisState;
use super::patch::{self, PatchEvent, PatchEventOp, PatchOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Any path under the prefix.
    Any,
    Contains(&'static str),
    EndsWith(&'static str),
    /// The path is the prefix.
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    ThreadActivity,
    ThreadItemCreated,
    ThreadCreated,
    DirectStoryUpdated,
    ThreadSeen,
    ThreadItemUpdated,
    ThreadUpdated,
    UnseenCount(&'static str),
    DirectStoryAction,
    DirectStoryScreenshot,
    DirectStoryCreated,
    ThreadItemRemoved,
    ThreadNotify,
}

impl Target {
    fn kind(self) -> EventKind {
        match self {
            Target::ThreadActivity => EventKind::ThreadActivity,
            Target::ThreadItemCreated => EventKind::ThreadItemCreated,
            Target::ThreadCreated => EventKind::ThreadCreated,
            Target::DirectStoryUpdated => EventKind::DirectStoryUpdated,
            Target::ThreadSeen => EventKind::ThreadSeen,
            Target::ThreadItemUpdated => EventKind::ThreadItemUpdated,
            Target::ThreadUpdated => EventKind::ThreadUpdated,
            Target::UnseenCount(_) => EventKind::UnseenCountUpdate,
            Target::DirectStoryAction => EventKind::DirectStoryAction,
            Target::DirectStoryScreenshot => EventKind::DirectStoryScreenshot,
            Target::DirectStoryCreated => EventKind::DirectStoryCreated,
            Target::ThreadItemRemoved => EventKind::ThreadItemRemoved,
            Target::ThreadNotify => EventKind::ThreadNotify,
        }
    }
}

struct Route {
    op: PatchOp,
    prefix: &'static str,
    rule: Rule,
    target: Target,
}

const fn route(op: PatchOp, prefix: &'static str, rule: Rule, target: Target) -> Route {
    Route { op, prefix, rule, target }
}

const ROUTES: [Route; 14] = [
    route(
        PatchOp::Add,
        "/direct_v2/threads",
        Rule::Contains("activity_indicator_id"),
        Target::ThreadActivity,
    ),
    route(PatchOp::Add, "/direct_v2/threads", Rule::Any, Target::ThreadItemCreated),
    route(PatchOp::Add, "/direct_v2/inbox/threads", Rule::Any, Target::ThreadCreated),
    route(PatchOp::Add, "/direct_v2/visual_threads", Rule::Any, Target::DirectStoryUpdated),
    route(PatchOp::Replace, "/direct_v2/threads", Rule::EndsWith("has_seen"), Target::ThreadSeen),
    route(PatchOp::Replace, "/direct_v2/threads", Rule::Any, Target::ThreadItemUpdated),
    route(PatchOp::Replace, "/direct_v2/inbox/threads", Rule::Any, Target::ThreadUpdated),
    route(
        PatchOp::Replace,
        "/direct_v2/inbox/unseen_count",
        Rule::Exact,
        Target::UnseenCount("inbox"),
    ),
    route(
        PatchOp::Replace,
        "/direct_v2/visual_inbox/unseen_count",
        Rule::Exact,
        Target::UnseenCount("visual_inbox"),
    ),
    route(PatchOp::Replace, "/direct_v2/visual_action_badge", Rule::Any, Target::DirectStoryAction),
    route(
        PatchOp::Replace,
        "/direct_v2/visual_thread",
        Rule::EndsWith("screenshot"),
        Target::DirectStoryScreenshot,
    ),
    route(PatchOp::Replace, "/direct_v2/visual_thread", Rule::Any, Target::DirectStoryCreated),
    route(PatchOp::Remove, "/direct_v2", Rule::Any, Target::ThreadItemRemoved),
    route(PatchOp::Notify, "/direct_v2/threads", Rule::Any, Target::ThreadNotify),
];

fn classify(op: PatchOp, path: &str) -> Option<Target> {
    ROUTES
        .iter()
        .find(|r| {
            r.op == op
                && path.starts_with(r.prefix)
                && match r.rule {
                    Rule::Any => true,
                    Rule::Contains(s) => path.contains(s),
                    Rule::EndsWith(s) => path.ends_with(s),
                    Rule::Exact => path == r.prefix,
                }
        })
        .map(|r| r.target)
}

pub struct DirectHandler {
    iris: Arc<IrisState>,
}

impl DirectHandler {
    pub fn new(iris: Arc<IrisState>) -> Self {
        Self { iris }
    }

    fn handle_patch(&self, data: Value, events: &EventBus) -> Result<()> {
        let patch = PatchEvent::from_value(data)?;
        for op in &patch.data {
            apply(op, events)?;
        }
        if let Some(seq_id) = patch.seq_id {
            self.iris.advance(seq_id);
        }
        Ok(())
    }

    fn handle_action(&self, action: &str, data: Value, events: &EventBus) -> Result<()> {
        match action {
            "ack" => {
                if !events.has_listeners(EventKind::ClientContextAck) {
                    return Ok(());
                }
                let ack: AckAction = serde_json::from_value(data)
                    .map_err(|e| PushError::Handler(format!("malformed ack action: {e}")))?;
                events.emit(ClientEvent::ClientContextAck(ack));
                Ok(())
            }
            other => Err(PushError::Handler(format!("unsupported direct action \"{other}\""))),
        }
    }
}

impl Handler for DirectHandler {
    fn module(&self) -> &'static str {
        modules::DIRECT
    }

    fn handle(&self, msg: Message, events: &EventBus) -> Result<()> {
        let event = msg.data.get("event").and_then(Value::as_str).map(str::to_string);
        let action = msg.data.get("action").and_then(Value::as_str).map(str::to_string);
        match (event.as_deref(), action.as_deref()) {
            (Some("patch"), _) => self.handle_patch(msg.data, events),
            (Some("keepalive"), _) => Ok(()),
            (Some(other), _) => {
                Err(PushError::Handler(format!("unsupported direct event \"{other}\"")))
            }
            (None, Some(action)) => self.handle_action(action, msg.data, events),
            (None, None) => {
                Err(PushError::Handler("direct message has neither event nor action".into()))
            }
        }
    }
}

/// Apply one patch op. An unknown op or an unrouted path is always an
/// error; template matching and decoding only happen when someone listens.
fn apply(op: &PatchEventOp, events: &EventBus) -> Result<()> {
    let kind = PatchOp::parse(&op.op)?;
    let target = classify(kind, &op.path).ok_or_else(|| {
        PushError::Handler(format!("unsupported patch path {} {}", op.op, op.path))
    })?;
    if !events.has_listeners(target.kind()) {
        tracing::trace!(path = %op.path, "no listeners, patch skipped");
        return Ok(());
    }
    let path = op.path.as_str();
    let event = match target {
        Target::ThreadActivity => {
            let c = patch::ACTIVITY.require(path)?;
            ClientEvent::ThreadActivity {
                thread_id: c.get("thread_id")?,
                context: c.get("context")?,
                activity: op.decode()?,
            }
        }
        Target::ThreadItemCreated | Target::ThreadItemUpdated => {
            let c = patch::ITEM.require(path)?;
            let (thread_id, item_id, item) = (c.get("thread_id")?, c.get("item_id")?, op.decode()?);
            if target == Target::ThreadItemCreated {
                ClientEvent::ThreadItemCreated { thread_id, item_id, item }
            } else {
                ClientEvent::ThreadItemUpdated { thread_id, item_id, item }
            }
        }
        Target::ThreadCreated | Target::ThreadUpdated => {
            let c = patch::THREAD.require(path)?;
            let (thread_id, thread) = (c.get("thread_id")?, op.decode()?);
            if target == Target::ThreadCreated {
                ClientEvent::ThreadCreated { thread_id, thread }
            } else {
                ClientEvent::ThreadUpdated { thread_id, thread }
            }
        }
        Target::DirectStoryUpdated => {
            let c = patch::STORY.require(path)?;
            ClientEvent::DirectStoryUpdated {
                thread_id: c.get("thread_id")?,
                item_id: c.get("item_id")?,
                item: op.decode()?,
            }
        }
        Target::ThreadSeen => {
            let c = patch::SEEN.require(path)?;
            ClientEvent::ThreadSeen {
                thread_id: c.get("thread_id")?,
                user_id: c.get("user_id")?,
                seen: op.decode()?,
            }
        }
        Target::UnseenCount(inbox) => ClientEvent::UnseenCountUpdate {
            inbox,
            count: UnseenCount { count: unseen_count(op)?, timestamp: op.ts },
        },
        Target::DirectStoryAction => {
            let c = patch::BADGE.require(path)?;
            ClientEvent::DirectStoryAction { thread_id: c.get("thread_id")?, badge: op.decode()? }
        }
        Target::DirectStoryScreenshot => {
            let c = patch::SCREENSHOT.require(path)?;
            ClientEvent::DirectStoryScreenshot {
                thread_id: c.get("thread_id")?,
                screenshot: op.decode()?,
            }
        }
        Target::DirectStoryCreated => {
            let c = patch::VISUAL_THREAD.require(path)?;
            ClientEvent::DirectStoryCreated { thread_id: c.get("thread_id")?, thread: op.decode()? }
        }
        Target::ThreadItemRemoved => {
            let c = patch::ITEM.require(path)?;
            ClientEvent::ThreadItemRemoved {
                thread_id: c.get("thread_id")?,
                item_id: c.get("item_id")?,
            }
        }
        Target::ThreadNotify => {
            let c = patch::ITEM.require(path)?;
            ClientEvent::ThreadNotify {
                thread_id: c.get("thread_id")?,
                item_id: c.get("item_id")?,
                notify: op.decode()?,
            }
        }
    };
    events.emit(event);
    Ok(())
}

fn unseen_count(op: &PatchEventOp) -> Result<i64> {
    let text = op.value_text();
    text.trim().trim_matches('"').parse().map_err(|_| {
        PushError::Handler(format!("unseen count at {} is not an integer: {text}", op.path))
    })
}
