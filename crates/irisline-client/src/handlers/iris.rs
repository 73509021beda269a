use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use irisline_core::command::{IrisSubscribe, INVALID_SEQUENCE_ID};
use irisline_core::error::{PushError, Result};
use irisline_core::message::modules;
use irisline_core::Message;

use crate::dispatch::Handler;
use crate::events::{ClientEvent, EventBus, EventKind};
use crate::types::IrisSubscribeAck;

/// Message-sync cursor shared by the iris and direct handlers and the
/// session loop. `INVALID_SEQUENCE_ID` means unknown.
#[derive(Debug)]
pub struct IrisState {
    seq_id: AtomicI64,
    snapshot_at_ms: AtomicI64,
}

impl Default for IrisState {
    fn default() -> Self {
        Self {
            seq_id: AtomicI64::new(INVALID_SEQUENCE_ID),
            snapshot_at_ms: AtomicI64::new(INVALID_SEQUENCE_ID),
        }
    }
}

impl IrisState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seq_id(&self) -> Option<i64> {
        match self.seq_id.load(Ordering::Acquire) {
            INVALID_SEQUENCE_ID => None,
            v => Some(v),
        }
    }

    pub fn snapshot_at_ms(&self) -> Option<i64> {
        match self.snapshot_at_ms.load(Ordering::Acquire) {
            INVALID_SEQUENCE_ID => None,
            v => Some(v),
        }
    }

    /// Set the cursor the application wants to resume from.
    pub fn record(&self, seq_id: i64, snapshot_at_ms: Option<i64>) {
        self.seq_id.store(seq_id, Ordering::Release);
        self.snapshot_at_ms
            .store(snapshot_at_ms.unwrap_or(INVALID_SEQUENCE_ID), Ordering::Release);
    }

    /// Move the cursor forward; older ids are ignored.
    pub fn advance(&self, seq_id: i64) {
        self.seq_id.fetch_max(seq_id, Ordering::AcqRel);
    }

    pub fn clear(&self) {
        self.seq_id.store(INVALID_SEQUENCE_ID, Ordering::Release);
        self.snapshot_at_ms.store(INVALID_SEQUENCE_ID, Ordering::Release);
    }

    /// Resubscribe command for the current cursor, if one is known.
    pub fn resubscribe(&self) -> Option<IrisSubscribe> {
        let seq_id = self.seq_id()?;
        IrisSubscribe::new(seq_id, self.snapshot_at_ms()).ok()
    }
}

pub struct IrisHandler {
    state: Arc<IrisState>,
}

impl IrisHandler {
    pub fn new(state: Arc<IrisState>) -> Self {
        Self { state }
    }
}

impl Handler for IrisHandler {
    fn module(&self) -> &'static str {
        modules::IRIS
    }

    fn handle(&self, msg: Message, events: &EventBus) -> Result<()> {
        let ack: IrisSubscribeAck = serde_json::from_value(msg.data)
            .map_err(|e| PushError::Handler(format!("malformed iris acknowledgement: {e}")))?;
        if !ack.succeeded {
            return Err(PushError::Handler(format!(
                "Iris subscription failed ({}): {}",
                ack.error_type.as_deref().unwrap_or("unknown"),
                ack.error_message.as_deref().unwrap_or("no message"),
            )));
        }
        if let Some(seq_id) = ack.seq_id {
            self.state.advance(seq_id);
        }
        if events.has_listeners(EventKind::IrisSubscribed) {
            events.emit(ClientEvent::IrisSubscribed(ack));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn state_starts_unknown_and_only_advances() {
        let state = IrisState::new();
        assert_eq!(state.seq_id(), None);
        assert!(state.resubscribe().is_none());

        state.record(10, Some(99));
        state.advance(7);
        assert_eq!(state.seq_id(), Some(10));
        state.advance(12);
        assert_eq!(state.resubscribe().map(|c| c.seq_id()), Some(12));
        assert_eq!(state.snapshot_at_ms(), Some(99));

        state.clear();
        assert_eq!(state.seq_id(), None);
    }

    #[test]
    fn ack_updates_cursor_even_without_listeners() {
        let state = Arc::new(IrisState::new());
        let handler = IrisHandler::new(state.clone());
        let bus = EventBus::new();
        let msg = Message::new(modules::IRIS, json!({"succeeded": true, "seq_id": 42}));
        assert!(handler.handle(msg, &bus).is_ok());
        assert_eq!(state.seq_id(), Some(42));
    }

    #[test]
    fn failure_carries_server_text() {
        let handler = IrisHandler::new(Arc::new(IrisState::new()));
        let bus = EventBus::new();
        let msg = Message::new(
            modules::IRIS,
            json!({"succeeded": false, "error_type": 1, "error_message": "Queue Overflow"}),
        );
        let err = handler.handle(msg, &bus).err();
        assert!(err.as_ref().map(|e| e.is_iris_queue_error()).unwrap_or(false));
        assert_eq!(
            err.map(|e| e.to_string()),
            Some("handler error: Iris subscription failed (1): Queue Overflow".into())
        );
    }
}
