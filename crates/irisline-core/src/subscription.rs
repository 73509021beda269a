//! Realtime subscriptions and the per-topic set re-sent on every connect.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::command::validate::{self, Id};
use crate::command::UpdateSubscriptions;
use crate::error::{PushError, Result};
use crate::protocol::topics;

/// GraphQL subscription query ids. Also the discriminators of inbound
/// realtime envelopes.
pub mod queries {
    pub const APP_PRESENCE: &str = "17846944882223835";
    pub const ZERO_PROVISION: &str = "17913953740109069";
    pub const DIRECT_TYPING: &str = "17867973967082385";
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subscription {
    /// `1/graphqlsubscriptions/{query}/{"input_data":{..}}` on `/ig_realtime_sub`.
    GraphQl {
        id: String,
        query: &'static str,
        input: Map<String, Value>,
    },
    /// Plain topic string on `/pubsub`.
    Skywalker { id: String, topic: String },
}

impl Subscription {
    pub fn graphql(id: impl Into<String>, query: &'static str, input: Map<String, Value>) -> Self {
        Subscription::GraphQl { id: id.into(), query, input }
    }

    pub fn app_presence(client_subscription_id: Option<&str>) -> Result<Self> {
        let mut input = Map::new();
        input.insert(
            "client_subscription_id".into(),
            Value::String(validate::client_context(client_subscription_id)?),
        );
        Ok(Self::graphql("app_presence", queries::APP_PRESENCE, input))
    }

    pub fn zero_provision(device_id: &str, client_subscription_id: Option<&str>) -> Result<Self> {
        if device_id.is_empty() {
            return Err(PushError::InvalidArgument("device id must not be empty".into()));
        }
        let mut input = Map::new();
        input.insert(
            "client_subscription_id".into(),
            Value::String(validate::client_context(client_subscription_id)?),
        );
        input.insert("device_id".into(), Value::String(device_id.to_string()));
        Ok(Self::graphql("zero_provision", queries::ZERO_PROVISION, input))
    }

    pub fn direct_typing(user_id: Id<'_>) -> Result<Self> {
        let user_id = validate::numeric_id("user identifier", user_id)?;
        let mut input = Map::new();
        input.insert("user_id".into(), Value::String(user_id));
        Ok(Self::graphql("direct_typing", queries::DIRECT_TYPING, input))
    }

    pub fn skywalker_direct(user_id: Id<'_>) -> Result<Self> {
        let user_id = validate::numeric_id("user identifier", user_id)?;
        Ok(Subscription::Skywalker { id: "direct".into(), topic: format!("ig/u/v1/{user_id}") })
    }

    pub fn skywalker_live(user_id: Id<'_>) -> Result<Self> {
        let user_id = validate::numeric_id("user identifier", user_id)?;
        Ok(Subscription::Skywalker {
            id: "live".into(),
            topic: format!("ig/live_notification_subscribe/{user_id}"),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Subscription::GraphQl { id, .. } | Subscription::Skywalker { id, .. } => id,
        }
    }

    /// Broker topic the subscription update is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            Subscription::GraphQl { .. } => topics::REALTIME_SUB,
            Subscription::Skywalker { .. } => topics::PUBSUB,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Subscription::GraphQl { query, input, .. } => {
                format!("1/graphqlsubscriptions/{query}/{}", json!({ "input_data": input }))
            }
            Subscription::Skywalker { topic, .. } => topic.clone(),
        }
    }
}

#[derive(Default)]
struct Delta {
    sub: Vec<String>,
    unsub: Vec<String>,
}

/// Active subscriptions per broker topic, keyed by subscription id.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSet {
    by_topic: BTreeMap<&'static str, BTreeMap<String, Subscription>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_topic.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, topic: &str, id: &str) -> Option<&Subscription> {
        self.by_topic.get(topic).and_then(|m| m.get(id))
    }

    /// Insert or overwrite by id. An overwrite with a different rendering
    /// unsubscribes the old one.
    pub fn add(
        &mut self,
        subs: impl IntoIterator<Item = Subscription>,
    ) -> Vec<UpdateSubscriptions> {
        let mut deltas: BTreeMap<&'static str, Delta> = BTreeMap::new();
        for sub in subs {
            let topic = sub.topic();
            let rendered = sub.render();
            let entries = self.by_topic.entry(topic).or_default();
            let previous = entries.insert(sub.id().to_string(), sub);
            let delta = deltas.entry(topic).or_default();
            match previous.map(|p| p.render()) {
                Some(old) if old == rendered => {}
                Some(old) => {
                    delta.unsub.push(old);
                    delta.sub.push(rendered);
                }
                None => delta.sub.push(rendered),
            }
        }
        into_commands(deltas)
    }

    /// Unsubscribe. The stored rendering wins over the given one when both exist.
    pub fn remove(
        &mut self,
        subs: impl IntoIterator<Item = Subscription>,
    ) -> Vec<UpdateSubscriptions> {
        let mut deltas: BTreeMap<&'static str, Delta> = BTreeMap::new();
        for sub in subs {
            let topic = sub.topic();
            let stored = self.by_topic.get_mut(topic).and_then(|m| m.remove(sub.id()));
            let rendered = stored.unwrap_or(sub).render();
            deltas.entry(topic).or_default().unsub.push(rendered);
        }
        self.by_topic.retain(|_, m| !m.is_empty());
        into_commands(deltas)
    }

    /// Make `subs` the complete set for every topic they mention.
    pub fn replace(
        &mut self,
        subs: impl IntoIterator<Item = Subscription>,
    ) -> Vec<UpdateSubscriptions> {
        let mut incoming: BTreeMap<&'static str, BTreeMap<String, Subscription>> = BTreeMap::new();
        for sub in subs {
            incoming.entry(sub.topic()).or_default().insert(sub.id().to_string(), sub);
        }
        let mut deltas: BTreeMap<&'static str, Delta> = BTreeMap::new();
        for (topic, next) in incoming {
            let previous = self.by_topic.insert(topic, next).unwrap_or_default();
            let current = self.by_topic.get(topic);
            let delta = deltas.entry(topic).or_default();
            for (id, old) in &previous {
                let kept = current.and_then(|m| m.get(id)).map(Subscription::render);
                if kept.as_deref() != Some(old.render().as_str()) {
                    delta.unsub.push(old.render());
                }
            }
            for (id, sub) in current.into_iter().flatten() {
                let was = previous.get(id).map(Subscription::render);
                let now = sub.render();
                if was.as_deref() != Some(now.as_str()) {
                    delta.sub.push(now);
                }
            }
        }
        self.by_topic.retain(|_, m| !m.is_empty());
        into_commands(deltas)
    }

    /// Full resubscribe, one command per topic.
    pub fn snapshot(&self) -> Vec<UpdateSubscriptions> {
        self.by_topic
            .iter()
            .filter_map(|(topic, entries)| {
                let sub = entries.values().map(Subscription::render).collect();
                UpdateSubscriptions::new(*topic, sub, Vec::new()).ok()
            })
            .collect()
    }
}

fn into_commands(deltas: BTreeMap<&'static str, Delta>) -> Vec<UpdateSubscriptions> {
    deltas
        .into_iter()
        .filter_map(|(topic, d)| UpdateSubscriptions::new(topic, d.sub, d.unsub).ok())
        .collect()
}
