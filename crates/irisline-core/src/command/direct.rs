use crate::error::{PushError, Result};
use crate::protocol::topics;
use crate::qos::QosLevel;

use super::fields::CommandFields;
use super::validate::{self, Id};
use super::Command;

const ACTION_SEND_ITEM: &str = "send_item";
const ACTION_MARK_SEEN: &str = "mark_seen";
const ACTION_INDICATE_ACTIVITY: &str = "indicate_activity";

/// Optional fields shared by the share-style items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemOptions<'a> {
    /// Idempotency token; generated when absent.
    pub client_context: Option<&'a str>,
    /// Caption sent with the shared item. Empty is allowed.
    pub text: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionStatus {
    Created,
    Deleted,
}

impl ReactionStatus {
    fn as_str(self) -> &'static str {
        match self {
            ReactionStatus::Created => "created",
            ReactionStatus::Deleted => "deleted",
        }
    }
}

/// Direct-message action published on the send-message topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectCommand {
    fields: CommandFields,
}

impl DirectCommand {
    pub fn send_text(thread_id: Id<'_>, text: &str, client_context: Option<&str>) -> Result<Self> {
        if text.is_empty() {
            return Err(PushError::InvalidArgument("message text must not be empty".into()));
        }
        let opts = ItemOptions { client_context, text: Some(text) };
        Self::send_item(thread_id, "text", &opts, |_| {})
    }

    pub fn send_like(thread_id: Id<'_>, client_context: Option<&str>) -> Result<Self> {
        let opts = ItemOptions { client_context, text: None };
        Self::send_item(thread_id, "like", &opts, |_| {})
    }

    pub fn send_reaction(
        thread_id: Id<'_>,
        item_id: Id<'_>,
        status: ReactionStatus,
        client_context: Option<&str>,
    ) -> Result<Self> {
        let item_id = validate::numeric_id("thread item identifier", item_id)?;
        let opts = ItemOptions { client_context, text: None };
        Self::send_item(thread_id, "reaction", &opts, |f| {
            f.insert("item_id", item_id);
            f.insert("reaction_type", "like");
            f.insert("reaction_status", status.as_str());
            f.insert("node_type", "item");
        })
    }

    pub fn send_post(thread_id: Id<'_>, media_id: &str, opts: &ItemOptions<'_>) -> Result<Self> {
        let media_id = validate::media_id("media identifier", media_id)?;
        Self::send_item(thread_id, "media_share", opts, |f| f.insert("media_id", media_id))
    }

    pub fn send_story(thread_id: Id<'_>, story_id: &str, opts: &ItemOptions<'_>) -> Result<Self> {
        let story_id = validate::media_id("story identifier", story_id)?;
        Self::send_item(thread_id, "story_share", opts, |f| f.insert("item_id", story_id))
    }

    pub fn send_profile(
        thread_id: Id<'_>,
        user_id: Id<'_>,
        opts: &ItemOptions<'_>,
    ) -> Result<Self> {
        let user_id = validate::numeric_id("user identifier", user_id)?;
        Self::send_item(thread_id, "profile", opts, |f| f.insert("profile_user_id", user_id))
    }

    pub fn send_location(
        thread_id: Id<'_>,
        location_id: Id<'_>,
        opts: &ItemOptions<'_>,
    ) -> Result<Self> {
        let venue_id = validate::numeric_id("location identifier", location_id)?;
        Self::send_item(thread_id, "location", opts, |f| f.insert("venue_id", venue_id))
    }

    pub fn send_hashtag(thread_id: Id<'_>, hashtag: &str, opts: &ItemOptions<'_>) -> Result<Self> {
        let hashtag = validate::hashtag(hashtag)?;
        Self::send_item(thread_id, "hashtag", opts, |f| f.insert("hashtag", hashtag))
    }

    pub fn mark_seen(thread_id: Id<'_>, item_id: Id<'_>) -> Result<Self> {
        let thread_id = validate::numeric_id("thread identifier", thread_id)?;
        let item_id = validate::numeric_id("thread item identifier", item_id)?;
        let mut fields = CommandFields::new();
        fields.insert("thread_id", thread_id);
        fields.insert("action", ACTION_MARK_SEEN);
        fields.insert("item_id", item_id);
        Ok(Self { fields })
    }

    pub fn indicate_activity(
        thread_id: Id<'_>,
        active: bool,
        client_context: Option<&str>,
    ) -> Result<Self> {
        let thread_id = validate::numeric_id("thread identifier", thread_id)?;
        let client_context = validate::client_context(client_context)?;
        let mut fields = CommandFields::new();
        fields.insert("thread_id", thread_id);
        fields.insert("action", ACTION_INDICATE_ACTIVITY);
        fields.insert("client_context", client_context);
        fields.insert("activity_status", if active { "1" } else { "0" });
        Ok(Self { fields })
    }

    /// Validates the shared fields before `extra` adds the item-specific ones.
    fn send_item(
        thread_id: Id<'_>,
        item_type: &'static str,
        opts: &ItemOptions<'_>,
        extra: impl FnOnce(&mut CommandFields),
    ) -> Result<Self> {
        let thread_id = validate::numeric_id("thread identifier", thread_id)?;
        let client_context = validate::client_context(opts.client_context)?;

        let mut fields = CommandFields::new();
        fields.insert("thread_id", thread_id);
        fields.insert("action", ACTION_SEND_ITEM);
        fields.insert("item_type", item_type);
        fields.insert("client_context", client_context);
        if let Some(text) = opts.text {
            fields.insert("text", text);
        }
        extra(&mut fields);
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &CommandFields {
        &self.fields
    }

    pub fn action(&self) -> Option<&str> {
        self.fields.get("action")
    }

    pub fn client_context(&self) -> Option<&str> {
        self.fields.get("client_context")
    }
}

impl Command for DirectCommand {
    fn topic(&self) -> &'static str {
        topics::SEND_MESSAGE
    }

    fn qos(&self) -> QosLevel {
        QosLevel::FireAndForget
    }

    fn to_json(&self) -> Result<String> {
        self.fields.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: &str = "5b0f6f7c-2d7a-4a3e-9a52-9fb5d8e2c8a1";

    fn json(cmd: Result<DirectCommand>) -> String {
        cmd.and_then(|c| c.to_json()).unwrap_or_default()
    }

    #[test]
    fn send_text_wire_shape() {
        let out = json(DirectCommand::send_text("123".into(), "hi", Some(CTX)));
        assert_eq!(
            out,
            format!(
                concat!(
                    r#"{{"thread_id":"123","item_type":"text","text":"hi","#,
                    r#""client_context":"{}","action":"send_item"}}"#,
                ),
                CTX
            )
        );
    }

    #[test]
    fn send_text_rejects_empty_body_and_bad_ids() {
        assert!(DirectCommand::send_text("123".into(), "", Some(CTX)).is_err());
        assert!(DirectCommand::send_text("abc".into(), "hi", Some(CTX)).is_err());
        assert!(DirectCommand::send_text(Id::Int(-1), "hi", Some(CTX)).is_err());
        assert!(DirectCommand::send_text("1".into(), "hi", Some("nope")).is_err());
    }

    #[test]
    fn native_and_string_ids_serialize_the_same() {
        let a = json(DirectCommand::send_like(Id::Int(42), Some(CTX)));
        let b = json(DirectCommand::send_like("42".into(), Some(CTX)));
        assert_eq!(a, b);
    }

    #[test]
    fn reaction_field_order() {
        let status = ReactionStatus::Deleted;
        let out = json(DirectCommand::send_reaction("1".into(), "2".into(), status, Some(CTX)));
        assert_eq!(
            out,
            format!(
                concat!(
                    r#"{{"thread_id":"1","item_type":"reaction","client_context":"{}","#,
                    r#""reaction_type":"like","reaction_status":"deleted","item_id":"2","#,
                    r#""node_type":"item","action":"send_item"}}"#,
                ),
                CTX
            )
        );
    }

    #[test]
    fn share_items_validate_their_ids() {
        let opts = ItemOptions { client_context: Some(CTX), text: Some("") };
        assert!(DirectCommand::send_post("1".into(), "abc_def", &opts).is_err());
        let post = json(DirectCommand::send_post("1".into(), "123_456", &opts));
        assert!(post.ends_with(r#""action":"send_item","media_id":"123_456"}"#), "{post}");
        assert!(post.contains(r#""text":"""#));

        assert!(DirectCommand::send_story("1".into(), "x", &opts).is_err());
        assert!(DirectCommand::send_profile("1".into(), "u1".into(), &opts).is_err());
        assert!(DirectCommand::send_location("1".into(), "-5".into(), &opts).is_err());
        assert!(DirectCommand::send_hashtag("1".into(), "#", &opts).is_err());

        let tag = json(DirectCommand::send_hashtag("1".into(), " #Rust", &opts));
        assert!(tag.contains(r#""item_type":"hashtag""#));
        assert!(tag.ends_with(r#""hashtag":"Rust"}"#), "{tag}");
    }

    #[test]
    fn mark_seen_has_no_client_context() {
        let cmd = DirectCommand::mark_seen("1".into(), "99".into());
        let out = json(cmd);
        assert_eq!(out, r#"{"thread_id":"1","item_id":"99","action":"mark_seen"}"#);
        assert!(DirectCommand::mark_seen("1".into(), "x".into()).is_err());
    }

    #[test]
    fn indicate_activity_shape() {
        let out = json(DirectCommand::indicate_activity("7".into(), true, Some(CTX)));
        assert_eq!(
            out,
            format!(
                concat!(
                    r#"{{"thread_id":"7","client_context":"{}","#,
                    r#""activity_status":"1","action":"indicate_activity"}}"#,
                ),
                CTX
            )
        );
    }

    #[test]
    fn direct_commands_are_fire_and_forget_on_send_topic() {
        let cmd = DirectCommand::send_like("1".into(), None);
        let prepared = cmd.and_then(|c| c.prepare()).ok();
        assert_eq!(prepared.as_ref().map(|p| p.topic), Some("/ig_send_message"));
        assert_eq!(prepared.map(|p| p.qos), Some(QosLevel::FireAndForget));
    }
}
