//! Outbound command builders.
//!
//! Every command validates all of its identifiers in its constructor, so a
//! command that exists is always publishable. Serialization goes through
//! [`PreparedCommand`], which fixes topic, QoS and body once.

mod direct;
mod fields;
mod iris;
mod subscriptions;
pub mod validate;

pub use direct::{DirectCommand, ItemOptions, ReactionStatus};
pub use fields::{field_weight, CommandFields};
pub use iris::{IrisSubscribe, INVALID_SEQUENCE_ID};
pub use subscriptions::{java_string_hash, UpdateSubscriptions};

use crate::error::Result;
use crate::qos::QosLevel;

/// Publishable command.
pub trait Command {
    /// Topic path (not the numeric id).
    fn topic(&self) -> &'static str;
    fn qos(&self) -> QosLevel;
    /// JSON body.
    fn to_json(&self) -> Result<String>;

    /// Serialize once for publishing.
    fn prepare(&self) -> Result<PreparedCommand> {
        Ok(PreparedCommand {
            topic: self.topic(),
            qos: self.qos(),
            payload: self.to_json()?,
        })
    }
}

/// Serialized command ready for the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub topic: &'static str,
    pub qos: QosLevel,
    pub payload: String,
}
