/// Delivery guarantee requested for an outbound publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QosLevel {
    /// No acknowledgement expected.
    #[default]
    FireAndForget,
    /// Broker acknowledges receipt.
    AcknowledgedDelivery,
}

impl QosLevel {
    /// Numeric level as carried in the packet header.
    pub fn as_u8(self) -> u8 {
        match self {
            QosLevel::FireAndForget => 0,
            QosLevel::AcknowledgedDelivery => 1,
        }
    }

    /// Parse the header level. Levels above 1 are never negotiated by this client.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(QosLevel::FireAndForget),
            1 => Some(QosLevel::AcknowledgedDelivery),
            _ => None,
        }
    }
}
