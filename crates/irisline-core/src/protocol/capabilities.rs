//! Capability bitmask advertised in the connect payload.
//!
//! Bit positions are part of the broker contract.

/// One optional protocol behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    AcknowledgedDelivery = 0,
    ProcessingLastActivePresenceInfo = 1,
    ExactKeepalive = 2,
    RequiresJsonUnicodeEscapes = 3,
    DeltaSentMessageEnabled = 4,
    UseEnumTopic = 5,
    SuppressGetdiffInConnect = 6,
    UseThriftForInbox = 7,
    UseSendPingresp = 8,
    RequireReplayProtection = 9,
    DataSavingMode = 10,
    TypingOffWhenSendingMessage = 11,
}

impl Capability {
    pub fn bit(self) -> u64 {
        1 << (self as u8)
    }
}

/// Combined capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities(u64);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);

    /// The set a stock mobile client advertises (439).
    pub const DEFAULT: Capabilities = Capabilities(
        (1 << 0) | (1 << 1) | (1 << 2) | (1 << 4) | (1 << 5) | (1 << 7) | (1 << 8),
    );

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn with(self, flag: Capability) -> Self {
        Self(self.0 | flag.bit())
    }

    pub fn without(self, flag: Capability) -> Self {
        Self(self.0 & !flag.bit())
    }

    pub fn contains(self, flag: Capability) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mask_matches_broker_expectation() {
        let built = Capabilities::NONE
            .with(Capability::AcknowledgedDelivery)
            .with(Capability::ProcessingLastActivePresenceInfo)
            .with(Capability::ExactKeepalive)
            .with(Capability::DeltaSentMessageEnabled)
            .with(Capability::UseEnumTopic)
            .with(Capability::UseThriftForInbox)
            .with(Capability::UseSendPingresp);
        assert_eq!(built, Capabilities::DEFAULT);
        assert_eq!(Capabilities::DEFAULT.bits(), 439);
    }

    #[test]
    fn flags_toggle() {
        let caps = Capabilities::DEFAULT.without(Capability::UseEnumTopic);
        assert!(!caps.contains(Capability::UseEnumTopic));
        assert!(caps.contains(Capability::AcknowledgedDelivery));
        assert_eq!(caps.bits(), 439 - 32);
        assert!(caps.with(Capability::DataSavingMode).contains(Capability::DataSavingMode));
    }
}
