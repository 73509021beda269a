//! Protocol modules (topic table, capabilities, compact fields, packets).
//!
//! All decoders are panic-free: malformed input is reported as `PushError`
//! (or, for the field reader, ends the walk) instead of panicking or indexing
//! raw buffers.

pub mod body;
pub mod capabilities;
pub mod compress;
pub mod fields;
pub mod packet;
pub mod topics;
