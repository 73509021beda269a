//! Top-level facade crate for irisline.
//!
//! Re-exports the protocol core and the push client so users can depend on a single crate.

pub mod core {
    pub use irisline_core::*;
}

pub mod client {
    pub use irisline_client::*;
}
