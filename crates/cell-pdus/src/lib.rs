//! Layer-3 message codecs
//!
//! Every message starts with a one-octet header carrying the protocol
//! discriminator and transaction identifier, followed by a message type octet
//! and a fixed-layout body. Counted groups carry a one-octet count, relayed
//! payloads a one-octet length.

pub mod common;
pub mod header;

pub mod bssmap;
pub mod cc;
pub mod gtp;
pub mod map;
pub mod mm;
pub mod rr;
pub mod sm;

pub use common::enums::cause::Cause;
pub use common::enums::protocol_discriminator::ProtocolDiscriminator;
pub use header::{L3Header, L3Message, TiField, decode, encode, peek};
