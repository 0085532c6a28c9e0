//! Service access point primitives delivered to entities
//!
//! Every event an entity handles arrives as a `SapMsg`: bytes from the transport,
//! timer expiries, user commands and the internal primitives exchanged between
//! sublayers of one node.

pub mod call_leg;
pub mod mmi;
pub mod rr;
pub mod sapmsg;
pub mod timer;
pub mod transport;

pub use sapmsg::{SapMsg, SapMsgInner};
