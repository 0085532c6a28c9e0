pub mod codec;
pub mod components;
pub mod entity_trait;
pub mod messagerouter;
pub mod stats;
pub mod topology;

pub mod bs;
pub mod gateway;
pub mod hlr;
pub mod ms;
pub mod sc;

// Re-export commonly used items from router
pub use entity_trait::CellEntityTrait;
pub use messagerouter::{MessageQueue, MessageRouter};
pub use stats::{Counter, NodeStats};
