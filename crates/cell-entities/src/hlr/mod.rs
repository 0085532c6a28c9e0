pub mod hlr;

pub use hlr::{Hlr, HlrRecord};
