//! Decode helpers shared by all roles

use cell_pdus::{L3Message, TiField, decode};

/// Decodes a message of type M, logging it on success and dropping it with a warning otherwise
pub fn parse<M: L3Message>(bytes: &[u8]) -> Option<(TiField, M)> {
    match decode::<M>(bytes) {
        Ok((ti, pdu)) => {
            tracing::debug!("<- {:?}", pdu);
            Some((ti, pdu))
        }
        Err(e) => {
            tracing::warn!("Failed parsing {}: {:?} {:02x?}", short_type_name::<M>(), e, bytes);
            None
        }
    }
}

fn short_type_name<M>() -> &'static str {
    let full = std::any::type_name::<M>();
    full.rsplit("::").next().unwrap_or(full)
}
