/// Address of a node (MS, BS, SC, Gateway or HLR) as seen by the transport
pub type NodeId = u32;

/// Permanent subscriber identity, 15 decimal digits fit in 50 bits
pub type Imsi = u64;

/// Identifier of a radio cell (sector). A BS may serve several
pub type CellId = u16;

/// Location area code
pub type Lac = u16;

/// Slot index in a transaction table. Local to the owning node
pub type TxnId = u16;

/// Reference for a dedicated radio channel of one application, chosen by the MS.
/// Unique per MS while in use, carried on the wire as one octet.
pub type ChanRef = u8;

/// Number of significant bits in an IMSI field on the wire
pub const IMSI_BITS: usize = 50;

/// Returns true if the value fits the IMSI wire field
pub fn imsi_is_valid(imsi: Imsi) -> bool {
    imsi < (1u64 << IMSI_BITS)
}
