/// Bytes received from the transport. The sender is in `SapMsg::src`
#[derive(Debug, Clone)]
pub struct TransportUnitdataInd {
    pub bytes: Vec<u8>,
}
