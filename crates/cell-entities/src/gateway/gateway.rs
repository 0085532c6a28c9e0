use cell_config::{CfgGateway, SharedConfig};
use cell_core::admission::SimpleMaxUserPolicy;
use cell_core::{
    AdmissionPurpose, AllocStage, CellRole, Imsi, NodeId, PoolCounts, PoolOwner, ResourceKind, ResourcePool, TimerRegistry,
    TxnId, unimplemented_log,
};
use cell_pdus::gtp::enums::gtp_msg_type::GtpMsgType;
use cell_pdus::gtp::pdus::create_pdp_context::{CreatePdpContextRequest, CreatePdpContextResponse};
use cell_pdus::gtp::pdus::delete_pdp_context::{DeletePdpContextRequest, DeletePdpContextResponse};
use cell_pdus::{Cause, ProtocolDiscriminator, TiField, peek};
use cell_saps::{SapMsg, SapMsgInner};

use crate::codec;
use crate::components::{TableErr, TransactionTable};
use crate::stats::{Counter, NodeStats};
use crate::{CellEntityTrait, MessageQueue};

/// A context is named by the subscriber and its NSAPI
pub type GwKey = (Imsi, u8);

#[derive(Debug, Clone)]
pub struct GwContext {
    /// SC that created the context
    pub sc: NodeId,
    pub address_index: u16,
    pub bandwidth_kbps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GwTimer {
    PdpLifetime,
}

/// Packet data gateway: terminates PDP contexts and hands out addresses
pub struct Gateway {
    config: SharedConfig,
    node: NodeId,
    base_address: u32,
    addresses: ResourcePool,
    contexts: TransactionTable<GwKey, GwContext>,
    timers: TimerRegistry<TxnId, GwTimer>,
    next_seq: u16,
    stats: NodeStats,
}

impl Gateway {
    pub fn new(config: SharedConfig, cfg: &CfgGateway) -> Self {
        let capacity = config.config().limits.max_contexts_per_gateway;
        let policy = Box::new(SimpleMaxUserPolicy { max_users: cfg.address_pool });
        Self {
            node: cfg.node,
            base_address: cfg.base_address,
            addresses: ResourcePool::new(cfg.address_pool, 0, policy),
            contexts: TransactionTable::new(capacity),
            timers: TimerRegistry::new(),
            next_seq: 0,
            stats: NodeStats::new(),
            config,
        }
    }

    pub fn num_contexts(&self) -> usize {
        self.contexts.len()
    }

    pub fn context(&self, imsi: Imsi, nsapi: u8) -> Option<&GwContext> {
        let id = self.contexts.lookup(&(imsi, nsapi))?;
        self.contexts.get(id)
    }

    /// Address of a context
    pub fn address_of(&self, ctx: &GwContext) -> u32 {
        self.base_address.wrapping_add(ctx.address_index as u32)
    }

    fn owner(id: TxnId) -> PoolOwner {
        id as PoolOwner
    }

    fn release_context(&mut self, queue: &mut MessageQueue, id: TxnId) -> Option<(GwKey, GwContext)> {
        let released = self.contexts.release(id)?;
        self.addresses.release_owner(Self::owner(id));
        self.timers.cancel_owner(queue, id);
        self.stats.inc(Counter::GatewayContextsDeleted);
        Some(released)
    }

    fn rx_create_request(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<CreatePdpContextRequest>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let mut resp = CreatePdpContextResponse {
            seq: pdu.seq,
            imsi: pdu.imsi,
            nsapi: pdu.nsapi,
            cause: Cause::NormalRelease,
            pdp_address: 0,
        };

        let key = (pdu.imsi, pdu.nsapi);
        if let Some(ctx) = self.contexts.lookup(&key).and_then(|id| self.contexts.get(id)) {
            // Retransmitted request, the context stays as it is
            tracing::debug!("create request {} for existing context {:?}", pdu.seq, key);
            resp.pdp_address = self.address_of(ctx);
            queue.send_pdu(src, TiField::NONE, &resp);
            return;
        }

        match self.create_context(queue, src, &pdu) {
            Ok(address) => {
                tracing::info!("context {} of imsi {} created, address {:#010x}", pdu.nsapi, pdu.imsi, address);
                resp.pdp_address = address;
            }
            Err(cause) => {
                tracing::info!("context {} of imsi {} refused: {}", pdu.nsapi, pdu.imsi, cause);
                resp.cause = cause;
            }
        }
        queue.send_pdu(src, TiField::NONE, &resp);
    }

    fn create_context(&mut self, queue: &mut MessageQueue, sc: NodeId, pdu: &CreatePdpContextRequest) -> Result<u32, Cause> {
        let ctx = GwContext {
            sc,
            address_index: 0,
            bandwidth_kbps: pdu.bandwidth_kbps,
        };
        let id = match self.contexts.create((pdu.imsi, pdu.nsapi), ctx) {
            Ok(id) => id,
            Err(TableErr::Exhausted) => {
                self.stats.inc(Counter::TableExhausted);
                return Err(Cause::InsufficientResources);
            }
            Err(TableErr::DuplicateKey) => return Err(Cause::MessageNotCompatibleWithState),
        };

        let index = match self.addresses.try_allocate(
            Self::owner(id),
            1,
            ResourceKind::Data,
            AllocStage::Confirmed,
            AdmissionPurpose::NewRequest,
        ) {
            Ok(indices) => indices.first().copied(),
            Err(_) => None,
        };
        let Some(index) = index else {
            self.contexts.release(id);
            self.addresses.release_owner(Self::owner(id));
            return Err(Cause::InsufficientResources);
        };
        if let Some(ctx) = self.contexts.get_mut(id) {
            ctx.address_index = index;
        }

        self.stats.inc(Counter::GatewayContextsCreated);
        if let Some(lifetime) = self.config.config().timers.pdp_lifetime {
            self.timers.set(queue, id, GwTimer::PdpLifetime, lifetime, ());
        }
        Ok(self.base_address.wrapping_add(index as u32))
    }

    fn rx_delete_request(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<DeletePdpContextRequest>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let cause = match self.contexts.lookup(&(pdu.imsi, pdu.nsapi)) {
            Some(id) => {
                self.release_context(queue, id);
                tracing::info!("context {} of imsi {} deleted: {}", pdu.nsapi, pdu.imsi, pdu.cause);
                Cause::NormalRelease
            }
            None => {
                tracing::debug!("delete of unknown context {} of imsi {}", pdu.nsapi, pdu.imsi);
                Cause::MessageNotCompatibleWithState
            }
        };
        let resp = DeletePdpContextResponse {
            seq: pdu.seq,
            imsi: pdu.imsi,
            nsapi: pdu.nsapi,
            cause,
        };
        queue.send_pdu(src, TiField::NONE, &resp);
    }

    /// Context reached its lifetime, tell the SC that owns it
    fn on_pdp_lifetime(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(((imsi, nsapi), ctx)) = self.release_context(queue, id) else {
            return;
        };
        tracing::info!("context {} of imsi {} expired", nsapi, imsi);
        self.next_seq = self.next_seq.wrapping_add(1);
        let req = DeletePdpContextRequest {
            seq: self.next_seq,
            imsi,
            nsapi,
            cause: Cause::RegularDeactivation,
        };
        queue.send_pdu(ctx.sc, TiField::NONE, &req);
    }

    fn rx_transport(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: Vec<u8>) {
        let (header, msg_type) = match peek(&bytes) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("Failed parsing header from {}: {:?}", src, e);
                self.stats.inc(Counter::DroppedMessages);
                return;
            }
        };
        if header.pd != ProtocolDiscriminator::Gtp {
            tracing::warn!("unexpected {} message from {}", header.pd, src);
            self.stats.inc(Counter::DroppedMessages);
            return;
        }
        match GtpMsgType::try_from(msg_type) {
            Ok(GtpMsgType::CreatePdpContextRequest) => self.rx_create_request(queue, src, &bytes),
            Ok(GtpMsgType::DeletePdpContextRequest) => self.rx_delete_request(queue, src, &bytes),
            Ok(GtpMsgType::DeletePdpContextResponse) => {
                if codec::parse::<DeletePdpContextResponse>(&bytes).is_none() {
                    self.stats.inc(Counter::DroppedMessages);
                }
            }
            _ => {
                tracing::warn!("unexpected GTP message type {:#04x} from {}", msg_type, src);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }
}

impl CellEntityTrait for Gateway {
    fn node(&self) -> NodeId {
        self.node
    }

    fn role(&self) -> CellRole {
        CellRole::Gateway
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_prim: {:?} {} from {}", message.get_sap(), message.kind(), message.get_source());
        let src = message.get_source();
        match message.msg {
            SapMsgInner::TransportUnitdataInd(prim) => self.rx_transport(queue, src, prim.bytes),
            SapMsgInner::TimerExpiryInd(prim) => {
                let Some(expired) = self.timers.on_expiry(prim.handle) else {
                    return;
                };
                self.stats.inc(Counter::TimerExpiries);
                match expired.timer {
                    GwTimer::PdpLifetime => self.on_pdp_lifetime(queue, expired.owner),
                }
            }
            other => unimplemented_log!("primitive {:?}", other),
        }
    }

    fn stats(&self) -> &NodeStats {
        &self.stats
    }

    fn pool_counts(&self) -> Option<PoolCounts> {
        Some(self.addresses.counts())
    }
}
