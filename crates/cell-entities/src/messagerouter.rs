use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Duration;

use cell_config::SharedConfig;
use cell_core::{CellRole, NodeId, Sap, SimTime, TimerHandle, TimerScheduler, debug};
use cell_pdus::{L3Message, TiField, encode};
use cell_saps::mmi::MmiCmd;
use cell_saps::timer::TimerExpiryInd;
use cell_saps::transport::TransportUnitdataInd;
use cell_saps::{SapMsg, SapMsgInner};

use crate::CellEntityTrait;
use crate::stats::{NodeReport, RouterStats, StatsReport};

/// Collects everything one entity produces while handling one event.
/// The router turns the contents into future events once the handler returns.
pub struct MessageQueue {
    node: NodeId,
    now: SimTime,
    sends: Vec<(NodeId, Vec<u8>)>,
    locals: Vec<(Sap, SapMsgInner)>,
    scheduled: Vec<(TimerHandle, Duration)>,
    cancelled: Vec<TimerHandle>,
}

impl MessageQueue {
    pub fn new(node: NodeId, now: SimTime) -> Self {
        Self {
            node,
            now,
            sends: Vec::new(),
            locals: Vec::new(),
            scheduled: Vec::new(),
            cancelled: Vec::new(),
        }
    }

    /// Node whose event is being handled
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Hands encoded bytes to the transport
    pub fn send(&mut self, dest: NodeId, bytes: Vec<u8>) {
        self.sends.push((dest, bytes));
    }

    /// Encodes and sends a message. Encoding failures are logged and the message is dropped.
    pub fn send_pdu<M: L3Message>(&mut self, dest: NodeId, ti: TiField, pdu: &M) -> bool {
        match encode(ti, pdu) {
            Ok(bytes) => {
                tracing::debug!("-> {} {:?}", dest, pdu);
                self.send(dest, bytes);
                true
            }
            Err(e) => {
                tracing::warn!("Failed encoding {}: {:?}", pdu, e);
                false
            }
        }
    }

    /// Queues a primitive for this same node. It is delivered after the current
    /// event, as a separate dispatch.
    pub fn push_local(&mut self, sap: Sap, msg: SapMsgInner) {
        self.locals.push((sap, msg));
    }

    pub fn num_sent(&self) -> usize {
        self.sends.len()
    }

    /// Removes and returns the bytes sent so far, for inspection in tests
    pub fn take_sent(&mut self) -> Vec<(NodeId, Vec<u8>)> {
        std::mem::take(&mut self.sends)
    }

    pub fn take_locals(&mut self) -> Vec<(Sap, SapMsgInner)> {
        std::mem::take(&mut self.locals)
    }

    pub fn scheduled_timers(&self) -> &[(TimerHandle, Duration)] {
        &self.scheduled
    }
}

impl TimerScheduler for MessageQueue {
    fn schedule_timer(&mut self, handle: TimerHandle, delay: Duration) {
        self.scheduled.push((handle, delay));
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.cancelled.push(handle);
    }
}

struct ScheduledEvent {
    time: SimTime,
    seq: u64,
    msg: SapMsg,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    /// Reversed, so the max-heap pops the earliest event first. Ties keep submission order.
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.cmp(&self.time).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Discrete-event core: owns all entities, delivers one event at a time in
/// simulated-time order and models the transport between nodes.
pub struct MessageRouter {
    config: SharedConfig,
    entities: HashMap<NodeId, Box<dyn CellEntityTrait>>,
    roles: HashMap<NodeId, CellRole>,
    events: BinaryHeap<ScheduledEvent>,
    /// Timer expiries still in the heap that must not be delivered
    cancelled: HashSet<(NodeId, TimerHandle)>,
    next_seq: u64,
    now: SimTime,
    stats: RouterStats,
}

impl MessageRouter {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            entities: HashMap::new(),
            roles: HashMap::new(),
            events: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_seq: 0,
            now: SimTime::ZERO,
            stats: RouterStats::default(),
        }
    }

    pub fn register_entity(&mut self, entity: Box<dyn CellEntityTrait>) {
        let node = entity.node();
        let role = entity.role();
        tracing::debug!("register_entity {} {}", role, node);
        self.roles.insert(node, role);
        if self.entities.insert(node, entity).is_some() {
            tracing::warn!("register_entity: node {} registered twice, previous entity replaced", node);
        }
    }

    /// Returns a mut ref to the entity registered for `node`
    pub fn get_entity(&mut self, node: NodeId) -> Option<&mut dyn CellEntityTrait> {
        self.entities.get_mut(&node).map(|entity| entity.as_mut())
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn get_msgqueue_len(&self) -> usize {
        self.events.len()
    }

    /// Queues an event. Events in the past are delivered at the current time.
    pub fn submit_message(&mut self, mut message: SapMsg) {
        if message.time < self.now {
            message.time = self.now;
        }
        tracing::debug!(
            "submit_message {:?} {}: {} -> {} at {}",
            message.get_sap(),
            message.kind(),
            message.get_source(),
            message.get_dest(),
            message.time
        );
        self.push_event(message);
    }

    /// Queues a user command for `node` at time `at`
    pub fn submit_mmi(&mut self, node: NodeId, at: SimTime, cmd: MmiCmd) {
        self.submit_message(SapMsg {
            sap: Sap::MmiSap,
            src: node,
            dest: node,
            time: at,
            msg: SapMsgInner::MmiCmd(cmd),
        });
    }

    fn push_event(&mut self, msg: SapMsg) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(ScheduledEvent { time: msg.time, seq, msg });
    }

    /// Transport delay between two nodes. Any hop touching an MS is a radio hop.
    fn link_delay(&self, src: NodeId, dest: NodeId) -> Duration {
        let transport = &self.config.config().transport;
        let radio = |n: NodeId| self.roles.get(&n).is_some_and(|r| r.is_radio());
        if radio(src) || radio(dest) {
            transport.radio_delay
        } else {
            transport.wired_delay
        }
    }

    /// Delivers the earliest pending event. Returns false if there was none.
    pub fn deliver_message(&mut self) -> bool {
        let Some(event) = self.events.pop() else {
            return false;
        };
        let message = event.msg;
        let dest = message.get_dest();

        if let SapMsgInner::TimerExpiryInd(ind) = &message.msg {
            if self.cancelled.remove(&(dest, ind.handle)) {
                tracing::trace!("deliver_message: skipping cancelled timer {} of {}", ind.handle, dest);
                self.stats.cancelled_timers += 1;
                return true;
            }
        }

        self.now = event.time;
        debug::set_log_time(self.now);

        let Some(entity) = self.entities.get_mut(&dest) else {
            tracing::warn!(
                "deliver_message: entity {} not found for {:?} {}: {} -> {}",
                dest,
                message.get_sap(),
                message.kind(),
                message.get_source(),
                dest
            );
            self.stats.undeliverable += 1;
            return true;
        };

        tracing::trace!("deliver_message: {:?} {}: {} -> {}", message.get_sap(), message.kind(), message.get_source(), dest);
        let mut queue = MessageQueue::new(dest, self.now);
        entity.rx_prim(&mut queue, message);
        self.stats.delivered += 1;
        self.flush_queue(queue);
        true
    }

    /// Turns the outputs of one dispatch into future events
    fn flush_queue(&mut self, queue: MessageQueue) {
        let node = queue.node;
        for handle in queue.cancelled {
            self.cancelled.insert((node, handle));
        }
        for (handle, delay) in queue.scheduled {
            self.push_event(SapMsg {
                sap: Sap::TimerSap,
                src: node,
                dest: node,
                time: self.now + delay,
                msg: SapMsgInner::TimerExpiryInd(TimerExpiryInd { handle }),
            });
        }
        for (dest, bytes) in queue.sends {
            self.stats.messages_sent += 1;
            self.stats.bytes_sent += bytes.len() as u64;
            let delay = self.link_delay(node, dest);
            self.push_event(SapMsg {
                sap: Sap::TransportSap,
                src: node,
                dest,
                time: self.now + delay,
                msg: SapMsgInner::TransportUnitdataInd(TransportUnitdataInd { bytes }),
            });
        }
        for (sap, msg) in queue.locals {
            self.push_event(SapMsg { sap, src: node, dest: node, time: self.now, msg });
        }
    }

    /// Delivers all events due at or before `end`, then advances the clock to `end`.
    /// Stops early when `running` is cleared.
    pub fn run_until(&mut self, end: SimTime, running: Option<&Arc<AtomicBool>>) {
        loop {
            if let Some(running) = running {
                if !running.load(AtomicOrdering::SeqCst) {
                    tracing::info!("run_until: stop requested at {}", self.now);
                    return;
                }
            }
            match self.events.peek() {
                Some(event) if event.time <= end => {
                    self.deliver_message();
                }
                _ => break,
            }
        }
        if end > self.now {
            self.now = end;
            debug::set_log_time(self.now);
        }
    }

    pub fn run_for(&mut self, duration: Duration) {
        let end = self.now + duration;
        self.run_until(end, None);
    }

    /// Runs either until the event heap drains, until `duration` of simulated time
    /// has passed, or until `running` is cleared.
    pub fn run_stack(&mut self, duration: Option<Duration>, running: Option<Arc<AtomicBool>>) {
        match duration {
            Some(duration) => {
                let end = self.now + duration;
                self.run_until(end, running.as_ref());
            }
            None => loop {
                if let Some(running) = running.as_ref() {
                    if !running.load(AtomicOrdering::SeqCst) {
                        break;
                    }
                }
                if !self.deliver_message() {
                    break;
                }
            },
        }
    }

    pub fn router_stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn stats_report(&self) -> StatsReport {
        let mut nodes = BTreeMap::new();
        for (node, entity) in self.entities.iter() {
            nodes.insert(
                *node,
                NodeReport {
                    role: entity.role(),
                    counters: entity.stats().clone(),
                    pool: entity.pool_counts(),
                },
            );
        }
        StatsReport { time: self.now, router: self.stats.clone(), nodes }
    }
}
