use serde::Serialize;

use crate::admission::{AdmissionPolicy, AdmissionPurpose, AdmissionRejected, AdmissionRequest, PoolLoad};

/// Identifies the holder of pool slots. Entities use their transaction id.
pub type PoolOwner = u32;

/// Usage type of a slot. Also carried on the wire as channel type (2 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ResourceKind {
    Control = 0,
    Voice = 1,
    Data = 2,
}

impl std::convert::TryFrom<u64> for ResourceKind {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(ResourceKind::Control),
            1 => Ok(ResourceKind::Voice),
            2 => Ok(ResourceKind::Data),
            _ => Err(()),
        }
    }
}

impl ResourceKind {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u64
    }
}

impl From<ResourceKind> for u64 {
    fn from(e: ResourceKind) -> Self {
        e.into_raw()
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ResourceKind::Control => write!(f, "Control"),
            ResourceKind::Voice => write!(f, "Voice"),
            ResourceKind::Data => write!(f, "Data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Idle,
    /// Allocated, waiting for the peer to take it into use
    Tentative(ResourceKind),
    InUse(ResourceKind),
    /// Held for an incoming handover
    Reserved(ResourceKind),
}

/// Status a slot gets when allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocStage {
    Tentative,
    Reserved,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceErr {
    InvalidIndex(u16),
    NotAllocated { idx: u16 },
    OwnerMismatch { idx: u16, owner: PoolOwner, actual: PoolOwner },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolCounts {
    pub idle: u16,
    pub tentative: u16,
    pub in_use: u16,
    pub reserved: u16,
}

impl PoolCounts {
    pub fn total(&self) -> u16 {
        self.idle + self.tentative + self.in_use + self.reserved
    }
}

#[derive(Debug, Clone)]
struct ResourceSlot {
    status: ResourceStatus,
    owner: Option<PoolOwner>,
}

/// Fixed-capacity pool of indexed slots (radio channels at a BS, circuits at an SC,
/// packet data addresses at a Gateway). Every slot is in exactly one status at
/// any time, so the status counts always add up to the capacity.
#[derive(Debug)]
pub struct ResourcePool {
    slots: Vec<ResourceSlot>,
    slot_bandwidth_kbps: u32,
    policy: Box<dyn AdmissionPolicy>,
}

impl ResourcePool {
    pub fn new(capacity: u16, slot_bandwidth_kbps: u32, policy: Box<dyn AdmissionPolicy>) -> Self {
        Self {
            slots: vec![ResourceSlot { status: ResourceStatus::Idle, owner: None }; capacity as usize],
            slot_bandwidth_kbps,
            policy,
        }
    }

    pub fn capacity(&self) -> u16 {
        self.slots.len() as u16
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn set_policy(&mut self, policy: Box<dyn AdmissionPolicy>) {
        self.policy = policy;
    }

    pub fn load(&self) -> PoolLoad {
        let idle = self.slots.iter().filter(|s| s.status == ResourceStatus::Idle).count() as u16;
        PoolLoad { capacity: self.capacity(), idle, busy: self.capacity() - idle }
    }

    /// Allocates `count` slots for `owner`, all or nothing. The policy is consulted first;
    /// on rejection nothing changes.
    pub fn try_allocate(
        &mut self,
        owner: PoolOwner,
        count: u16,
        kind: ResourceKind,
        stage: AllocStage,
        purpose: AdmissionPurpose,
    ) -> Result<Vec<u16>, AdmissionRejected> {
        if count == 0 {
            return Err(AdmissionRejected::InvalidRequest);
        }
        let load = self.load();
        if load.idle < count {
            return Err(AdmissionRejected::InsufficientIdle { requested: count, idle: load.idle });
        }
        self.policy.admit(&load, &AdmissionRequest { count, kind, purpose })?;

        let status = match stage {
            AllocStage::Tentative => ResourceStatus::Tentative(kind),
            AllocStage::Reserved => ResourceStatus::Reserved(kind),
            AllocStage::Confirmed => ResourceStatus::InUse(kind),
        };
        let indices: Vec<u16> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status == ResourceStatus::Idle)
            .take(count as usize)
            .map(|(i, _)| i as u16)
            .collect();
        crate::assert_warn!(indices.len() == count as usize, "pool found {} idle slots, expected {}", indices.len(), count);
        for idx in indices.iter() {
            let slot = &mut self.slots[*idx as usize];
            slot.status = status;
            slot.owner = Some(owner);
        }
        tracing::debug!("pool: allocated {:?} as {:?} for owner {}", indices, status, owner);
        Ok(indices)
    }

    /// Moves tentative or reserved slots into use. Slots already in use are left as is.
    /// Validates all indices before changing any.
    pub fn confirm(&mut self, owner: PoolOwner, indices: &[u16]) -> Result<(), ResourceErr> {
        for idx in indices.iter() {
            let slot = self.slots.get(*idx as usize).ok_or(ResourceErr::InvalidIndex(*idx))?;
            match slot.owner {
                None => return Err(ResourceErr::NotAllocated { idx: *idx }),
                Some(actual) if actual != owner => {
                    return Err(ResourceErr::OwnerMismatch { idx: *idx, owner, actual });
                }
                Some(_) => {}
            }
        }
        for idx in indices.iter() {
            let slot = &mut self.slots[*idx as usize];
            slot.status = match slot.status {
                ResourceStatus::Tentative(k) | ResourceStatus::Reserved(k) | ResourceStatus::InUse(k) => {
                    ResourceStatus::InUse(k)
                }
                ResourceStatus::Idle => ResourceStatus::Idle,
            };
        }
        Ok(())
    }

    /// Returns slots of `owner` to idle. Slots that are already idle or held by another
    /// owner are skipped, so releasing twice is harmless. Returns the number released.
    pub fn release(&mut self, owner: PoolOwner, indices: &[u16]) -> usize {
        let mut released = 0;
        for idx in indices.iter() {
            let Some(slot) = self.slots.get_mut(*idx as usize) else {
                tracing::warn!("pool: release of invalid index {}", idx);
                continue;
            };
            match slot.owner {
                Some(actual) if actual == owner => {
                    slot.status = ResourceStatus::Idle;
                    slot.owner = None;
                    released += 1;
                }
                Some(actual) => {
                    tracing::warn!("pool: owner {} tried to release slot {} held by {}", owner, idx, actual);
                }
                None => {}
            }
        }
        if released > 0 {
            tracing::debug!("pool: released {} slot(s) of owner {}", released, owner);
        }
        released
    }

    /// Releases everything held by `owner`
    pub fn release_owner(&mut self, owner: PoolOwner) -> usize {
        let indices = self.indices_owned_by(owner);
        self.release(owner, &indices)
    }

    pub fn status(&self, idx: u16) -> Option<ResourceStatus> {
        self.slots.get(idx as usize).map(|s| s.status)
    }

    pub fn owner_of(&self, idx: u16) -> Option<PoolOwner> {
        self.slots.get(idx as usize).and_then(|s| s.owner)
    }

    pub fn indices_owned_by(&self, owner: PoolOwner) -> Vec<u16> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.owner == Some(owner))
            .map(|(i, _)| i as u16)
            .collect()
    }

    pub fn counts(&self) -> PoolCounts {
        let mut c = PoolCounts::default();
        for slot in self.slots.iter() {
            match slot.status {
                ResourceStatus::Idle => c.idle += 1,
                ResourceStatus::Tentative(_) => c.tentative += 1,
                ResourceStatus::InUse(_) => c.in_use += 1,
                ResourceStatus::Reserved(_) => c.reserved += 1,
            }
        }
        c
    }

    pub fn num_idle(&self) -> u16 {
        self.counts().idle
    }

    /// Bandwidth of slots in use
    pub fn bandwidth_in_use_kbps(&self) -> u32 {
        self.counts().in_use as u32 * self.slot_bandwidth_kbps
    }

    /// Bandwidth of all non-idle slots, including tentative and reserved ones
    pub fn bandwidth_committed_kbps(&self) -> u32 {
        let c = self.counts();
        (c.in_use + c.tentative + c.reserved) as u32 * self.slot_bandwidth_kbps
    }

    pub fn slot_bandwidth_kbps(&self) -> u32 {
        self.slot_bandwidth_kbps
    }

    /// Number of slots needed to carry `kbps`, at least one. Saturates at `u16::MAX`,
    /// which no pool can satisfy.
    pub fn slots_for_bandwidth(&self, kbps: u32) -> u16 {
        if self.slot_bandwidth_kbps == 0 {
            return 1;
        }
        let slots = kbps.div_ceil(self.slot_bandwidth_kbps).max(1);
        u16::try_from(slots).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::admission::{SimpleMaxUserPolicy, ThresholdPolicy};

    fn pool(capacity: u16) -> ResourcePool {
        ResourcePool::new(capacity, 16, Box::new(SimpleMaxUserPolicy { max_users: capacity }))
    }

    #[test]
    fn test_tentative_confirm_release() {
        let mut p = pool(10);
        let idx = p
            .try_allocate(1, 1, ResourceKind::Voice, AllocStage::Tentative, AdmissionPurpose::NewRequest)
            .expect("admitted");
        assert_eq!(p.counts(), PoolCounts { idle: 9, tentative: 1, in_use: 0, reserved: 0 });

        p.confirm(1, &idx).expect("confirm");
        assert_eq!(p.status(idx[0]), Some(ResourceStatus::InUse(ResourceKind::Voice)));
        assert_eq!(p.bandwidth_in_use_kbps(), 16);

        assert_eq!(p.release(1, &idx), 1);
        assert_eq!(p.release(1, &idx), 0, "second release is a no-op");
        assert_eq!(p.num_idle(), 10);
    }

    #[test]
    fn test_all_or_nothing() {
        let mut p = pool(4);
        p.try_allocate(1, 3, ResourceKind::Data, AllocStage::Confirmed, AdmissionPurpose::NewRequest)
            .expect("admitted");
        let res = p.try_allocate(2, 2, ResourceKind::Data, AllocStage::Confirmed, AdmissionPurpose::NewRequest);
        assert_eq!(res, Err(AdmissionRejected::InsufficientIdle { requested: 2, idle: 1 }));
        assert_eq!(p.counts().idle, 1);
        assert!(p.indices_owned_by(2).is_empty());
    }

    #[test]
    fn test_confirm_checks_owner_before_changing() {
        let mut p = pool(4);
        let a = p
            .try_allocate(1, 1, ResourceKind::Voice, AllocStage::Tentative, AdmissionPurpose::NewRequest)
            .expect("admitted");
        let b = p
            .try_allocate(2, 1, ResourceKind::Voice, AllocStage::Tentative, AdmissionPurpose::NewRequest)
            .expect("admitted");
        let both = [a[0], b[0]];
        assert!(matches!(p.confirm(1, &both), Err(ResourceErr::OwnerMismatch { .. })));
        assert_eq!(p.counts().tentative, 2);
        assert_eq!(p.release(1, &both), 1);
        assert_eq!(p.owner_of(b[0]), Some(2));
    }

    #[test]
    fn test_threshold_admits_handover_into_guard() {
        let mut p = ResourcePool::new(4, 16, Box::new(ThresholdPolicy { guard_channels: 1 }));
        p.try_allocate(1, 3, ResourceKind::Voice, AllocStage::Confirmed, AdmissionPurpose::NewRequest)
            .expect("admitted");
        assert!(p.try_allocate(2, 1, ResourceKind::Voice, AllocStage::Tentative, AdmissionPurpose::NewRequest).is_err());
        let ho = p
            .try_allocate(3, 1, ResourceKind::Voice, AllocStage::Reserved, AdmissionPurpose::Handover)
            .expect("handover uses guard channel");
        assert_eq!(p.status(ho[0]), Some(ResourceStatus::Reserved(ResourceKind::Voice)));
    }

    #[test]
    fn test_slots_for_bandwidth_saturates() {
        let mut p = pool(10);
        assert_eq!(p.slots_for_bandwidth(0), 1);
        assert_eq!(p.slots_for_bandwidth(17), 2);
        assert_eq!(p.slots_for_bandwidth(16 * 65_535), u16::MAX);
        assert_eq!(p.slots_for_bandwidth(16 * 65_536), u16::MAX);
        assert_eq!(p.slots_for_bandwidth(65_537 * 16), u16::MAX);
        assert_eq!(p.slots_for_bandwidth(u32::MAX), u16::MAX);

        let count = p.slots_for_bandwidth(65_537 * 16);
        let res = p.try_allocate(1, count, ResourceKind::Data, AllocStage::Tentative, AdmissionPurpose::NewRequest);
        assert_eq!(res, Err(AdmissionRejected::InsufficientIdle { requested: u16::MAX, idle: 10 }));
        assert_eq!(p.num_idle(), 10);
    }

    #[test]
    fn test_counts_conserved_under_random_operations() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut p = pool(32);
        for _ in 0..2000 {
            let owner: PoolOwner = rng.random_range(0..8);
            match rng.random_range(0..4) {
                0 => {
                    let count = rng.random_range(1..5);
                    let stage = match rng.random_range(0..3) {
                        0 => AllocStage::Tentative,
                        1 => AllocStage::Reserved,
                        _ => AllocStage::Confirmed,
                    };
                    let before = p.counts();
                    let res = p.try_allocate(owner, count, ResourceKind::Voice, stage, AdmissionPurpose::NewRequest);
                    if res.is_err() {
                        assert_eq!(before, p.counts());
                    }
                }
                1 => {
                    let idx = p.indices_owned_by(owner);
                    p.confirm(owner, &idx).expect("own slots confirm");
                }
                2 => {
                    p.release_owner(owner);
                }
                _ => {
                    let idx = rng.random_range(0..40);
                    p.release(owner, &[idx]);
                }
            }
            assert_eq!(p.counts().total(), p.capacity());
            let busy = (0..p.capacity()).filter(|i| p.owner_of(*i).is_some()).count() as u16;
            assert_eq!(busy, p.capacity() - p.counts().idle);
        }
    }
}
