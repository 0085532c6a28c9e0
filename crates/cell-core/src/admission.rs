use core::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::resource_pool::ResourceKind;

/// Why resources are being requested. Handover requests may be admitted
/// into capacity that is held back from new requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionPurpose {
    NewRequest,
    Handover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRequest {
    pub count: u16,
    pub kind: ResourceKind,
    pub purpose: AdmissionPurpose,
}

/// Snapshot of pool occupancy handed to a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLoad {
    pub capacity: u16,
    pub idle: u16,
    /// Tentative, in use and reserved slots
    pub busy: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionRejected {
    InvalidRequest,
    InsufficientIdle { requested: u16, idle: u16 },
    GuardChannels { busy: u16, guard: u16 },
    MaxUsers { busy: u16, max_users: u16 },
    Refrained,
}

impl fmt::Display for AdmissionRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionRejected::InvalidRequest => write!(f, "invalid request"),
            AdmissionRejected::InsufficientIdle { requested, idle } => {
                write!(f, "requested {} but only {} idle", requested, idle)
            }
            AdmissionRejected::GuardChannels { busy, guard } => {
                write!(f, "{} busy, {} guard channels held back", busy, guard)
            }
            AdmissionRejected::MaxUsers { busy, max_users } => write!(f, "{} busy of max {}", busy, max_users),
            AdmissionRejected::Refrained => write!(f, "refrained"),
        }
    }
}

/// Strategy deciding whether a request may be served from a pool.
/// The pool itself guarantees enough idle slots; policies only add restrictions.
pub trait AdmissionPolicy: Send + fmt::Debug {
    fn name(&self) -> &'static str;
    fn admit(&mut self, load: &PoolLoad, req: &AdmissionRequest) -> Result<(), AdmissionRejected>;
}

/// N/M threshold: new requests may not use the last `guard_channels` slots,
/// handovers may use the full pool
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    pub guard_channels: u16,
}

impl AdmissionPolicy for ThresholdPolicy {
    fn name(&self) -> &'static str {
        "Threshold"
    }

    fn admit(&mut self, load: &PoolLoad, req: &AdmissionRequest) -> Result<(), AdmissionRejected> {
        if req.purpose == AdmissionPurpose::Handover {
            return Ok(());
        }
        let limit = load.capacity.saturating_sub(self.guard_channels);
        if load.busy as u32 + req.count as u32 > limit as u32 {
            return Err(AdmissionRejected::GuardChannels { busy: load.busy, guard: self.guard_channels });
        }
        Ok(())
    }
}

/// Admits while at most `max_users` slots are busy
#[derive(Debug, Clone)]
pub struct SimpleMaxUserPolicy {
    pub max_users: u16,
}

impl AdmissionPolicy for SimpleMaxUserPolicy {
    fn name(&self) -> &'static str {
        "SimpleMaxUser"
    }

    fn admit(&mut self, load: &PoolLoad, req: &AdmissionRequest) -> Result<(), AdmissionRejected> {
        if load.busy as u32 + req.count as u32 > self.max_users as u32 {
            return Err(AdmissionRejected::MaxUsers { busy: load.busy, max_users: self.max_users });
        }
        Ok(())
    }
}

/// Above `threshold` busy slots, new requests are refused with `probability`
#[derive(Debug)]
pub struct RefrainProbabilityPolicy {
    threshold: u16,
    probability: f64,
    rng: StdRng,
}

impl RefrainProbabilityPolicy {
    pub fn new(threshold: u16, probability: f64, seed: u64) -> Self {
        Self {
            threshold,
            probability: probability.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl AdmissionPolicy for RefrainProbabilityPolicy {
    fn name(&self) -> &'static str {
        "RefrainProbability"
    }

    fn admit(&mut self, load: &PoolLoad, req: &AdmissionRequest) -> Result<(), AdmissionRejected> {
        if req.purpose == AdmissionPurpose::Handover || load.busy < self.threshold {
            return Ok(());
        }
        if self.rng.random::<f64>() < self.probability {
            return Err(AdmissionRejected::Refrained);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(count: u16, purpose: AdmissionPurpose) -> AdmissionRequest {
        AdmissionRequest { count, kind: ResourceKind::Voice, purpose }
    }

    #[test]
    fn test_threshold_holds_back_guard_channels() {
        let mut p = ThresholdPolicy { guard_channels: 2 };
        let load = PoolLoad { capacity: 10, idle: 3, busy: 7 };
        assert_eq!(p.admit(&load, &req(1, AdmissionPurpose::NewRequest)), Ok(()));
        assert!(p.admit(&load, &req(2, AdmissionPurpose::NewRequest)).is_err());
        assert_eq!(p.admit(&load, &req(3, AdmissionPurpose::Handover)), Ok(()));
    }

    #[test]
    fn test_refrain_extremes() {
        let load = PoolLoad { capacity: 10, idle: 2, busy: 8 };
        let mut always = RefrainProbabilityPolicy::new(5, 1.0, 7);
        let mut never = RefrainProbabilityPolicy::new(5, 0.0, 7);
        assert_eq!(always.admit(&load, &req(1, AdmissionPurpose::NewRequest)), Err(AdmissionRejected::Refrained));
        assert_eq!(always.admit(&load, &req(1, AdmissionPurpose::Handover)), Ok(()));
        assert_eq!(never.admit(&load, &req(1, AdmissionPurpose::NewRequest)), Ok(()));

        let light = PoolLoad { capacity: 10, idle: 8, busy: 2 };
        assert_eq!(always.admit(&light, &req(1, AdmissionPurpose::NewRequest)), Ok(()));
    }
}
