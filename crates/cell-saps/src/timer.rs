use cell_core::TimerHandle;

/// A timer armed through the owner's Timer Registry has run out
#[derive(Debug, Clone, Copy)]
pub struct TimerExpiryInd {
    pub handle: TimerHandle,
}
