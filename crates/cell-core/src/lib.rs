//! Core utilities for the cellular signalling core
//!
//! This crate provides fundamental types and utilities used across the stack:
//! - BitBuffer for bit-level message manipulation
//! - SimTime for simulated time
//! - Identity types (node ids, IMSI, cell and location area ids)
//! - Timer Registry and Resource Pool shared by all roles
//! - Common macros and debug utilities

pub mod admission;
pub mod bitbuffer;
pub mod cell_common;
pub mod cell_roles;
pub mod debug;
pub mod free_index;
pub mod identities;
pub mod msg_parse_error;
pub mod resource_pool;
pub mod sim_time;
pub mod timer_registry;

// Re-export commonly used items
pub use admission::{AdmissionPolicy, AdmissionPurpose, AdmissionRejected};
pub use bitbuffer::BitBuffer;
pub use cell_common::*;
pub use cell_roles::CellRole;
pub use free_index::FreeIndexStack;
pub use identities::*;
pub use msg_parse_error::MsgParseErr;
pub use resource_pool::{AllocStage, PoolCounts, PoolOwner, ResourceKind, ResourcePool, ResourceStatus};
pub use sim_time::SimTime;
pub use timer_registry::{TimerHandle, TimerRegistry, TimerScheduler};
