// MIT License - Copyright (c) 2026 Peter Wright

//! Domain state machines for the panel's devices.
//!
//! Both device types follow the same contract: status setters return `true`
//! only on a genuine transition, so callers can gate notification emission
//! on real state changes.

pub mod partition;
pub mod zone;
