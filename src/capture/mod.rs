//! The capture state machine and the per-frame capturer it drives.

pub(crate) mod capturer;
pub(crate) mod config;
pub(crate) mod sequencer;
