//! Ordered tick systems. `schedule::Schedule` runs these in a fixed order;
//! each operates on the shared registry with exactly one writer at a time.

pub mod behavior;
pub mod collision;
pub mod combat;
pub mod motion;
pub mod ordnance;
pub mod targeting;
pub mod wave;
