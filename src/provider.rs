//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated endpoint metadata plus the client authentication preference
//! and scope delimiter. `strategy` defines [`ProviderStrategy`], the HTTP-client-agnostic hook
//! that maps token endpoint failures onto the relay's error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
