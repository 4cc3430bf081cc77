//! The per-voice signal graph.
//!
//! A voice renders through a [`particle::Particle`]: seven FM operators wired
//! by a fixed [`routing::Routing`], with each carrier passing through its own
//! delay and panner ([`spatial`]). The voice pool only talks to it through the
//! [`node::GraphNode`] trait.

/// Core trait shared by all voice graphs, and the render context.
pub mod node;
/// Single FM operator: phase, envelopes, ramps, feedback.
pub mod operator;
/// Seven operators evaluated per sample into eight output channels.
pub mod particle;
/// Fixed operator topology and its validation.
pub mod routing;
/// Carrier delay + panner chain.
pub mod spatial;

pub use node::{GraphNode, RenderCtx};
pub use particle::Particle;
pub use routing::Routing;
