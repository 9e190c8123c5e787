//! Agents and the world that owns them.
//!
//! The [`World`] is the sole owner of every agent. Everything else holds
//! [`AgentRef`]s: generation-tagged handles that stop resolving once the
//! agent they point at is destroyed.

pub mod agent;
pub mod animation;
pub mod backend;
pub mod reference;
pub mod sprite;
pub mod world;

pub use agent::{
    Agent, AgentBody, AgentKind, Classifier, CompoundAgent, SimpleAgent, SpritePart, Vehicle,
};
pub use animation::{Animation, AnimationError, LoopTo};
pub use reference::AgentRef;
pub use world::{AgentId, VisualSpec, World, WorldError};
