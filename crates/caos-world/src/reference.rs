use crate::agent::Agent;
use crate::world::{AgentId, World};

/// A non-owning, possibly-empty handle to one agent.
///
/// This is the type of the TARG and OWNR registers and of agent values.
/// Handles are generation-tagged, so a reference to a destroyed agent simply
/// stops resolving; no bookkeeping of outstanding references is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AgentRef(Option<AgentId>);

impl AgentRef {
    pub const NULL: AgentRef = AgentRef(None);

    pub fn to(id: AgentId) -> Self {
        AgentRef(Some(id))
    }

    /// The raw handle, live or not.
    pub fn id(&self) -> Option<AgentId> {
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = None;
    }

    pub fn set(&mut self, id: AgentId) {
        self.0 = Some(id);
    }

    /// The handle if it still names a live agent.
    pub fn live(&self, world: &World) -> Option<AgentId> {
        self.0.filter(|id| world.contains(*id))
    }

    pub fn is_bound(&self, world: &World) -> bool {
        self.live(world).is_some()
    }

    pub fn resolve<'w>(&self, world: &'w World) -> Option<&'w Agent> {
        self.0.and_then(|id| world.get(id))
    }

    pub fn resolve_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut Agent> {
        self.0.and_then(move |id| world.get_mut(id))
    }

    /// Drop a dangling handle so the reference reads as empty from now on.
    pub fn refresh(&mut self, world: &World) {
        if self.live(world).is_none() {
            self.0 = None;
        }
    }
}

impl From<AgentId> for AgentRef {
    fn from(id: AgentId) -> Self {
        AgentRef::to(id)
    }
}
