use slotmap::{SlotMap, new_key_type};
use tracing::debug;

use crate::agent::{Agent, AgentKind, Classifier, SpritePart};
use crate::backend::{RenderFlags, Surface};
use crate::reference::AgentRef;
use crate::sprite::{ImageLoader, NameOnlyLoader};

new_key_type! {
    /// Stable handle for agents backed by a generational slot map.
    pub struct AgentId;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("failed to load sprite '{sprite}': {reason}")]
    ResourceLoad { sprite: String, reason: String },

    #[error("the pointer agent cannot be destroyed")]
    ProtectedAgent,

    #[error("no such agent")]
    UnknownAgent,
}

const POINTER_CLASSIFIER: Classifier = Classifier { family: 2, genus: 1, species: 1 };
const POINTER_PLANE: i32 = 10_000;

/// Which frames of which sprite file a new agent draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualSpec {
    pub sprite: String,
    pub image_count: u32,
    pub first_image: u32,
}

impl VisualSpec {
    pub fn new(sprite: &str, image_count: u32, first_image: u32) -> Self {
        Self {
            sprite: sprite.to_string(),
            image_count,
            first_image,
        }
    }
}

/// Owner of every live agent.
pub struct World {
    agents: SlotMap<AgentId, Agent>,
    /// Live handles in creation order; drives "first match" and draw order ties.
    order: Vec<AgentId>,
    hand: Option<AgentId>,
    loader: Box<dyn ImageLoader>,
    ticks: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Box::new(NameOnlyLoader))
    }
}

impl World {
    pub fn new(loader: Box<dyn ImageLoader>) -> Self {
        Self {
            agents: SlotMap::with_key(),
            order: Vec::new(),
            hand: None,
            loader,
            ticks: 0,
        }
    }

    pub fn with_loader(mut self, loader: Box<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    // =====================================================================
    // Lifecycle
    // =====================================================================

    /// Build and register a new agent. On a sprite load failure nothing is
    /// registered.
    pub fn create_agent(
        &mut self,
        kind: AgentKind,
        classifier: Classifier,
        plane: i32,
        visual: &VisualSpec,
    ) -> Result<AgentId, WorldError> {
        let load_error = |reason: String| WorldError::ResourceLoad {
            sprite: visual.sprite.clone(),
            reason,
        };
        let image = self.loader.load(&visual.sprite).map_err(load_error)?;
        if let Some(available) = image.frame_count() {
            let end = u64::from(visual.first_image) + u64::from(visual.image_count);
            if end > u64::from(available) {
                return Err(load_error(format!(
                    "frames {}..{} requested but file has {}",
                    visual.first_image, end, available
                )));
            }
        }
        let sprite = SpritePart::new(image, visual.first_image, visual.image_count);
        let id = self.add_agent(Agent::new(kind, classifier, plane, sprite));
        debug!(?id, %kind, %classifier, plane, sprite = %visual.sprite, "agent created");
        Ok(id)
    }

    /// Take ownership of an already built agent.
    pub fn add_agent(&mut self, agent: Agent) -> AgentId {
        let id = self.agents.insert(agent);
        self.order.push(id);
        id
    }

    /// Remove an agent. Every outstanding reference to it stops resolving.
    pub fn destroy_agent(&mut self, id: AgentId) -> Result<Agent, WorldError> {
        if self.hand == Some(id) {
            return Err(WorldError::ProtectedAgent);
        }
        let agent = self.agents.remove(id).ok_or(WorldError::UnknownAgent)?;
        self.order.retain(|other| *other != id);
        debug!(?id, classifier = %agent.classifier(), "agent destroyed");
        Ok(agent)
    }

    // =====================================================================
    // Lookup
    // =====================================================================

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Live agents in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.order.iter().filter_map(|&id| self.agents.get(id).map(|a| (id, a)))
    }

    /// Every agent matching `filter` (zero fields are wildcards), in
    /// creation order.
    pub fn find_matching(&self, filter: Classifier) -> Vec<AgentId> {
        self.iter()
            .filter(|(_, agent)| filter.matches(&agent.classifier()))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn find_first(&self, filter: Classifier) -> Option<AgentId> {
        self.iter()
            .find(|(_, agent)| filter.matches(&agent.classifier()))
            .map(|(id, _)| id)
    }

    // =====================================================================
    // Pointer
    // =====================================================================

    /// The pointer ("hand") agent. Empty, but still a valid value, when no
    /// pointer has been installed.
    pub fn hand(&self) -> AgentRef {
        match self.hand {
            Some(id) if self.contains(id) => AgentRef::to(id),
            _ => AgentRef::NULL,
        }
    }

    /// Register `agent` as the pointer, replacing any previous one.
    pub fn install_hand(&mut self, agent: Agent) -> AgentId {
        if let Some(old) = self.hand.take() {
            self.agents.remove(old);
            self.order.retain(|other| *other != old);
        }
        let id = self.add_agent(agent);
        self.hand = Some(id);
        id
    }

    /// Load `visual` and install a simple agent classified 2 1 1 as the pointer.
    pub fn create_pointer(&mut self, visual: &VisualSpec) -> Result<AgentId, WorldError> {
        let image = self.loader.load(&visual.sprite).map_err(|reason| WorldError::ResourceLoad {
            sprite: visual.sprite.clone(),
            reason,
        })?;
        let sprite = SpritePart::new(image, visual.first_image, visual.image_count);
        let agent = Agent::new(AgentKind::Simple, POINTER_CLASSIFIER, POINTER_PLANE, sprite);
        let id = self.install_hand(agent);
        debug!(?id, sprite = %visual.sprite, "pointer installed");
        Ok(id)
    }

    // =====================================================================
    // Simulation
    // =====================================================================

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance every agent by one tick.
    pub fn tick(&mut self) {
        for id in &self.order {
            if let Some(agent) = self.agents.get_mut(*id) {
                agent.tick();
            }
        }
        self.ticks += 1;
    }

    /// Draw every agent onto `surface`, lowest plane first.
    pub fn render(&self, surface: &mut dyn Surface) {
        let mut drawn: Vec<&Agent> = self.iter().map(|(_, agent)| agent).collect();
        drawn.sort_by_key(|agent| agent.plane());
        for agent in drawn {
            let sprite = agent.primary_sprite();
            let (x, y) = agent.position();
            surface.render(
                sprite.image(),
                sprite.frame(),
                x as i32,
                y as i32,
                RenderFlags::default(),
            );
        }
        surface.render_done();
    }
}
