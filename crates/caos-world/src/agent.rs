use std::sync::Arc;

use crate::animation::Animation;
use crate::sprite::SpriteImage;

/// The (family, genus, species) classification triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Classifier {
    pub family: i32,
    pub genus: i32,
    pub species: i32,
}

impl Classifier {
    pub fn new(family: i32, genus: i32, species: i32) -> Self {
        Self { family, genus, species }
    }

    /// Filter match: a zero field in `self` matches anything.
    pub fn matches(&self, other: &Classifier) -> bool {
        (self.family == 0 || self.family == other.family)
            && (self.genus == 0 || self.genus == other.genus)
            && (self.species == 0 || self.species == other.species)
    }
}

impl std::fmt::Display for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.family, self.genus, self.species)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Simple,
    Compound,
    Vehicle,
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AgentKind::Simple => "simple agent",
            AgentKind::Compound => "compound agent",
            AgentKind::Vehicle => "vehicle",
        };
        f.write_str(name)
    }
}

/// A run of frames within a sprite file plus the pose currently shown.
#[derive(Debug, Clone, PartialEq)]
pub struct SpritePart {
    image: Arc<SpriteImage>,
    first_image: u32,
    image_count: u32,
    /// Offset from `first_image` of the frame being shown.
    pose: u32,
}

impl SpritePart {
    pub fn new(image: Arc<SpriteImage>, first_image: u32, image_count: u32) -> Self {
        Self { image, first_image, image_count, pose: 0 }
    }

    pub fn image(&self) -> &Arc<SpriteImage> {
        &self.image
    }

    pub fn first_image(&self) -> u32 {
        self.first_image
    }

    pub fn image_count(&self) -> u32 {
        self.image_count
    }

    pub fn pose(&self) -> u32 {
        self.pose
    }

    pub fn set_pose(&mut self, pose: u32) {
        self.pose = pose;
    }

    /// Absolute frame index within the sprite file.
    pub fn frame(&self) -> u32 {
        self.first_image.saturating_add(self.pose)
    }

    /// Whether `pose` names one of this part's own frames.
    pub fn owns_pose(&self, pose: u32) -> bool {
        pose < self.image_count
    }
}

/// Single-part agent with a pose animation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleAgent {
    sprite: SpritePart,
    animation: Option<Animation>,
}

impl SimpleAgent {
    pub fn new(sprite: SpritePart) -> Self {
        Self { sprite, animation: None }
    }

    pub fn sprite(&self) -> &SpritePart {
        &self.sprite
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    /// Install a new animation and show its first frame.
    pub fn set_animation(&mut self, mut animation: Animation) {
        animation.rewind();
        if let Some(frame) = animation.current() {
            self.sprite.set_pose(frame);
        }
        self.animation = Some(animation);
    }

    /// Drop any animation; the current pose stays on screen.
    pub fn clear_animation(&mut self) {
        self.animation = None;
    }

    fn tick(&mut self) {
        let Some(animation) = self.animation.as_mut() else {
            return;
        };
        match animation.advance() {
            Some(frame) => self.sprite.set_pose(frame),
            None => self.animation = None,
        }
    }
}

/// Multi-part agent. Part 0 is created with the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundAgent {
    parts: Vec<SpritePart>,
}

impl CompoundAgent {
    pub fn new(first_part: SpritePart) -> Self {
        Self { parts: vec![first_part] }
    }

    pub fn parts(&self) -> &[SpritePart] {
        &self.parts
    }
}

/// A compound agent that can carry others.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    body: CompoundAgent,
}

impl Vehicle {
    pub fn new(first_part: SpritePart) -> Self {
        Self { body: CompoundAgent::new(first_part) }
    }

    pub fn body(&self) -> &CompoundAgent {
        &self.body
    }
}

/// Kind-specific state. The set of kinds is closed.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentBody {
    Simple(SimpleAgent),
    Compound(CompoundAgent),
    Vehicle(Vehicle),
}

/// An in-world entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    classifier: Classifier,
    plane: i32,
    attributes: i32,
    x: f32,
    y: f32,
    body: AgentBody,
}

impl Agent {
    pub fn new(kind: AgentKind, classifier: Classifier, plane: i32, sprite: SpritePart) -> Self {
        let body = match kind {
            AgentKind::Simple => AgentBody::Simple(SimpleAgent::new(sprite)),
            AgentKind::Compound => AgentBody::Compound(CompoundAgent::new(sprite)),
            AgentKind::Vehicle => AgentBody::Vehicle(Vehicle::new(sprite)),
        };
        Self {
            classifier,
            plane,
            attributes: 0,
            x: 0.0,
            y: 0.0,
            body,
        }
    }

    pub fn kind(&self) -> AgentKind {
        match self.body {
            AgentBody::Simple(_) => AgentKind::Simple,
            AgentBody::Compound(_) => AgentKind::Compound,
            AgentBody::Vehicle(_) => AgentKind::Vehicle,
        }
    }

    pub fn classifier(&self) -> Classifier {
        self.classifier
    }

    pub fn family(&self) -> i32 {
        self.classifier.family
    }

    pub fn genus(&self) -> i32 {
        self.classifier.genus
    }

    pub fn species(&self) -> i32 {
        self.classifier.species
    }

    pub fn plane(&self) -> i32 {
        self.plane
    }

    pub fn set_plane(&mut self, plane: i32) {
        self.plane = plane;
    }

    pub fn attributes(&self) -> i32 {
        self.attributes
    }

    pub fn set_attributes(&mut self, attributes: i32) {
        self.attributes = attributes;
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn body(&self) -> &AgentBody {
        &self.body
    }

    /// The part drawn at the agent's plane: the sprite of a simple agent or
    /// part 0 of a compound one.
    pub fn primary_sprite(&self) -> &SpritePart {
        match &self.body {
            AgentBody::Simple(simple) => simple.sprite(),
            AgentBody::Compound(compound) => &compound.parts()[0],
            AgentBody::Vehicle(vehicle) => &vehicle.body().parts()[0],
        }
    }

    /// Pose-animation capability; only simple agents have it.
    pub fn as_animatable(&self) -> Option<&SimpleAgent> {
        match &self.body {
            AgentBody::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    pub fn as_animatable_mut(&mut self) -> Option<&mut SimpleAgent> {
        match &mut self.body {
            AgentBody::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    /// Advance per-tick state.
    pub fn tick(&mut self) {
        if let AgentBody::Simple(simple) = &mut self.body {
            simple.tick();
        }
    }
}
