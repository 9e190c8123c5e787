//! Rendering and input capability consumed by the world.
//!
//! The world only issues draw calls and queries through these traits; real
//! windowing backends live outside this workspace. [`HeadlessBackend`]
//! records everything and is what tests and headless runs use.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::sprite::SpriteImage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderFlags {
    pub transparent: bool,
    /// Alpha level when `transparent` is set.
    pub transparency: u8,
    pub mirror: bool,
}

/// A drawable target.
pub trait Surface {
    fn render(&mut self, image: &SpriteImage, frame: u32, x: i32, y: i32, flags: RenderFlags);
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Called once after a full frame has been drawn.
    fn render_done(&mut self) {}
}

pub type SurfaceId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    Resize { width: u32, height: u32 },
    MouseMove { x: i32, y: i32 },
    MouseDown { x: i32, y: i32, button: u8 },
    MouseUp { x: i32, y: i32, button: u8 },
    KeyDown(u32),
    KeyUp(u32),
    Quit,
}

/// Platform services: surfaces, events and keyboard state.
pub trait Backend {
    fn main_surface(&mut self) -> &mut dyn Surface;
    fn new_surface(&mut self, width: u32, height: u32) -> SurfaceId;
    fn free_surface(&mut self, id: SurfaceId);
    fn surface(&mut self, id: SurfaceId) -> Option<&mut dyn Surface>;
    fn poll_event(&mut self) -> Option<BackendEvent>;
    fn key_down(&self, key: u32) -> bool;
    /// Milliseconds since the backend started.
    fn ticks(&self) -> u64;
}

/// One recorded `Surface::render` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub sprite: String,
    pub frame: u32,
    pub x: i32,
    pub y: i32,
    pub flags: RenderFlags,
}

/// Surface that remembers what was drawn on it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    pub calls: Vec<DrawCall>,
    pub frames_done: u32,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, calls: Vec::new(), frames_done: 0 }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl Surface for RecordingSurface {
    fn render(&mut self, image: &SpriteImage, frame: u32, x: i32, y: i32, flags: RenderFlags) {
        self.calls.push(DrawCall {
            sprite: image.name().to_string(),
            frame,
            x,
            y,
            flags,
        });
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn render_done(&mut self) {
        self.frames_done += 1;
    }
}

/// Backend with no window: events are queued by the host, surfaces record.
#[derive(Debug)]
pub struct HeadlessBackend {
    main: RecordingSurface,
    surfaces: HashMap<SurfaceId, RecordingSurface>,
    next_surface: SurfaceId,
    events: VecDeque<BackendEvent>,
    keys: HashSet<u32>,
    ticks: u64,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            main: RecordingSurface::new(width, height),
            surfaces: HashMap::new(),
            next_surface: 1,
            events: VecDeque::new(),
            keys: HashSet::new(),
            ticks: 0,
        }
    }

    /// Queue an event. Key events also update the pressed-key set when
    /// they are polled, as a real backend would.
    pub fn push_event(&mut self, event: BackendEvent) {
        self.events.push_back(event);
    }

    pub fn advance_clock(&mut self, millis: u64) {
        self.ticks += millis;
    }

    pub fn recorded(&self) -> &RecordingSurface {
        &self.main
    }
}

impl Backend for HeadlessBackend {
    fn main_surface(&mut self) -> &mut dyn Surface {
        &mut self.main
    }

    fn new_surface(&mut self, width: u32, height: u32) -> SurfaceId {
        let id = self.next_surface;
        self.next_surface += 1;
        self.surfaces.insert(id, RecordingSurface::new(width, height));
        id
    }

    fn free_surface(&mut self, id: SurfaceId) {
        self.surfaces.remove(&id);
    }

    fn surface(&mut self, id: SurfaceId) -> Option<&mut dyn Surface> {
        self.surfaces.get_mut(&id).map(|s| s as &mut dyn Surface)
    }

    fn poll_event(&mut self) -> Option<BackendEvent> {
        let event = self.events.pop_front()?;
        match event {
            BackendEvent::KeyDown(key) => {
                self.keys.insert(key);
            }
            BackendEvent::KeyUp(key) => {
                self.keys.remove(&key);
            }
            BackendEvent::Resize { width, height } => self.main.resize(width, height),
            _ => {}
        }
        Some(event)
    }

    fn key_down(&self, key: u32) -> bool {
        self.keys.contains(&key)
    }

    fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surfaces_allocate_and_free() {
        let mut backend = HeadlessBackend::default();
        let id = backend.new_surface(32, 16);
        assert_eq!(backend.surface(id).map(|s| s.width()), Some(32));
        backend.free_surface(id);
        assert!(backend.surface(id).is_none());
    }

    #[test]
    fn test_key_state_follows_polled_events() {
        let mut backend = HeadlessBackend::default();
        backend.push_event(BackendEvent::KeyDown(13));
        assert!(!backend.key_down(13));
        assert_eq!(backend.poll_event(), Some(BackendEvent::KeyDown(13)));
        assert!(backend.key_down(13));
        backend.push_event(BackendEvent::KeyUp(13));
        backend.poll_event();
        assert!(!backend.key_down(13));
        assert_eq!(backend.poll_event(), None);
    }

    #[test]
    fn test_resize_updates_main_surface() {
        let mut backend = HeadlessBackend::default();
        backend.push_event(BackendEvent::Resize { width: 1024, height: 768 });
        backend.poll_event();
        assert_eq!(backend.main_surface().width(), 1024);
        assert_eq!(backend.main_surface().height(), 768);
    }
}
