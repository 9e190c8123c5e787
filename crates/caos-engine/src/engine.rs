use caos_common::errors::CaosError;
use caos_parser::{Parser, lex};
use caos_runtime::{DiagnosticHandler, ExecContext, Vm};
use caos_world::backend::{Backend, BackendEvent};
use caos_world::{AgentRef, World};
use tracing::{debug, info};

use crate::config::EngineConfig;

/// Parser, interpreter and world behind one entry point.
pub struct Engine {
    config: EngineConfig,
    world: World,
    vm: Vm,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let vm = Vm::new(config.vm.clone());
        Self {
            config,
            world: World::default(),
            vm,
        }
    }

    pub fn with_world(mut self, world: World) -> Self {
        self.world = world;
        self
    }

    pub fn with_handler(mut self, handler: Box<dyn DiagnosticHandler>) -> Self {
        self.vm = Vm::new(self.config.vm.clone()).with_handler(handler);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Compile and run injected script text with no owner.
    ///
    /// Only the install part runs; a removal script after `rscr` is parsed
    /// for validity and dropped. Returns the script's output buffer.
    pub fn execute(&mut self, text: &str) -> Result<String, Vec<CaosError>> {
        let tokens = lex(text)?;
        let injection = Parser::new(tokens).parse_injection()?;
        debug!(
            calls = injection.install.len(),
            has_removal = injection.removal.is_some(),
            "executing injected script"
        );

        let mut ctx = ExecContext::new();
        let result = self.vm.run(&injection.install, &mut ctx, &mut self.world);
        debug!(
            diagnostics = self.vm.diagnostics().len(),
            ok = result.is_ok(),
            "script finished"
        );
        match result {
            Ok(()) => Ok(ctx.take_output()),
            Err(err) => Err(vec![CaosError::runtime(err.to_string())]),
        }
    }

    /// Entry point for the network listener: always produces response text.
    ///
    /// On success this is the script output; on failure, the errors one per
    /// line.
    pub fn execute_network(&mut self, text: &str) -> String {
        match self.execute(text) {
            Ok(output) => output,
            Err(errors) => errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) {
        self.world.tick();
    }

    /// Draw the world onto the backend's main surface.
    pub fn render(&self, backend: &mut dyn Backend) {
        self.world.render(backend.main_surface());
    }

    /// Drain pending backend events. Returns `false` once `Quit` is seen.
    pub fn pump_events(&mut self, backend: &mut dyn Backend) -> bool {
        while let Some(event) = backend.poll_event() {
            match event {
                BackendEvent::MouseMove { x, y } => self.move_pointer(x, y),
                BackendEvent::Quit => {
                    info!("quit requested by backend");
                    return false;
                }
                _ => {}
            }
        }
        true
    }

    fn move_pointer(&mut self, x: i32, y: i32) {
        let hand: AgentRef = self.world.hand();
        if let Some(pointer) = hand.resolve_mut(&mut self.world) {
            pointer.move_to(x as f32, y as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caos_runtime::SilentHandler;
    use caos_world::VisualSpec;
    use caos_world::backend::HeadlessBackend;

    fn make_engine() -> Engine {
        Engine::default().with_handler(Box::new(SilentHandler))
    }

    #[test]
    fn test_execute_returns_output() {
        let mut engine = make_engine();
        let output = engine
            .execute("new: simp 2 3 4 \"ball\" 1 0 500\noutv fmly outs \" \" outv plne\nrscr\n")
            .unwrap();
        assert_eq!(output, "2 500");
        assert_eq!(engine.world().len(), 1);
    }

    #[test]
    fn test_network_response_for_parse_error() {
        let mut engine = make_engine();
        let response = engine.execute_network("foo\nrscr\n");
        assert!(response.contains("unknown command 'foo'"), "got: {}", response);
    }

    #[test]
    fn test_network_response_for_runtime_error() {
        let mut engine = make_engine();
        let response = engine.execute_network("attr 3\nrscr\n");
        assert!(response.contains("ATTR needs a target"), "got: {}", response);
    }

    #[test]
    fn test_removal_script_does_not_run() {
        let mut engine = make_engine();
        let output = engine.execute("outs \"in\"\nrscr\nouts \"out\"").unwrap();
        assert_eq!(output, "in");
    }

    #[test]
    fn test_repeated_requests_keep_diagnostics_bounded() {
        let mut engine = make_engine();
        for _ in 0..1000 {
            assert_eq!(engine.execute_network("next next next\nrscr\n"), "");
        }
        assert_eq!(engine.vm().diagnostics().len(), 3);
    }

    #[test]
    fn test_unknown_escape_with_multibyte_char() {
        let mut engine = make_engine();
        assert_eq!(engine.execute_network("outs \"\\\u{e9}\"\nrscr\n"), "\\\u{e9}");
    }

    #[test]
    fn test_out_of_range_pose_is_rejected_before_render() {
        let mut engine = make_engine();
        let request = "new: simp 1 1 1 \"ball\" 1 1 0 anim [4294967295]\nrscr\n";
        let response = engine.execute_network(request);
        assert!(response.contains("outside the agent's 1 images"), "got: {}", response);

        let mut backend = HeadlessBackend::default();
        engine.render(&mut backend);
        assert_eq!(backend.recorded().calls[0].frame, 1);
    }

    #[test]
    fn test_pump_events_moves_pointer() {
        let mut engine = make_engine();
        let hand = engine.world_mut().create_pointer(&VisualSpec::new("hand", 1, 0)).unwrap();

        let mut backend = HeadlessBackend::default();
        backend.push_event(BackendEvent::MouseMove { x: 40, y: 25 });
        assert!(engine.pump_events(&mut backend));
        assert_eq!(engine.world().get(hand).unwrap().position(), (40.0, 25.0));

        backend.push_event(BackendEvent::Quit);
        assert!(!engine.pump_events(&mut backend));
    }

    #[test]
    fn test_render_draws_to_main_surface() {
        let mut engine = make_engine();
        engine.execute("new: simp 1 1 1 \"ball\" 1 0 10").unwrap();
        let mut backend = HeadlessBackend::default();
        engine.render(&mut backend);
        assert_eq!(backend.recorded().calls.len(), 1);
        assert_eq!(backend.recorded().frames_done, 1);
    }
}
