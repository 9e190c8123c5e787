//! Script-level tests: source text -> compile -> run -> inspect world and context.

use caos_parser::compile;
use caos_runtime::{Diagnostic, ExecContext, SilentHandler, Value, Vm, VmConfig, VmError};
use caos_world::{AgentKind, Classifier, LoopTo, World};

struct Run {
    world: World,
    ctx: ExecContext,
    vm: Vm,
    result: Result<(), VmError>,
}

/// Helper: compile source and run it against a fresh world.
fn run(source: &str) -> Run {
    let script = compile(source).unwrap_or_else(|e| panic!("compile error: {}", e));
    let mut vm = Vm::new(VmConfig {
        rng_seed: Some(1),
        ..VmConfig::default()
    })
    .with_handler(Box::new(SilentHandler));
    let mut world = World::default();
    let mut ctx = ExecContext::new();
    let result = vm.run(&script, &mut ctx, &mut world);
    Run { world, ctx, vm, result }
}

fn run_ok(source: &str) -> Run {
    let run = run(source);
    if let Err(e) = &run.result {
        panic!("runtime error: {}", e);
    }
    run
}

// ===================================================================
// Creation
// ===================================================================

#[test]
fn test_creation_binds_targ_to_new_agent() {
    let run = run_ok("new: simp 3 7 11 \"ball\" 2 0 1000");
    let agent = run.ctx.targ().resolve(&run.world).unwrap();
    assert_eq!(agent.classifier(), Classifier::new(3, 7, 11));
    assert_eq!(agent.kind(), AgentKind::Simple);
}

#[test]
fn test_duplicate_classifiers_are_allowed() {
    let run = run_ok("new: simp 1 2 3 \"ball\" 1 0 0\nnew: simp 1 2 3 \"ball\" 1 0 0");
    assert_eq!(run.world.len(), 2);
}

#[test]
fn test_case_insensitive_commands() {
    let run = run_ok("NEW: COMP 1 2 3 \"lift\" 1 0 0 OUTV FMLY");
    assert_eq!(run.ctx.output(), "1");
}

// ===================================================================
// TARG-dependent opcodes
// ===================================================================

#[test]
fn test_empty_targ_is_no_target_for_every_target_opcode() {
    let sources = [
        "attr 1",
        "outv attr",
        "outv fmly",
        "outv gnus",
        "outv spcs",
        "outv plne",
        "anim [1 2]",
    ];
    for source in sources {
        let mut run = run(source);
        assert!(
            matches!(run.result, Err(VmError::NoTarget { .. })),
            "{}: {:?}",
            source,
            run.result
        );
        assert!(run.world.is_empty());
        assert!(run.ctx.take_output().is_empty());
    }
}

#[test]
fn test_no_target_leaves_other_agents_untouched() {
    let run = run("new: simp 1 1 1 \"ball\" 1 0 0\nattr 5\ntarg null\nattr 9");
    assert!(matches!(run.result, Err(VmError::NoTarget { .. })));
    let (_, agent) = run.world.iter().next().unwrap();
    assert_eq!(agent.attributes(), 5);
}

#[test]
fn test_attr_round_trip() {
    for value in [0, 1, -1, 199, i32::MIN + 1, 0x7fff_0000] {
        let run = run_ok(&format!("new: simp 1 1 1 \"ball\" 1 0 0\nattr {}\noutv attr", value));
        assert_eq!(run.ctx.output(), value.to_string());
    }
}

// ===================================================================
// Animation
// ===================================================================

#[test]
fn test_anim_sets_sequence_and_cursor() {
    let run = run_ok("new: simp 1 1 1 \"blnk\" 8 0 0\nanim [1 2 3 4]");
    let simple = run.ctx.targ().resolve(&run.world).unwrap().as_animatable().unwrap();
    let animation = simple.animation().unwrap();
    assert_eq!(animation.frames(), &[1, 2, 3, 4]);
    assert_eq!(animation.cursor(), 0);
    assert_eq!(animation.looping(), None);
}

#[test]
fn test_anim_loop_markers() {
    let run = run_ok("new: simp 1 1 1 \"blnk\" 8 0 0\nanim [1 2 255 1]");
    let simple = run.ctx.targ().resolve(&run.world).unwrap().as_animatable().unwrap();
    let animation = simple.animation().unwrap();
    assert_eq!(animation.frames(), &[1, 2]);
    assert_eq!(animation.looping(), Some(LoopTo::Index(1)));
}

#[test]
fn test_anim_failure_keeps_previous_animation() {
    let run = run("new: simp 1 1 1 \"blnk\" 8 0 0\nanim [5 6]\nanim [1 2x 3]");
    assert!(matches!(run.result, Err(VmError::MalformedInstruction { .. })));
    let simple = run.ctx.targ().resolve(&run.world).unwrap().as_animatable().unwrap();
    assert_eq!(simple.animation().unwrap().frames(), &[5, 6]);
}

#[test]
fn test_anim_empty_is_a_warning() {
    let run = run_ok("new: simp 1 1 1 \"blnk\" 8 0 0\nanim []");
    assert_eq!(run.vm.diagnostics(), &[Diagnostic::EmptyAnimation]);
}

#[test]
fn test_anim_playback_over_ticks() {
    let mut run = run_ok("new: simp 1 1 1 \"blnk\" 8 0 0\nanim [4 5 255]");
    let targ = run.ctx.targ();
    let pose = |world: &World| {
        targ.resolve(world).unwrap().as_animatable().unwrap().sprite().pose()
    };

    assert_eq!(pose(&run.world), 4);
    run.world.tick();
    assert_eq!(pose(&run.world), 5);
    run.world.tick();
    assert_eq!(pose(&run.world), 4);
}

// ===================================================================
// Pointer, lookup and destruction
// ===================================================================

#[test]
fn test_pntr_always_succeeds() {
    let run = run_ok("targ pntr");
    assert_eq!(run.ctx.targ().id(), None);
}

#[test]
fn test_rtar_then_kill() {
    let run = run_ok(
        "new: simp 2 9 1 \"ball\" 1 0 0\n\
         new: simp 3 9 1 \"ball\" 1 0 0\n\
         rtar 2 0 0\nkill targ\nrtar 0 9 0\noutv fmly",
    );
    assert_eq!(run.world.len(), 1);
    assert_eq!(run.ctx.output(), "3");
}

#[test]
fn test_kill_null_is_invalid_agent() {
    let run = run("kill null");
    assert!(matches!(run.result, Err(VmError::InvalidAgent { .. })));
}

// ===================================================================
// Soft no-ops
// ===================================================================

#[test]
fn test_unimplemented_opcodes_are_distinguishable() {
    let mut run = run_ok(
        "targ from\nnew: simp 1 1 1 \"ball\" 1 0 0\npose 2\ntick 5\nbhvr 3\nouts \"done\"",
    );
    assert_eq!(run.ctx.take_output(), "done");
    let unimplemented: Vec<_> = run
        .vm
        .diagnostics()
        .iter()
        .filter(|d| matches!(d, Diagnostic::Unimplemented { .. }))
        .collect();
    assert_eq!(unimplemented.len(), 4);
}

#[test]
fn test_null_query_has_no_diagnostic() {
    let mut ctx = ExecContext::new();
    let mut world = World::default();
    let mut vm = Vm::default().with_handler(Box::new(SilentHandler));
    vm.run(&compile("targ null").unwrap(), &mut ctx, &mut world).unwrap();
    assert!(vm.diagnostics().is_empty());
    assert_eq!(ctx.result(), None);
    assert_eq!(Value::Agent(ctx.targ()).to_string(), "<null agent>");
}
