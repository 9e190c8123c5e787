//! End-to-end tests: script text over a loopback socket -> engine -> response.

use std::sync::Once;

use caos_engine::{Engine, EngineConfig, Exchange, NetworkConfig, ScriptListener};
use caos_runtime::{ErrorPolicy, SilentHandler};
use caos_world::backend::{BackendEvent, HeadlessBackend};
use caos_world::VisualSpec;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("caos_engine=debug,caos_runtime=warn")
            .with_test_writer()
            .try_init();
    });
}

fn make_engine(config: EngineConfig) -> Engine {
    Engine::new(config).with_handler(Box::new(SilentHandler))
}

fn ephemeral() -> NetworkConfig {
    NetworkConfig { first_port: 0, last_port: 0, ..NetworkConfig::default() }
}

/// Helper: send one request to `listener` and return the response text.
async fn exchange(
    listener: &ScriptListener,
    engine: &mut Engine,
    request: &str,
) -> (Exchange, String) {
    let addr = listener.local_addr().unwrap();
    let client = async {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    };
    let (served, response) = tokio::join!(listener.accept_one(engine), client);
    (served.unwrap(), response)
}

#[tokio::test]
async fn test_world_state_persists_across_connections() {
    init_tracing();
    let listener = ScriptListener::bind(ephemeral()).await.unwrap();
    let mut engine = make_engine(EngineConfig::default());

    let create = "new: simp 4 2 9 \"ball\" 1 0 300\nrscr\n";
    let (_, first) = exchange(&listener, &mut engine, create).await;
    assert_eq!(first, "");

    let lookup = "rtar 4 2 9 outv spcs outs \"/\" outv plne\nrscr\n";
    let (_, second) = exchange(&listener, &mut engine, lookup).await;
    assert_eq!(second, "9/300");
    assert_eq!(engine.world().len(), 1);
}

#[tokio::test]
async fn test_one_response_per_connection() {
    init_tracing();
    let listener = ScriptListener::bind(ephemeral()).await.unwrap();
    let mut engine = make_engine(EngineConfig::default());

    let (served, response) = exchange(&listener, &mut engine, "foo\nrscr\n").await;
    assert_eq!(served, Exchange::Answered { request_bytes: 9, response_bytes: response.len() });
    assert!(response.contains("unknown command 'foo'"));
}

#[tokio::test]
async fn test_continue_policy_over_network() {
    init_tracing();
    let config =
        EngineConfig::from_json_str(r#"{"vm": {"error_policy": "continue_script"}}"#).unwrap();
    assert_eq!(config.vm.error_policy, ErrorPolicy::ContinueScript);
    let listener = ScriptListener::bind(ephemeral()).await.unwrap();
    let mut engine = make_engine(config);

    let request = "outs \"a\" attr 1 outs \"b\"\nrscr\n";
    let (_, response) = exchange(&listener, &mut engine, request).await;
    assert_eq!(response, "ab");
}

#[tokio::test]
async fn test_request_ending_at_eof() {
    init_tracing();
    let listener = ScriptListener::bind(ephemeral()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut engine = make_engine(EngineConfig::default());

    let client = async {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"outv 12").await.unwrap();
        stream.shutdown().await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    };
    let (served, response) = tokio::join!(listener.accept_one(&mut engine), client);
    served.unwrap();
    assert_eq!(response, "12");
}

#[test]
fn test_frame_loop_with_headless_backend() {
    let mut engine = make_engine(EngineConfig::default());
    engine.world_mut().create_pointer(&VisualSpec::new("hand", 1, 0)).unwrap();
    engine.execute("new: simp 1 1 1 \"blnk\" 4 0 10 anim [0 1 255]").unwrap();

    let mut backend = HeadlessBackend::new(640, 480);
    backend.push_event(BackendEvent::MouseMove { x: 100, y: 50 });

    for _ in 0..3 {
        assert!(engine.pump_events(&mut backend));
        engine.tick();
        engine.render(&mut backend);
    }

    let recorded = backend.recorded();
    assert_eq!(recorded.frames_done, 3);
    // The pointer sits on the highest plane, so it is drawn last each frame.
    let last = recorded.calls.last().unwrap();
    assert_eq!(last.sprite, "hand");
    assert_eq!((last.x, last.y), (100, 50));
    let blnk_frames: Vec<u32> = recorded
        .calls
        .iter()
        .filter(|c| c.sprite == "blnk")
        .map(|c| c.frame)
        .collect();
    assert_eq!(blnk_frames, vec![1, 0, 1]);
}
