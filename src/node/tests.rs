use super::names::{resolve_topic, validate_namespace, validate_node_name};
use super::{Node, Talker, Timer};
use crate::config::Settings;
use crate::context::{Context, live_handles};
use crate::message::RosMessage;
use crate::message::std_msgs::{Int32, String as StringMsg};
use crate::transport::{ClientMessage, Transport};
use crate::utils::{Result, TalkerError};
use serial_test::serial;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn settings_with_limit(max_messages: Option<u64>) -> Settings {
    let mut settings = Settings::default();
    settings.publisher.max_messages = max_messages;
    settings
}

fn drain(rx: &mut UnboundedReceiver<ClientMessage>) -> Vec<(String, StringMsg)> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        match frame {
            ClientMessage::Publish { topic, payload, .. } => {
                frames.push((topic, StringMsg::from_payload(&payload).unwrap()));
            }
            other => panic!("Expected publish frame, got {other:?}"),
        }
    }
    frames
}

#[test]
fn node_names_follow_token_rules() {
    assert!(validate_node_name("talker").is_ok());
    assert!(validate_node_name("_talker_2").is_ok());
    assert!(validate_node_name("").is_err());
    assert!(validate_node_name("2talker").is_err());
    assert!(validate_node_name("talk-er").is_err());
    assert!(validate_node_name("ns/talker").is_err());
}

#[test]
fn namespaces_must_be_absolute() {
    assert!(validate_namespace("/").is_ok());
    assert!(validate_namespace("/demo").is_ok());
    assert!(validate_namespace("/demo/robot_1").is_ok());
    assert!(validate_namespace("demo").is_err());
    assert!(validate_namespace("/demo/").is_err());
    assert!(validate_namespace("//demo").is_err());
    assert!(validate_namespace("/1demo").is_err());
}

#[test]
fn relative_topics_resolve_against_namespace() {
    assert_eq!(resolve_topic("/", "chatter").unwrap(), "/chatter");
    assert_eq!(resolve_topic("/demo", "chatter").unwrap(), "/demo/chatter");
    assert_eq!(
        resolve_topic("/demo", "robot/chatter").unwrap(),
        "/demo/robot/chatter"
    );
    assert_eq!(resolve_topic("/demo", "/chatter").unwrap(), "/chatter");
}

#[test]
fn invalid_topics_are_rejected() {
    assert!(resolve_topic("/", "").is_err());
    assert!(resolve_topic("/", "~/private").is_err());
    assert!(resolve_topic("/", "chatter/").is_err());
    assert!(resolve_topic("/", "/").is_err());
    assert!(resolve_topic("/", "9chatter").is_err());

    match resolve_topic("/", "chat ter").unwrap_err() {
        TalkerError::InvalidName { kind, name, .. } => {
            assert_eq!(kind, "topic");
            assert_eq!(name, "chat ter");
        }
        other => panic!("Expected InvalidName, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn node_reports_fully_qualified_name() {
    let (ctx, _rx) = Context::loopback();

    let root = Node::new(&ctx, "talker", "/").unwrap();
    assert_eq!(root.fully_qualified_name(), "/talker");

    let nested = Node::new(&ctx, "talker", "/demo").unwrap();
    assert_eq!(nested.name(), "talker");
    assert_eq!(nested.namespace(), "/demo");
    assert_eq!(nested.fully_qualified_name(), "/demo/talker");

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn node_creation_fails_on_shut_down_context() {
    let (ctx, _rx) = Context::loopback();
    let node = Node::new(&ctx, "talker", "/").unwrap();
    ctx.shutdown().await.unwrap();

    assert!(matches!(
        Node::new(&ctx, "talker", "/").unwrap_err(),
        TalkerError::ContextShutdown
    ));
    assert!(matches!(
        node.create_publisher::<StringMsg>("chatter", 0).unwrap_err(),
        TalkerError::ContextShutdown
    ));
}

#[tokio::test]
#[serial]
async fn publisher_sends_frames_on_resolved_topic() {
    let (ctx, mut rx) = Context::loopback();
    let node = Node::new(&ctx, "counter", "/demo").unwrap();
    let mut publisher = node.create_publisher::<Int32>("numbers", 1).unwrap();
    assert_eq!(publisher.topic(), "/demo/numbers");
    assert_eq!(publisher.last_published(), None);

    publisher.publish(&Int32 { data: 5 }).await.unwrap();
    assert_eq!(publisher.published(), 1);
    assert!(publisher.last_published().is_some());

    match rx.try_recv().unwrap() {
        ClientMessage::Publish {
            topic,
            payload,
            message_id,
            qos,
        } => {
            assert_eq!(topic, "/demo/numbers");
            assert_eq!(Int32::from_payload(&payload).unwrap(), Int32 { data: 5 });
            assert!(message_id.is_some_and(|id| !id.is_empty()));
            assert_eq!(qos, Some(1));
        }
        other => panic!("Expected publish frame, got {other:?}"),
    }

    drop(publisher);
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn publisher_counts_as_a_live_handle() {
    let before = live_handles();
    let (ctx, _rx) = Context::loopback();
    let node = Node::new(&ctx, "talker", "/").unwrap();
    let publisher = node.create_publisher::<StringMsg>("chatter", 0).unwrap();
    assert_eq!(live_handles(), before + 2);

    drop(publisher);
    assert_eq!(live_handles(), before + 1);

    ctx.shutdown().await.unwrap();
    drop(node);
    drop(ctx);
    assert_eq!(live_handles(), before);
}

#[tokio::test(start_paused = true)]
async fn timer_waits_one_period_before_first_tick() {
    let start = tokio::time::Instant::now();
    let mut timer = Timer::new(Duration::from_millis(100)).unwrap();

    assert_eq!(timer.tick().await, 1);
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(start.elapsed() < Duration::from_millis(200));
    assert_eq!(timer.tick().await, 2);
    assert!(start.elapsed() >= Duration::from_millis(200));
    assert_eq!(timer.fired(), 2);
    assert_eq!(timer.period(), Duration::from_millis(100));
}

#[tokio::test]
async fn timer_rejects_zero_period() {
    assert!(Timer::new(Duration::ZERO).is_err());
}

#[tokio::test(start_paused = true)]
#[serial]
async fn on_tick_publishes_increasing_sequence() {
    let (ctx, mut rx) = Context::loopback();
    let mut talker = Talker::start(&ctx, &Settings::default()).unwrap();
    assert_eq!(talker.publisher().topic(), "/chatter");

    let first = talker.on_tick().await.unwrap();
    let second = talker.on_tick().await.unwrap();
    assert_eq!(first.data, "Hello World: 0");
    assert_eq!(second.data, "Hello World: 1");
    assert_eq!(talker.count(), 2);

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], ("/chatter".to_string(), first));
    assert_eq!(frames[1], ("/chatter".to_string(), second));

    talker.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
#[serial]
async fn spin_emits_one_message_per_tick_until_limit() {
    let (ctx, mut rx) = Context::loopback();
    let mut talker = Talker::start(&ctx, &settings_with_limit(Some(3))).unwrap();

    let start = tokio::time::Instant::now();
    let published = talker.spin(std::future::pending()).await.unwrap();
    assert_eq!(published, 3);
    assert!(start.elapsed() >= Duration::from_millis(3000));
    assert!(start.elapsed() < Duration::from_millis(4000));

    let data: Vec<String> = drain(&mut rx).into_iter().map(|(_, m)| m.data).collect();
    assert_eq!(
        data,
        vec!["Hello World: 0", "Hello World: 1", "Hello World: 2"]
    );

    talker.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
#[serial]
async fn spin_stops_cleanly_on_shutdown_signal() {
    let before = live_handles();
    let (ctx, mut rx) = Context::loopback();
    let mut settings = Settings::default();
    settings.publisher.period_ms = 100;
    let mut talker = Talker::start(&ctx, &settings).unwrap();

    let published = talker
        .spin(tokio::time::sleep(Duration::from_millis(450)))
        .await
        .unwrap();
    assert_eq!(published, 4);
    assert_eq!(drain(&mut rx).len(), 4);

    talker.shutdown().await.unwrap();
    assert!(!ctx.ok());
    drop(ctx);
    assert_eq!(live_handles(), before);
    assert!(rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
#[serial]
async fn spin_skips_failed_publishes_but_keeps_sequence() {
    let (ctx, rx) = Context::loopback();
    let mut talker = Talker::start(&ctx, &settings_with_limit(Some(2))).unwrap();

    // With the receiving end gone every publish fails with a transport error.
    drop(rx);
    let published = talker.spin(std::future::pending()).await.unwrap();
    assert_eq!(published, 0);
    assert_eq!(talker.count(), 2);

    talker.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
#[serial]
async fn spin_ends_with_error_when_context_is_shut_down() {
    let (ctx, _rx) = Context::loopback();
    let mut talker = Talker::start(&ctx, &Settings::default()).unwrap();
    ctx.shutdown().await.unwrap();

    let err = talker.spin(std::future::pending()).await.unwrap_err();
    assert!(matches!(err, TalkerError::ContextShutdown));
}

#[tokio::test]
#[serial]
async fn start_rejects_invalid_node_settings() {
    let (ctx, _rx) = Context::loopback();
    let mut settings = Settings::default();
    settings.node.namespace = "demo".to_string();

    let err = Talker::start(&ctx, &settings).unwrap_err();
    assert!(matches!(err, TalkerError::InvalidName { kind: "namespace", .. }));
    ctx.shutdown().await.unwrap();
}

/// Transport whose sends never complete, like a broker that stopped reading.
#[derive(Debug)]
struct StalledTransport;

impl Transport for StalledTransport {
    async fn send(&mut self, _frame: ClientMessage) -> Result<()> {
        std::future::pending::<Result<()>>().await
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "stalled".to_string()
    }
}

#[tokio::test(start_paused = true)]
#[serial]
async fn spin_stops_on_shutdown_while_publish_is_stalled() {
    let before = live_handles();
    let ctx = Context::with_transport(StalledTransport);
    let mut settings = Settings::default();
    settings.publisher.period_ms = 10;
    let mut talker = Talker::start(&ctx, &settings).unwrap();

    let spun = tokio::time::timeout(
        Duration::from_secs(60),
        talker.spin(tokio::time::sleep(Duration::from_millis(50))),
    )
    .await
    .expect("spin did not react to shutdown during a stalled publish");
    assert_eq!(spun.unwrap(), 0);
    assert_eq!(talker.count(), 1);

    talker.shutdown().await.unwrap();
    assert!(!ctx.ok());
    drop(ctx);
    assert_eq!(live_handles(), before);
}
