mod common;

use common::{MockNetwork, MockPlatform, MockSession};
use iotlink::config::{CoreConfig, NetConfig, StaticParameters};
use iotlink::entity::{EntityDescriptor, Kind, Registry};
use iotlink::orchestrator::CommState;
use iotlink::runtime::{Peripherals, Runtime};
use iotlink::session::QoS;
use iotlink::storage::{KeyValueStore, MemoryStore};
use iotlink::system::Mode;
use iotlink::system::provisioning::{self, ButtonEvent, ProvisioningButton};
use rand::rngs::mock::StepRng;

type Core = Runtime<'static, MockNetwork, MockSession, MemoryStore<16>, MockPlatform, StepRng>;

static TABLE: [EntityDescriptor<'static>; 5] = [
    EntityDescriptor::new("Relay", Kind::Control)
        .topics("virgo/relay/state", "virgo/relay/set")
        .default_value("OFF"),
    EntityDescriptor::new("Setpoint", Kind::Control)
        .topics("virgo/setpoint/state", "virgo/setpoint/set")
        .resolution("0.1")
        .default_value("19.0"),
    EntityDescriptor::new("Temperature", Kind::Indicator)
        .topics("virgo/temperature/state", "")
        .resolution("0.01"),
    EntityDescriptor::new("Restart", Kind::Button).topics("", "virgo/restart"),
    EntityDescriptor::new("HA_online", Kind::Internal)
        .topics("", "virgo/ha/online")
        .default_value("OFF"),
];

const DISCOVERY: &str = r#"{"device":{"identifiers":["virgo-01"],"name":"Virgo"},"cmps":{"relay":{"p":"switch","cmd_t":"virgo/relay/set"},"temp":{"p":"sensor"}}}"#;

const DISCOVERY_TOPIC: &str = "homeassistant/device/virgo-01/config";

fn core_with(config: CoreConfig<'static>, store: MemoryStore<16>) -> Core {
    let params = StaticParameters::new(
        &[
            ("wifi_ssid", "home"),
            ("device_id", "virgo-01"),
            ("mqtt_ip", "10.0.0.2"),
        ],
        &["wifi_ssid", "device_id", "mqtt_ip"],
    );
    let mut core = Runtime::new(
        Registry::from_table(&TABLE).unwrap(),
        NetConfig::load(&params).unwrap(),
        config,
        Peripherals {
            network: MockNetwork::new(),
            session: MockSession::new(),
            store,
            platform: MockPlatform::default(),
            rng: StepRng::new(7, 0),
        },
    )
    .with_discovery(DISCOVERY);
    core.init();
    core
}

fn core() -> Core {
    core_with(CoreConfig::default(), MemoryStore::new())
}

/// Advances the clock by `ms` and runs one tick.
fn tick(core: &mut Core, ms: u64) {
    core.platform_mut().now += ms;
    core.tick();
}

/// Ticks every 100 ms until the pipeline reports ready. Returns the ticks taken.
fn run_until_ready(core: &mut Core) -> u32 {
    for n in 1..=200 {
        tick(core, 100);
        if core.became_ready() {
            return n;
        }
    }
    panic!("never became ready, stuck in {:?}", core.state());
}

#[test]
fn test_cold_start_reaches_ready() {
    let mut core = core();
    assert_eq!(core.state(), CommState::Disconnected);

    tick(&mut core, 0);
    assert_eq!(core.state(), CommState::Attaching);
    tick(&mut core, 100);
    assert_eq!(core.state(), CommState::SessionPending);
    assert_eq!(core.network_mut().hostnames, ["virgo-01"]);
    tick(&mut core, 100);
    assert!(matches!(core.state(), CommState::Flushing { until: 3_200 }));
    assert!(core.publish_allowed());

    run_until_ready(&mut core);
    assert_eq!(core.state(), CommState::Ready);
    assert!(core.platform_mut().now >= 3_200);
    assert!(!core.is_fully_ready());
    core.confirm_ready();
    assert!(core.is_fully_ready());
}

#[test]
fn test_watchdog_kicked_every_tick() {
    let mut core = core();
    for _ in 0..5 {
        tick(&mut core, 10);
    }
    core.suspend();
    tick(&mut core, 10);
    assert_eq!(core.platform_mut().kicks, 6);
}

#[test]
fn test_discovery_and_subscriptions() {
    let mut core = core();
    run_until_ready(&mut core);

    let session = core.session_mut();
    let announced: Vec<_> = session
        .published
        .iter()
        .filter(|p| p.topic == DISCOVERY_TOPIC)
        .collect();
    assert_eq!(announced.len(), 1);
    assert_eq!(announced[0].payload, DISCOVERY);
    assert!(announced[0].retain);
    assert_eq!(announced[0].qos, QoS::AtLeastOnce);

    assert_eq!(
        session.subscribed,
        ["virgo/relay/set", "virgo/setpoint/set", "virgo/restart", "virgo/ha/online"]
    );
    assert_eq!(session.configures, 1);
}

#[test]
fn test_malformed_discovery_still_subscribes() {
    let mut core = core();
    core.set_discovery(Some(r#"{"device":{"name":"Virgo"},"cmps":{}}"#));
    run_until_ready(&mut core);

    let session = core.session_mut();
    assert!(session.payloads(DISCOVERY_TOPIC).is_empty());
    assert_eq!(session.subscribed.len(), 4);
}

#[test]
fn test_missing_discovery_still_subscribes() {
    let mut core = core();
    core.set_discovery(None);
    run_until_ready(&mut core);
    assert!(core.session_mut().published.is_empty());
    assert_eq!(core.session_mut().subscribed.len(), 4);
}

#[test]
fn test_became_ready_once_per_session() {
    let mut core = core();
    run_until_ready(&mut core);
    assert!(!core.became_ready());
    for _ in 0..50 {
        tick(&mut core, 100);
        assert!(!core.became_ready());
    }
    core.confirm_ready();

    // Broker drops the session; the core rebuilds it.
    core.session_mut().connected = false;
    tick(&mut core, 100);
    assert_eq!(core.state(), CommState::SessionPending);
    assert!(!core.is_fully_ready());

    run_until_ready(&mut core);
    assert_eq!(core.session_mut().payloads(DISCOVERY_TOPIC).len(), 2);
    assert_eq!(core.session_mut().subscribed.len(), 8);
    assert!(!core.is_fully_ready());
}

#[test]
fn test_unconsumed_ready_edge_expires() {
    let mut core = core();
    for _ in 0..200 {
        tick(&mut core, 100);
        if core.state() == CommState::Ready {
            break;
        }
    }
    assert_eq!(core.state(), CommState::Ready);
    tick(&mut core, 100);
    assert!(!core.became_ready());
}

#[test]
fn test_flush_window_drops_retained_state() {
    let mut core = core();
    tick(&mut core, 0);
    tick(&mut core, 100);
    tick(&mut core, 100);
    assert!(matches!(core.state(), CommState::Flushing { .. }));

    core.session_mut().deliver("virgo/relay/set", "ON");
    core.session_mut().deliver("virgo/restart", "PRESS");
    core.session_mut().deliver("virgo/ha/online", "ON");
    tick(&mut core, 100);

    assert_eq!(core.read("Relay"), Some("OFF"));
    assert!(!core.on_change("Restart"));
    assert_eq!(core.read("HA_online"), Some("ON"));
    assert!(core.on_change("HA_online"));
    assert!(core.session_mut().payloads("virgo/relay/state").is_empty());

    run_until_ready(&mut core);
    core.session_mut().deliver("virgo/relay/set", "ON");
    tick(&mut core, 100);
    assert_eq!(core.read("Relay"), Some("ON"));
    assert!(core.on_change("Relay"));
    assert_eq!(core.session_mut().payloads("virgo/relay/state"), ["ON"]);
    assert_eq!(core.store_mut().get("Relay").unwrap().as_deref(), Some("ON"));
}

#[test]
fn test_inbound_budget_per_tick() {
    let config = CoreConfig {
        inbound_budget: 2,
        ..CoreConfig::default()
    };
    let mut core = core_with(config, MemoryStore::new());
    run_until_ready(&mut core);

    for v in ["1", "2", "3"] {
        core.session_mut().deliver("virgo/setpoint/set", v);
    }
    tick(&mut core, 100);
    assert_eq!(core.read("Setpoint"), Some("2.0"));
    assert_eq!(core.session_mut().inbound.len(), 1);
    tick(&mut core, 100);
    assert_eq!(core.read("Setpoint"), Some("3.0"));
}

#[test]
fn test_unmatched_inbound_is_dropped() {
    let mut core = core();
    run_until_ready(&mut core);
    let before: Vec<String> = core.registry().iter().map(|b| b.read().to_string()).collect();

    core.session_mut().deliver("someone/else", "ON");
    core.session_mut().deliver("virgo/temperature/state", "99");
    tick(&mut core, 100);

    let after: Vec<String> = core.registry().iter().map(|b| b.read().to_string()).collect();
    assert_eq!(before, after);
    assert!(!core.dispatch_inbound("someone/else", "ON"));
    assert!(core.dispatch_inbound("virgo/setpoint/set", "20.04"));
    assert_eq!(core.read("Setpoint"), Some("20.0"));
}

#[test]
fn test_writes_are_held_until_connected() {
    let mut core = core();
    assert!(!core.publish_allowed());
    assert!(core.write_float("Temperature", 21.456));
    assert_eq!(core.read("Temperature"), Some("21.46"));
    assert!(core.session_mut().published.is_empty());

    assert!(core.write("Relay", "ON"));
    assert_eq!(core.store_mut().get("Relay").unwrap().as_deref(), Some("ON"));
    assert!(!core.on_change("Relay"));

    run_until_ready(&mut core);
    core.publish_all();
    assert_eq!(core.session_mut().payloads("virgo/relay/state"), ["ON"]);
    assert_eq!(core.session_mut().payloads("virgo/setpoint/state"), ["19.0"]);
    assert!(core.session_mut().payloads("virgo/temperature/state").is_empty());

    assert!(core.write_int("Temperature", 22));
    assert_eq!(core.session_mut().payloads("virgo/temperature/state"), ["22.00"]);
    assert!(core.write_bool("Relay", false));
    assert_eq!(core.session_mut().payloads("virgo/relay/state"), ["ON", "OFF"]);
    assert!(core.publish_value("Setpoint"));
    assert_eq!(core.session_mut().payloads("virgo/setpoint/state"), ["19.0", "19.0"]);
}

#[test]
fn test_unknown_entity_names() {
    let mut core = core();
    assert!(!core.write("Nope", "1"));
    assert!(!core.publish_value("Nope"));
    assert!(!core.on_change("Nope"));
    assert_eq!(core.read("Nope"), None);
    assert!(core.entity("Relay").is_some());
}

#[test]
fn test_control_values_survive_restart() {
    let mut store = MemoryStore::new();
    store.put("Setpoint", "21.57").unwrap();
    let mut core = core_with(CoreConfig::default(), store);
    assert_eq!(core.read("Setpoint"), Some("21.6"));
    assert_eq!(core.read("Relay"), Some("OFF"));
    assert_eq!(core.store_mut().get("Relay").unwrap().as_deref(), Some("OFF"));

    core.reset_all();
    assert_eq!(core.read("Setpoint"), Some(""));
    assert!(core.store_mut().is_empty());
}

#[test]
fn test_supervisor_gate() {
    let config = CoreConfig {
        supervisor_status: Some("HA_online"),
        ..CoreConfig::default()
    };
    let mut core = core_with(config, MemoryStore::new());
    run_until_ready(&mut core);
    core.confirm_ready();

    assert!(core.is_fully_ready());
    assert!(!core.publish_allowed());
    core.write("Relay", "ON");
    assert!(core.session_mut().payloads("virgo/relay/state").is_empty());

    core.session_mut().deliver("virgo/ha/online", "ON");
    tick(&mut core, 100);
    assert!(core.publish_allowed());
    core.write("Relay", "OFF");
    assert_eq!(core.session_mut().payloads("virgo/relay/state"), ["OFF"]);
}

#[test]
fn test_log_book() {
    let config = CoreConfig {
        log_topic: Some("virgo/log"),
        ..CoreConfig::default()
    };
    let mut core = core_with(config, MemoryStore::new());
    core.log_book("booting");
    assert!(core.session_mut().published.is_empty());

    run_until_ready(&mut core);
    core.log_book("hello");
    assert_eq!(core.session_mut().payloads("virgo/log"), ["hello"]);
}

#[test]
fn test_suspend_and_resume() {
    let mut core = core();
    run_until_ready(&mut core);
    core.confirm_ready();

    core.suspend();
    assert_eq!(core.mode(), Mode::Suspended);
    assert_eq!(core.state(), CommState::Disconnected);
    assert_eq!(core.session_mut().disconnects, 1);
    assert!(!core.publish_allowed());
    assert!(!core.is_fully_ready());

    let begins = core.network_mut().begins;
    for _ in 0..20 {
        tick(&mut core, 1_000);
    }
    assert_eq!(core.state(), CommState::Disconnected);
    assert_eq!(core.network_mut().begins, begins);
    assert_eq!(core.session_mut().connects, 1);

    core.resume();
    assert_eq!(core.mode(), Mode::Active);
    run_until_ready(&mut core);
    assert_eq!(core.session_mut().connects, 2);
    assert_eq!(core.session_mut().configures, 1);
    assert_eq!(core.session_mut().payloads(DISCOVERY_TOPIC).len(), 2);
}

#[test]
fn test_dispatch_dropped_while_suspended() {
    let mut core = core();
    run_until_ready(&mut core);
    core.confirm_ready();

    core.suspend();
    assert!(!core.dispatch_inbound("virgo/relay/set", "ON"));
    assert!(!core.dispatch_inbound("virgo/ha/online", "offline"));
    assert_eq!(core.read("Relay"), Some("OFF"));
    assert_eq!(core.store_mut().get("Relay").unwrap().as_deref(), Some("OFF"));
}

#[test]
fn test_network_loss_restarts_pipeline() {
    let mut core = core();
    run_until_ready(&mut core);

    core.network_mut().connected = false;
    core.network_mut().attach_on_begin = false;
    tick(&mut core, 100);
    assert_eq!(core.state(), CommState::Attaching);
    assert!(!core.publish_allowed());

    core.network_mut().attach_on_begin = true;
    run_until_ready(&mut core);
    assert_eq!(core.network_mut().hostnames.len(), 2);
}

#[test]
fn test_provisioning_button() {
    let mut core = core();
    let mut button = ProvisioningButton::new(3_000);

    assert_eq!(core.poll_provisioning_button(&mut button, true), ButtonEvent::None);
    core.platform_mut().now += 3_000;
    assert_eq!(core.poll_provisioning_button(&mut button, true), ButtonEvent::Armed);
    assert!(provisioning::force_provisioning(core.store_mut()));
    assert_eq!(core.platform_mut().reboots, 0);

    core.platform_mut().now += 500;
    assert_eq!(core.poll_provisioning_button(&mut button, false), ButtonEvent::Restart);
    assert_eq!(core.platform_mut().reboots, 1);
}
