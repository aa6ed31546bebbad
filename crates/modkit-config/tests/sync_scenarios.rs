// Integration tests for host/remote settings sync over the channel transport

use std::fs;
use std::time::Duration;

use modkit_config::{
    link, schedule_initial_sync, ConfigRegistry, Endpoint, Envelope, OptionSchema, PeerId, Role,
    SettingValue, Settings, SyncEndpoint, SyncState, Transport,
};
use modkit_timer::Timers;

const TICK: Duration = Duration::from_millis(100);

/// One participant: its registry and its end of the link
struct Peer {
    registry: ConfigRegistry,
    endpoint: Endpoint,
}

impl Peer {
    fn new(role: Role, endpoint: Endpoint) -> Self {
        let mut registry = ConfigRegistry::new(role);
        let config = registry.create("ZMU", None);
        config.add("BoolTest", OptionSchema::boolean(false));
        config.add("IntTest", OptionSchema::integer(50).with_range(0.0, 100.0));
        Self { registry, endpoint }
    }

    /// Dispatch everything that arrived since the last call
    fn pump(&mut self) -> usize {
        let deliveries = self.endpoint.drain();
        let count = deliveries.len();
        for delivery in deliveries {
            self.registry.handle_message(
                delivery.sender,
                delivery.envelope,
                &mut self.endpoint.transport,
            );
        }
        count
    }

    fn value(&self, key: &str) -> Option<SettingValue> {
        self.registry.get("ZMU")?.get(key).cloned()
    }

    fn state(&self) -> SyncState {
        self.registry.get("ZMU").unwrap().sync_state()
    }
}

impl SyncEndpoint for Peer {
    fn sync_parts(&mut self) -> (&mut ConfigRegistry, &mut dyn Transport) {
        (&mut self.registry, &mut self.endpoint.transport)
    }
}

fn connect() -> (Peer, Peer) {
    let (host, mut remotes) = link(&[PeerId(1)]);
    let remote = remotes.remove(0);
    (Peer::new(Role::Host, host), Peer::new(Role::Remote, remote))
}

#[test]
fn test_remote_overrides_and_restores_persisted_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ZMU.ini");
    fs::write(&path, "BoolTest = true\n").unwrap();

    let (mut host, mut remote) = connect();
    host.registry.get_mut("ZMU").unwrap().set("LogLevel", 4);

    let remote_config = remote.registry.get_mut("ZMU").unwrap();
    assert!(remote_config.load(&path));
    assert_eq!(remote.value("BoolTest"), Some(SettingValue::Boolean(true)));

    let mut timers: Timers<Peer> = Timers::new();
    schedule_initial_sync(&mut timers);

    // The request is deferred until the next tick
    assert_eq!(remote.state(), SyncState::Unsynced);
    assert_eq!(host.pump(), 0);

    assert_eq!(timers.tick(TICK, &mut remote), 1);
    assert_eq!(remote.state(), SyncState::AwaitingUpdate);

    assert_eq!(host.pump(), 1);
    assert_eq!(remote.pump(), 1);
    assert_eq!(remote.state(), SyncState::Synced);
    assert_eq!(remote.value("BoolTest"), Some(SettingValue::Boolean(false)));
    assert_eq!(remote.value("LogLevel"), Some(SettingValue::Integer(4)));

    // The host's values are never written to the remote's file
    let remote_config = remote.registry.get_mut("ZMU").unwrap();
    assert!(!remote_config.save(&path));
    assert_eq!(fs::read_to_string(&path).unwrap(), "BoolTest = true\n");

    assert!(remote_config.remove_temporary());
    assert_eq!(remote.value("BoolTest"), Some(SettingValue::Boolean(true)));
    assert_eq!(remote.value("LogLevel"), Some(SettingValue::Integer(3)));
}

#[test]
fn test_host_reply_carries_full_settings() {
    let (mut host, mut remote) = connect();
    host.registry.get_mut("ZMU").unwrap().set("LogLevel", 4);

    remote.registry.request_all(&mut remote.endpoint.transport);
    host.pump();

    let replies = remote.endpoint.drain();
    assert_eq!(replies.len(), 1);
    let expected: Settings = [
        ("BoolTest".to_string(), SettingValue::Boolean(false)),
        ("IntTest".to_string(), SettingValue::Integer(50)),
        ("LogLevel".to_string(), SettingValue::Integer(4)),
    ]
    .into_iter()
    .collect();
    assert_eq!(replies[0].envelope, Envelope::update("ZMU", expected));
}

#[test]
fn test_requests_are_sent_once() {
    let (mut host, mut remote) = connect();
    remote.registry.create("Second", None);

    let mut timers: Timers<Peer> = Timers::new();
    schedule_initial_sync(&mut timers);
    timers.tick(TICK, &mut remote);
    timers.tick(TICK, &mut remote);
    assert_eq!(timers.active_count(), 0);

    assert_eq!(host.endpoint.drain().len(), 2);
    assert_eq!(remote.registry.request_all(&mut remote.endpoint.transport), 0);
    assert_eq!(host.pump(), 0);
}

#[test]
fn test_unanswered_request_stays_awaiting() {
    let (_host, mut remote) = connect();
    remote.registry.request_all(&mut remote.endpoint.transport);

    // The host never answers; the remote keeps its local values
    for _ in 0..10 {
        remote.pump();
    }
    assert_eq!(remote.state(), SyncState::AwaitingUpdate);
    assert_eq!(remote.value("IntTest"), Some(SettingValue::Integer(50)));
}

#[test]
fn test_legacy_update_command_is_accepted() {
    let (_host, mut remote) = connect();
    let payload = Settings::from([("IntTest".to_string(), SettingValue::Integer(250))]);

    remote.registry.handle_command(
        PeerId(0),
        "ZMU",
        "updateConfig",
        Some(payload),
        &mut remote.endpoint.transport,
    );

    // Host values still go through validation
    assert_eq!(remote.value("IntTest"), Some(SettingValue::Integer(100)));
    assert!(remote.registry.get("ZMU").unwrap().has_temporary());
}

#[test]
fn test_unknown_names_and_wrong_roles_are_ignored() {
    let (mut host, mut remote) = connect();

    // Host ignores requests for configurations it does not have
    remote
        .endpoint
        .transport
        .send_to_host(Envelope::request("Missing"));
    assert_eq!(host.pump(), 1);
    assert!(remote.endpoint.drain().is_empty());

    // Host ignores updates; remote ignores requests
    let update = Envelope::update(
        "ZMU",
        Settings::from([("IntTest".to_string(), SettingValue::Integer(1))]),
    );
    host.registry
        .handle_message(PeerId(1), update.clone(), &mut host.endpoint.transport);
    assert_eq!(host.value("IntTest"), Some(SettingValue::Integer(50)));

    remote.registry.handle_message(
        PeerId(0),
        Envelope::request("ZMU"),
        &mut remote.endpoint.transport,
    );
    assert!(host.endpoint.drain().is_empty());

    // Remote ignores updates for configurations it does not have
    let mut stray = update;
    stray.config_name = "Missing".to_string();
    remote
        .registry
        .handle_message(PeerId(0), stray, &mut remote.endpoint.transport);
    assert!(remote.registry.get("Missing").is_none());

    // Unknown command names are dropped
    remote.registry.handle_command(
        PeerId(0),
        "ZMU",
        "pushEverything",
        None,
        &mut remote.endpoint.transport,
    );
    assert_eq!(remote.state(), SyncState::Unsynced);
}

#[test]
fn test_host_pushes_changes_to_synced_remote() {
    let (mut host, mut remote) = connect();
    remote.registry.get_mut("ZMU").unwrap().set("IntTest", 20);

    remote.registry.request_all(&mut remote.endpoint.transport);
    host.pump();
    remote.pump();
    assert_eq!(remote.state(), SyncState::Synced);
    assert_eq!(remote.value("IntTest"), Some(SettingValue::Integer(50)));

    host.registry.get_mut("ZMU").unwrap().set("IntTest", 80);
    let sent = host
        .registry
        .push_settings("ZMU", &[PeerId(1)], &mut host.endpoint.transport);
    assert_eq!(sent, 1);
    assert_eq!(remote.pump(), 1);
    assert_eq!(remote.value("IntTest"), Some(SettingValue::Integer(80)));
    assert_eq!(remote.state(), SyncState::Synced);

    // Restores the remote's own values, not the first host snapshot
    assert!(remote.registry.get_mut("ZMU").unwrap().remove_temporary());
    assert_eq!(remote.value("IntTest"), Some(SettingValue::Integer(20)));
}

#[test]
fn test_push_is_host_only() {
    let (mut host, mut remote) = connect();

    let sent = remote
        .registry
        .push_settings("ZMU", &[PeerId(0)], &mut remote.endpoint.transport);
    assert_eq!(sent, 0);
    assert!(host.endpoint.drain().is_empty());

    let sent = host
        .registry
        .push_settings("Missing", &[PeerId(1)], &mut host.endpoint.transport);
    assert_eq!(sent, 0);
    assert!(remote.endpoint.drain().is_empty());
}
