//! In-process host and remote exchanging settings over the channel
//! transport, driven by a tokio interval standing in for the game tick.

use std::time::Duration;

use anyhow::{Context, Result};
use modkit_config::{
    link, schedule_initial_sync, ConfigRegistry, Endpoint, OptionSchema, PeerId, Role, Settings,
    SyncEndpoint, SyncState, Transport,
};
use modkit_timer::Timers;
use tracing::{debug, info};

pub const DEMO_CONFIG: &str = "ZMU";

/// A participant in the demo
pub struct DemoPeer {
    pub registry: ConfigRegistry,
    endpoint: Endpoint,
}

impl DemoPeer {
    fn new(role: Role, endpoint: Endpoint) -> Self {
        let mut registry = ConfigRegistry::new(role);
        let config = registry.create(DEMO_CONFIG, None);
        config.add("BoolTest", OptionSchema::boolean(false));
        config.add("IntTest", OptionSchema::integer(50).with_range(0.0, 100.0));
        config.add("FloatTest", OptionSchema::float(0.6).with_min(0.1));
        Self { registry, endpoint }
    }

    fn pump(&mut self) {
        for delivery in self.endpoint.drain() {
            debug!(
                target: "modkit::demo",
                "{} <- {} {}", self.endpoint.id(), delivery.sender, delivery.envelope.command
            );
            self.registry
                .handle_message(delivery.sender, delivery.envelope, &mut self.endpoint.transport);
        }
    }

    fn settings(&self) -> Result<Settings> {
        let config = self
            .registry
            .get(DEMO_CONFIG)
            .context("demo configuration is missing")?;
        Ok(config.settings().clone())
    }

    fn state(&self) -> SyncState {
        self.registry
            .get(DEMO_CONFIG)
            .map(|config| config.sync_state())
            .unwrap_or_default()
    }
}

impl SyncEndpoint for DemoPeer {
    fn sync_parts(&mut self) -> (&mut ConfigRegistry, &mut dyn Transport) {
        (&mut self.registry, &mut self.endpoint.transport)
    }
}

#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Remote settings before sync
    pub before: Settings,
    /// Remote settings with the host's values applied
    pub synced: Settings,
    /// Remote settings after removing the temporary override
    pub restored: Settings,
    pub final_state: SyncState,
    pub ticks: u32,
}

/// Run the exchange for at most `max_ticks` ticks.
pub async fn run_demo(max_ticks: u32, tick_interval: Duration) -> Result<DemoReport> {
    let (host_endpoint, mut remote_endpoints) = link(&[PeerId(1)]);
    let remote_endpoint = remote_endpoints
        .pop()
        .context("link did not create the remote endpoint")?;

    let mut host = DemoPeer::new(Role::Host, host_endpoint);
    let mut remote = DemoPeer::new(Role::Remote, remote_endpoint);

    if let Some(config) = host.registry.get_mut(DEMO_CONFIG) {
        config.set("LogLevel", 4);
        config.set("IntTest", 75);
    }
    // Stands in for values the remote loaded from its own file
    if let Some(config) = remote.registry.get_mut(DEMO_CONFIG) {
        config.set("BoolTest", true);
        config.set("FloatTest", 2.5);
    }
    let before = remote.settings()?;

    let mut timers: Timers<DemoPeer> = Timers::new();
    schedule_initial_sync(&mut timers);

    let mut interval = tokio::time::interval(tick_interval);
    let mut ticks = 0;
    while ticks < max_ticks {
        interval.tick().await;
        ticks += 1;

        timers.tick(tick_interval, &mut remote);
        host.pump();
        remote.pump();

        if remote.state() == SyncState::Synced {
            info!(target: "modkit::demo", "Remote synced after {} tick(s)", ticks);
            break;
        }
    }

    let final_state = remote.state();
    let synced = remote.settings()?;
    if let Some(config) = remote.registry.get_mut(DEMO_CONFIG) {
        config.remove_temporary();
    }
    let restored = remote.settings()?;

    Ok(DemoReport {
        before,
        synced,
        restored,
        final_state,
        ticks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modkit_config::SettingValue;

    #[tokio::test]
    async fn test_demo_syncs_and_restores() {
        let report = run_demo(5, Duration::from_millis(1)).await.unwrap();

        assert_eq!(report.final_state, SyncState::Synced);
        assert_eq!(report.ticks, 1);

        assert_eq!(report.before["BoolTest"], SettingValue::Boolean(true));
        assert_eq!(report.synced["BoolTest"], SettingValue::Boolean(false));
        assert_eq!(report.synced["IntTest"], SettingValue::Integer(75));
        assert_eq!(report.synced["LogLevel"], SettingValue::Integer(4));
        assert_eq!(report.synced["FloatTest"], SettingValue::Float(0.6));

        assert_eq!(report.restored, report.before);
    }

    #[tokio::test]
    async fn test_demo_without_ticks_never_syncs() {
        let report = run_demo(0, Duration::from_millis(1)).await.unwrap();
        assert_eq!(report.final_state, SyncState::Unsynced);
        assert_eq!(report.synced, report.before);
        assert_eq!(report.restored, report.before);
    }
}
