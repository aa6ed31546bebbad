//! Host/remote settings synchronization.
//!
//! The host is authoritative. A remote asks for each of its configurations
//! once with `requestConfig`, and the host answers with `updateSettings`
//! carrying its full settings. The remote applies them as a temporary
//! override on top of its own settings, which stay recoverable with
//! [`crate::Configuration::remove_temporary`]. Later `updateSettings`
//! pushed by the host with [`ConfigRegistry::push_settings`] replace the
//! override but restore to the same point.
//!
//! There is no retry: a remote whose request goes unanswered stays in
//! [`SyncState::AwaitingUpdate`] and keeps using its local values.

use std::fmt;
use std::str::FromStr;

use modkit_timer::{Scheduler, TimerId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::registry::ConfigRegistry;
use crate::value::Settings;

/// Which side of the connection this process is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Authoritative: persists settings and answers requests
    #[default]
    Host,
    /// Requests settings from the host and applies them temporarily
    Remote,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Remote => f.write_str("remote"),
        }
    }
}

/// Progress of a remote configuration through the initial sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Unsynced,
    AwaitingUpdate,
    Synced,
}

/// Identifies a connected participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncCommand {
    /// Remote asks the host for a configuration's settings
    #[serde(rename = "requestConfig")]
    RequestConfig,
    /// Host sends a configuration's full settings
    #[serde(rename = "updateSettings")]
    UpdateSettings,
    /// Older name for `updateSettings`, still accepted by remotes
    #[serde(rename = "updateConfig")]
    UpdateConfig,
}

impl SyncCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncCommand::RequestConfig => "requestConfig",
            SyncCommand::UpdateSettings => "updateSettings",
            SyncCommand::UpdateConfig => "updateConfig",
        }
    }
}

impl fmt::Display for SyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sync command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for SyncCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requestConfig" => Ok(SyncCommand::RequestConfig),
            "updateSettings" => Ok(SyncCommand::UpdateSettings),
            "updateConfig" => Ok(SyncCommand::UpdateConfig),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// A sync message, addressed by configuration name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub config_name: String,
    pub command: SyncCommand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Settings>,
}

impl Envelope {
    pub fn request(config_name: impl Into<String>) -> Self {
        Self {
            config_name: config_name.into(),
            command: SyncCommand::RequestConfig,
            payload: None,
        }
    }

    pub fn update(config_name: impl Into<String>, settings: Settings) -> Self {
        Self {
            config_name: config_name.into(),
            command: SyncCommand::UpdateSettings,
            payload: Some(settings),
        }
    }
}

/// Outbound half of the host's client/server command channel
pub trait Transport {
    fn send_to_host(&mut self, envelope: Envelope);

    fn send_to_remote(&mut self, target: PeerId, envelope: Envelope);
}

/// Context handed to timer callbacks that need to drive sync
pub trait SyncEndpoint {
    fn sync_parts(&mut self) -> (&mut ConfigRegistry, &mut dyn Transport);
}

/// Schedule the remote's one-time initial request for the next tick.
///
/// Deferring by a tick gives scripts the chance to create their
/// configurations before the requests go out.
pub fn schedule_initial_sync<C, S>(scheduler: &mut S) -> TimerId
where
    C: SyncEndpoint + 'static,
    S: Scheduler<C> + ?Sized,
{
    scheduler.on_next_tick(
        "modkit-initial-sync",
        Box::new(|ctx: &mut C| {
            let (registry, transport) = ctx.sync_parts();
            registry.request_all(transport);
        }),
    )
}

impl ConfigRegistry {
    /// Send `requestConfig` for every configuration that has not asked yet.
    ///
    /// Returns the number of requests sent. Does nothing on the host.
    pub fn request_all(&mut self, transport: &mut dyn Transport) -> usize {
        if self.role != Role::Remote {
            debug!(target: "modkit::sync", "Host does not request settings");
            return 0;
        }

        let mut sent = 0;
        for config in self.configs.values_mut() {
            if config.sync_state != SyncState::Unsynced {
                continue;
            }
            debug!(target: "modkit::sync", "Requesting settings for {}", config.name);
            transport.send_to_host(Envelope::request(config.name.clone()));
            config.sync_state = SyncState::AwaitingUpdate;
            sent += 1;
        }
        sent
    }

    /// Send a configuration's current settings to `targets` unprompted.
    ///
    /// Returns the number of updates sent. Does nothing on a remote or for an
    /// unknown name.
    pub fn push_settings(
        &self,
        config_name: &str,
        targets: &[PeerId],
        transport: &mut dyn Transport,
    ) -> usize {
        if self.role != Role::Host {
            debug!(target: "modkit::sync", "Remote does not push settings");
            return 0;
        }
        let Some(config) = self.configs.get(config_name) else {
            debug!(target: "modkit::sync", "Cannot push unknown configuration {}", config_name);
            return 0;
        };

        for &target in targets {
            debug!(target: "modkit::sync", "Pushing {} to {}", config_name, target);
            let envelope = Envelope::update(config_name, config.settings.clone());
            transport.send_to_remote(target, envelope);
        }
        targets.len()
    }

    /// Inbound dispatch for sync messages from `sender`
    pub fn handle_message(
        &mut self,
        sender: PeerId,
        envelope: Envelope,
        transport: &mut dyn Transport,
    ) {
        let Envelope {
            config_name,
            command,
            payload,
        } = envelope;

        match (self.role, command) {
            (Role::Host, SyncCommand::RequestConfig) => {
                let Some(config) = self.configs.get(&config_name) else {
                    debug!(
                        target: "modkit::sync",
                        "{} requested unknown configuration {}", sender, config_name
                    );
                    return;
                };
                debug!(target: "modkit::sync", "Sending {} to {}", config_name, sender);
                transport.send_to_remote(
                    sender,
                    Envelope::update(config_name, config.settings.clone()),
                );
            }
            (Role::Remote, SyncCommand::UpdateSettings | SyncCommand::UpdateConfig) => {
                let Some(config) = self.configs.get_mut(&config_name) else {
                    debug!(
                        target: "modkit::sync",
                        "Update for unknown configuration {}", config_name
                    );
                    return;
                };
                let settings = payload.unwrap_or_default();
                let changed = config.apply_temporary(&settings);
                config.sync_state = SyncState::Synced;
                info!(
                    target: "modkit::sync",
                    "Synced {} from host ({} setting(s) changed)", config_name, changed
                );
            }
            (role, command) => {
                debug!(
                    target: "modkit::sync",
                    "Ignoring {} for {} on {}", command, config_name, role
                );
            }
        }
    }

    /// Inbound dispatch for the host's generic command channel, where the
    /// command arrives by name. Unknown commands are ignored.
    pub fn handle_command(
        &mut self,
        sender: PeerId,
        config_name: &str,
        command: &str,
        payload: Option<Settings>,
        transport: &mut dyn Transport,
    ) {
        match command.parse::<SyncCommand>() {
            Ok(command) => self.handle_message(
                sender,
                Envelope {
                    config_name: config_name.to_string(),
                    command,
                    payload,
                },
                transport,
            ),
            Err(err) => debug!(target: "modkit::sync", "Ignoring message from {}: {}", sender, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_round_trip() {
        for command in [
            SyncCommand::RequestConfig,
            SyncCommand::UpdateSettings,
            SyncCommand::UpdateConfig,
        ] {
            assert_eq!(command.as_str().parse::<SyncCommand>(), Ok(command));
        }
        let err = "RequestConfig".parse::<SyncCommand>().unwrap_err();
        assert_eq!(err.to_string(), "unknown sync command 'RequestConfig'");
    }

    #[test]
    fn test_envelope_wire_names() {
        let envelope = Envelope::request("ZMU");
        let text = toml::to_string(&envelope).unwrap();
        assert!(text.contains("command = \"requestConfig\""));
        assert!(!text.contains("payload"));

        let parsed: Envelope = toml::from_str(&text).unwrap();
        assert_eq!(parsed, envelope);
    }
}
