use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::value::SettingValue;

/// What happened to a configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEventKind {
    /// A setting was committed with a new value
    Changed { key: String, value: SettingValue },
    /// Every setting went back to its default
    Reset,
    /// A settings file was read
    Loaded { path: PathBuf },
    /// A settings file was written
    Saved { path: PathBuf },
}

/// Notification fired after a configuration mutation is committed
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEvent {
    /// Name of the configuration the event belongs to
    pub config: String,
    pub kind: ConfigEventKind,
}

pub type Subscriber = Box<dyn FnMut(&ConfigEvent) + Send>;

enum Sink {
    Callback(Subscriber),
    Channel(UnboundedSender<ConfigEvent>),
}

/// Synchronous fan-out of [`ConfigEvent`]s to subscribers, in the order
/// they subscribed
#[derive(Default)]
pub struct Notifier {
    sinks: Vec<Sink>,
}

impl Notifier {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.sinks.push(Sink::Callback(subscriber));
    }

    /// Subscribe through a channel. The receiver can be dropped at any time;
    /// the sink is removed on the next notification.
    pub fn subscribe_channel(&mut self) -> UnboundedReceiver<ConfigEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sinks.push(Sink::Channel(tx));
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn notify(&mut self, event: ConfigEvent) {
        self.sinks.retain_mut(|sink| match sink {
            Sink::Callback(callback) => {
                callback(&event);
                true
            }
            Sink::Channel(tx) => tx.send(event.clone()).is_ok(),
        });
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.sinks.len())
            .finish()
    }
}
