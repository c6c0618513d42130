//! Line-oriented trigger source

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::hub::HubHandle;
use crate::trigger::TriggerMap;

/// Reads trigger names and delivers the mapped messages to the hub
///
/// One trigger name per line; surrounding whitespace is trimmed and empty
/// lines are skipped. Unbound triggers are dropped with a debug log entry,
/// never an error.
pub struct TriggerSource {
    map: TriggerMap,
    hub: HubHandle,
}

impl TriggerSource {
    /// Create a source over the given map and hub
    pub fn new(map: TriggerMap, hub: HubHandle) -> Self {
        Self { map, hub }
    }

    /// Read triggers from stdin until it closes
    pub async fn run(self) {
        if self.map.is_empty() {
            tracing::warn!("No triggers bound; input will be ignored");
        }
        self.run_from(BufReader::new(tokio::io::stdin())).await;
    }

    /// Read triggers from any buffered reader until it ends
    pub async fn run_from<R>(self, reader: R)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trigger = line.trim();
                    if trigger.is_empty() {
                        continue;
                    }
                    match self.map.resolve(trigger) {
                        Some(message) => self.hub.deliver(message),
                        None => {
                            tracing::debug!(trigger = trigger, "Unbound trigger ignored");
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Trigger input failed");
                    break;
                }
            }
        }
        tracing::debug!("Trigger source stopped");
    }
}
