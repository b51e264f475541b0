use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::NotificationFilter;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Relay generic object notifications to listeners
    #[serde(default)]
    pub forward: bool,

    /// Notification types per-object listeners subscribe to; empty means all
    #[serde(default)]
    pub enabled_types: Vec<String>,
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled_types.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "notification.enabled_types cannot contain blank types".into(),
            ));
        }
        Ok(())
    }

    /// Filter for per-object listeners, `None` when every type is wanted
    pub fn filter(&self) -> Option<NotificationFilter> {
        if self.enabled_types.is_empty() {
            return None;
        }
        Some(
            self.enabled_types
                .iter()
                .fold(NotificationFilter::new(), |f, t| f.enable_type(t.clone())),
        )
    }
}
