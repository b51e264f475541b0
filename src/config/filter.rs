use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Track objects implementing any of these classes; empty tracks everything
    #[serde(default)]
    pub classes: Vec<String>,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.classes.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::InvalidConfig("filter.classes cannot contain blank class names".into()));
        }
        Ok(())
    }
}
