//! Decides which objects on a server are of interest.
//!
//! An [`ObjectFilter`] combines an optional class list (logical OR across the
//! list, answered by the server) with an optional caller-supplied
//! [`ObjectPredicate`]. When both are present the result is their AND. With
//! neither, every object matches.


use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;
use tracing::debug;

use crate::server::ServerResult;
use crate::ObjectName;
use crate::ServerLocator;

/// Caller expression evaluated against a candidate object
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectPredicate: Send + Sync + 'static {
    async fn matches(
        &self,
        server: &ServerLocator,
        object: &ObjectName,
    ) -> ServerResult<bool>;
}

/// Predicate backed by a plain closure over the object's identity
pub struct FnPredicate<F>(F);

impl<F> FnPredicate<F>
where
    F: Fn(&ServerLocator, &ObjectName) -> bool + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ObjectPredicate for FnPredicate<F>
where
    F: Fn(&ServerLocator, &ObjectName) -> bool + Send + Sync + 'static,
{
    async fn matches(
        &self,
        server: &ServerLocator,
        object: &ObjectName,
    ) -> ServerResult<bool> {
        Ok((self.0)(server, object))
    }
}

/// Matches objects whose attribute currently equals `expected`
#[derive(Debug, Clone)]
pub struct AttributeEquals {
    attribute: String,
    expected: Value,
}

impl AttributeEquals {
    pub fn new(
        attribute: impl Into<String>,
        expected: Value,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            expected,
        }
    }
}

#[async_trait]
impl ObjectPredicate for AttributeEquals {
    async fn matches(
        &self,
        server: &ServerLocator,
        object: &ObjectName,
    ) -> ServerResult<bool> {
        let value = server.handle().get_attribute(object, &self.attribute).await?;
        Ok(value == self.expected)
    }
}

#[derive(Clone, Default)]
pub struct ObjectFilter {
    classes: Vec<String>,
    predicate: Option<Arc<dyn ObjectPredicate>>,
}

impl ObjectFilter {
    pub fn new(
        classes: Vec<String>,
        predicate: Option<Arc<dyn ObjectPredicate>>,
    ) -> Self {
        Self { classes, predicate }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Every object is tracked
    pub fn is_open(&self) -> bool {
        self.classes.is_empty() && self.predicate.is_none()
    }

    /// Evaluates the filter, surfacing probe failures
    pub async fn evaluate(
        &self,
        server: &ServerLocator,
        object: &ObjectName,
    ) -> ServerResult<bool> {
        if !self.classes.is_empty() && !server.handle().implements_any(object, &self.classes).await? {
            return Ok(false);
        }
        match &self.predicate {
            Some(predicate) => predicate.matches(server, object).await,
            None => Ok(true),
        }
    }

    /// Evaluates the filter; a failed probe counts as not matching
    pub async fn matches(
        &self,
        server: &ServerLocator,
        object: &ObjectName,
    ) -> bool {
        match self.evaluate(server, object).await {
            Ok(matched) => matched,
            Err(e) => {
                debug!(server = %server.id(), object = %object, "filter probe failed: {}", e);
                false
            }
        }
    }
}

impl fmt::Debug for ObjectFilter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ObjectFilter")
            .field("classes", &self.classes)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
