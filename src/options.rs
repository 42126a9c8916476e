//! Per-invocation activity configuration.
//!
//! Configuration travels through an [OptionChain], a parent-linked list of immutable nodes.
//! Every `with_*` call returns a new node holding its own copy of the parameters, overlaid with
//! whatever was explicitly set. Ancestors are never touched, so chains forked from a shared
//! ancestor can be extended concurrently.

use crate::errors::ValidationError;
use std::{convert::TryFrom, sync::Arc, time::Duration};

/// Stable textual identity of a registered activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, derive_more::From, derive_more::Display)]
#[display(fmt = "{}", name)]
pub struct ActivityType {
    pub name: String,
}

impl From<&str> for ActivityType {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

/// Fully resolved configuration for scheduling one activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteActivityParameters {
    /// Callers may choose an id. When unset the scheduling layer assigns one.
    pub activity_id: Option<String>,
    pub activity_type: ActivityType,
    pub task_list_name: String,
    /// Encoded activity arguments
    pub input: Vec<u8>,
    pub schedule_to_close_timeout_seconds: i32,
    pub schedule_to_start_timeout_seconds: i32,
    pub start_to_close_timeout_seconds: i32,
    pub heartbeat_timeout_seconds: i32,
    pub wait_for_cancellation: bool,
}

impl ExecuteActivityParameters {
    /// Checks these parameters are fit to be scheduled. Runs right before scheduling, since
    /// options may be filled in incrementally.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            (
                "schedule_to_start_timeout_seconds",
                self.schedule_to_start_timeout_seconds,
            ),
            (
                "schedule_to_close_timeout_seconds",
                self.schedule_to_close_timeout_seconds,
            ),
            (
                "start_to_close_timeout_seconds",
                self.start_to_close_timeout_seconds,
            ),
        ] {
            if value <= 0 {
                return Err(ValidationError::InvalidTimeout { field, value });
            }
        }
        Ok(())
    }
}

/// Validates possibly-absent parameters, returning an owned copy ready for scheduling
pub fn validate_activity_parameters(
    params: Option<&ExecuteActivityParameters>,
) -> Result<ExecuteActivityParameters, ValidationError> {
    let params = params.ok_or(ValidationError::NotConfigured)?;
    params.validate()?;
    Ok(params.clone())
}

/// The options a caller explicitly set. Only set fields override inherited values when applied to
/// an [OptionChain].
///
/// ```
/// use std::time::Duration;
/// use workflow_activity_core::{ActivityOptions, OptionChain};
///
/// let chain = OptionChain::default().with_activity_options(
///     &ActivityOptions::new()
///         .task_list("example-task-list")
///         .schedule_to_close_timeout(Duration::from_secs(10))
///         .schedule_to_start_timeout(Duration::from_secs(5))
///         .start_to_close_timeout(Duration::from_secs(5)),
/// );
/// assert!(chain.build_invocation_parameters().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityOptions {
    activity_id: Option<String>,
    task_list_name: Option<String>,
    schedule_to_close_timeout_seconds: Option<i32>,
    schedule_to_start_timeout_seconds: Option<i32>,
    start_to_close_timeout_seconds: Option<i32>,
    heartbeat_timeout_seconds: Option<i32>,
    wait_for_cancellation: Option<bool>,
}

impl ActivityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity_id(mut self, id: impl Into<String>) -> Self {
        self.activity_id = Some(id.into());
        self
    }

    pub fn task_list(mut self, name: impl Into<String>) -> Self {
        self.task_list_name = Some(name.into());
        self
    }

    /// Total time the caller is willing to wait for the activity, queued and running
    pub fn schedule_to_close_timeout(mut self, d: Duration) -> Self {
        self.schedule_to_close_timeout_seconds = Some(whole_seconds(d));
        self
    }

    /// Time the activity may sit queued before a worker picks it up
    pub fn schedule_to_start_timeout(mut self, d: Duration) -> Self {
        self.schedule_to_start_timeout_seconds = Some(whole_seconds(d));
        self
    }

    /// Maximum time of a single running attempt
    pub fn start_to_close_timeout(mut self, d: Duration) -> Self {
        self.start_to_close_timeout_seconds = Some(whole_seconds(d));
        self
    }

    pub fn heartbeat_timeout(mut self, d: Duration) -> Self {
        self.heartbeat_timeout_seconds = Some(whole_seconds(d));
        self
    }

    pub fn wait_for_cancellation(mut self, wait: bool) -> Self {
        self.wait_for_cancellation = Some(wait);
        self
    }

    fn apply_to(&self, params: &mut ExecuteActivityParameters) {
        if let Some(tl) = &self.task_list_name {
            params.task_list_name = tl.clone();
        }
        if let Some(t) = self.schedule_to_close_timeout_seconds {
            params.schedule_to_close_timeout_seconds = t;
        }
        if let Some(t) = self.start_to_close_timeout_seconds {
            params.start_to_close_timeout_seconds = t;
        }
        if let Some(t) = self.schedule_to_start_timeout_seconds {
            params.schedule_to_start_timeout_seconds = t;
        }
        if let Some(t) = self.heartbeat_timeout_seconds {
            params.heartbeat_timeout_seconds = t;
        }
        if let Some(w) = self.wait_for_cancellation {
            params.wait_for_cancellation = w;
        }
        if let Some(id) = &self.activity_id {
            params.activity_id = Some(id.clone());
        }
    }
}

/// Durations are carried as whole seconds, truncating any fraction and saturating at `i32::MAX`
fn whole_seconds(d: Duration) -> i32 {
    i32::try_from(d.as_secs()).unwrap_or(i32::MAX)
}

/// Immutable, append-only chain of activity configuration. Cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct OptionChain {
    node: Option<Arc<ChainNode>>,
}

#[derive(Debug)]
struct ChainNode {
    parent: Option<Arc<ChainNode>>,
    activity_params: Option<Arc<ExecuteActivityParameters>>,
}

impl OptionChain {
    /// Returns a new, empty layer on top of this chain. It inherits everything.
    pub fn child(&self) -> Self {
        self.push(None)
    }

    /// Returns a new layer holding this chain's effective parameters overlaid with every field
    /// set in `options`
    pub fn with_activity_options(&self, options: &ActivityOptions) -> Self {
        let mut params = self.resolve().cloned().unwrap_or_default();
        options.apply_to(&mut params);
        self.push(Some(Arc::new(params)))
    }

    pub fn with_activity_id(&self, id: impl Into<String>) -> Self {
        self.with_activity_options(&ActivityOptions::new().activity_id(id))
    }

    pub fn with_task_list(&self, name: impl Into<String>) -> Self {
        self.with_activity_options(&ActivityOptions::new().task_list(name))
    }

    pub fn with_schedule_to_close_timeout(&self, d: Duration) -> Self {
        self.with_activity_options(&ActivityOptions::new().schedule_to_close_timeout(d))
    }

    pub fn with_schedule_to_start_timeout(&self, d: Duration) -> Self {
        self.with_activity_options(&ActivityOptions::new().schedule_to_start_timeout(d))
    }

    pub fn with_start_to_close_timeout(&self, d: Duration) -> Self {
        self.with_activity_options(&ActivityOptions::new().start_to_close_timeout(d))
    }

    pub fn with_heartbeat_timeout(&self, d: Duration) -> Self {
        self.with_activity_options(&ActivityOptions::new().heartbeat_timeout(d))
    }

    pub fn with_wait_for_cancellation(&self, wait: bool) -> Self {
        self.with_activity_options(&ActivityOptions::new().wait_for_cancellation(wait))
    }

    /// Walks from the nearest layer outward and returns the first parameters found
    pub fn resolve(&self) -> Option<&ExecuteActivityParameters> {
        let mut cur = self.node.as_deref();
        while let Some(node) = cur {
            if let Some(params) = &node.activity_params {
                return Some(params);
            }
            cur = node.parent.as_deref();
        }
        None
    }

    /// Resolves and validates the parameters, as the scheduling layer does right before issuing a
    /// schedule request
    pub fn build_invocation_parameters(
        &self,
    ) -> Result<ExecuteActivityParameters, ValidationError> {
        validate_activity_parameters(self.resolve())
    }

    fn push(&self, activity_params: Option<Arc<ExecuteActivityParameters>>) -> Self {
        Self {
            node: Some(Arc::new(ChainNode {
                parent: self.node.clone(),
                activity_params,
            })),
        }
    }
}
