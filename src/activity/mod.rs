//! The per-execution environment bound into a running activity's context.
//!
//! The dispatch layer calls [ExecutionContext::bind_activity_task] once when an activity task is
//! started. The resulting [ActivityEnvironment] is read-only for the rest of that execution; user
//! code reaches it through [activity_info], [activity_logger] and
//! [heartbeat::record_activity_heartbeat].

pub mod heartbeat;

use crate::{errors::NotActivityContext, options::ActivityType, task_token::TaskToken};
use heartbeat::ServiceInvoker;
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Identifies the workflow run that scheduled an activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WorkflowExecution {
    pub id: String,
    pub run_id: String,
}

/// The parts of an activity task poll response this crate consumes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollActivityTaskResponse {
    pub task_token: Vec<u8>,
    pub activity_id: String,
    pub activity_type: ActivityType,
    pub workflow_execution: WorkflowExecution,
    /// Encoded activity arguments
    pub input: Vec<u8>,
}

/// Information about the currently executing activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityInfo {
    pub task_token: TaskToken,
    pub workflow_execution: WorkflowExecution,
    pub activity_id: String,
    pub activity_type: ActivityType,
}

/// Identity and capabilities of one activity execution. Created once by the dispatch layer and
/// never mutated.
pub struct ActivityEnvironment {
    task_token: TaskToken,
    workflow_execution: WorkflowExecution,
    activity_id: String,
    activity_type: ActivityType,
    service_invoker: Arc<dyn ServiceInvoker>,
    logger: Span,
    /// Cancels the activity's own scope, used when heartbeating learns it was cancelled
    cancellation: CancellationToken,
}

impl ActivityEnvironment {
    pub fn info(&self) -> ActivityInfo {
        ActivityInfo {
            task_token: self.task_token.clone(),
            workflow_execution: self.workflow_execution.clone(),
            activity_id: self.activity_id.clone(),
            activity_type: self.activity_type.clone(),
        }
    }

    pub fn task_token(&self) -> &TaskToken {
        &self.task_token
    }

    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    pub fn activity_type(&self) -> &ActivityType {
        &self.activity_type
    }

    pub fn workflow_execution(&self) -> &WorkflowExecution {
        &self.workflow_execution
    }

    pub fn logger(&self) -> &Span {
        &self.logger
    }

    pub(crate) fn service_invoker(&self) -> &dyn ServiceInvoker {
        self.service_invoker.as_ref()
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Debug for ActivityEnvironment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityEnvironment")
            .field("task_token", &self.task_token)
            .field("workflow_execution", &self.workflow_execution)
            .field("activity_id", &self.activity_id)
            .field("activity_type", &self.activity_type)
            .finish_non_exhaustive()
    }
}

/// Handle passed to code running on behalf of a workflow or activity. Carries a cooperative
/// cancellation scope and, inside activities, the bound [ActivityEnvironment]. Cloning is cheap
/// and clones share the same scope.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cancellation: CancellationToken,
    activity: Option<Arc<ActivityEnvironment>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context whose scope is the provided token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            activity: None,
        }
    }

    /// Returns a context in a nested scope. Cancelling this context cancels the child, but not
    /// the other way around.
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            activity: self.activity.clone(),
        }
    }

    /// Derives a child context with an [ActivityEnvironment] built from the polled task
    pub fn bind_activity_task(
        &self,
        task: &PollActivityTaskResponse,
        invoker: Arc<dyn ServiceInvoker>,
        logger: Span,
    ) -> Self {
        let cancellation = self.cancellation.child_token();
        let env = ActivityEnvironment {
            task_token: TaskToken(task.task_token.clone()),
            workflow_execution: task.workflow_execution.clone(),
            activity_id: task.activity_id.clone(),
            activity_type: task.activity_type.clone(),
            service_invoker: invoker,
            logger,
            cancellation: cancellation.clone(),
        };
        Self {
            cancellation,
            activity: Some(Arc::new(env)),
        }
    }

    /// Returns the bound activity environment, or an error outside of activity executions
    pub fn activity_environment(&self) -> Result<&ActivityEnvironment, NotActivityContext> {
        self.activity.as_deref().ok_or(NotActivityContext)
    }

    pub fn cancel(&self) {
        self.cancellation.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Completes once this context has been cancelled
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// Builds the span used as an activity's logger, carrying its identity as fields
pub fn activity_span(task: &PollActivityTaskResponse) -> Span {
    info_span!(
        "activity",
        activity_id = %task.activity_id,
        activity_type = %task.activity_type,
        workflow_id = %task.workflow_execution.id,
        run_id = %task.workflow_execution.run_id,
    )
}

/// Information about the activity executing in `ctx`
pub fn activity_info(ctx: &ExecutionContext) -> Result<ActivityInfo, NotActivityContext> {
    Ok(ctx.activity_environment()?.info())
}

/// The logger bound to the activity executing in `ctx`
pub fn activity_logger(ctx: &ExecutionContext) -> Result<Span, NotActivityContext> {
    Ok(ctx.activity_environment()?.logger().clone())
}

/// Like [activity_info], for top-level activity code which knows it runs inside an activity.
///
/// # Panics
/// If `ctx` is not an activity context
pub fn current_activity_info(ctx: &ExecutionContext) -> ActivityInfo {
    match activity_info(ctx) {
        Ok(info) => info,
        Err(e) => panic!("{}", e),
    }
}

/// Like [activity_logger], panicking outside of activities
pub fn current_activity_logger(ctx: &ExecutionContext) -> Span {
    match activity_logger(ctx) {
        Ok(logger) => logger,
        Err(e) => panic!("{}", e),
    }
}
