use super::ExecutionContext;
use crate::{
    codec,
    errors::{HeartbeatError, InvokerError},
    value::Value,
};

/// Abstracts calls to the orchestration service made on behalf of a running activity. Implement
/// it to unit test activities.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ServiceInvoker: Send + Sync {
    /// Report liveness with encoded progress `details`. Returns [InvokerError::Cancelled] if the
    /// activity was cancelled, or if the service no longer knows about it.
    async fn heartbeat(&self, details: Vec<u8>) -> Result<(), InvokerError>;
}

/// Sends a heartbeat for the activity executing in `ctx`.
///
/// If the service reports the activity as cancelled (or no longer existing) the activity's
/// context is cancelled, and callers must check [ExecutionContext::is_cancelled] to notice. Any
/// other failure is logged and dropped. Only misuse is reported as an error: calling this outside
/// of an activity, or passing details that cannot be serialized.
pub async fn record_activity_heartbeat(
    ctx: &ExecutionContext,
    details: &[Value],
) -> Result<(), HeartbeatError> {
    let env = ctx.activity_environment()?;
    let data = codec::encode_args(details)?;
    match env.service_invoker().heartbeat(data).await {
        Ok(()) => {}
        Err(InvokerError::Cancelled) => {
            debug!(parent: env.logger(), "Activity cancelled while heartbeating");
            env.cancellation().cancel();
        }
        Err(InvokerError::Transport(e)) => {
            debug!(parent: env.logger(), error = ?e, "Error when recording heartbeat");
        }
    }
    Ok(())
}
