//! Activity invocation plumbing for workflow clients.
//!
//! Covers the parts of running activities that do not depend on a particular transport: a
//! self-describing codec for arguments and results, validation of call sites against declared
//! signatures, a registry mapping activity names to implementations, the layered per-invocation
//! option chain, and the execution environment (identity, logger and heartbeat channel) bound
//! into a running activity's context.

#[macro_use]
extern crate tracing;

pub mod activity;
pub mod codec;
pub mod errors;
pub mod invocation;
pub mod options;
pub mod registry;
pub mod signature;
mod task_token;
pub mod telemetry;
pub mod types;
pub mod value;

pub use activity::{
    activity_info, activity_logger, activity_span, current_activity_info, current_activity_logger,
    heartbeat::{record_activity_heartbeat, ServiceInvoker},
    ActivityEnvironment, ActivityInfo, ExecutionContext, PollActivityTaskResponse,
    WorkflowExecution,
};
pub use codec::{Payload, Payloads};
pub use invocation::{
    decode_activity_result, encode_activity_result, prepare_activity, ActivityTarget,
};
pub use options::{
    validate_activity_parameters, ActivityOptions, ActivityType, ExecuteActivityParameters,
    OptionChain,
};
pub use registry::{register_activity, ActivityFunction, ActivityRegistry};
pub use signature::{validate_call_args, validate_return_shape};
pub use task_token::TaskToken;
pub use telemetry::{telemetry_init, TelemetryOptions, TelemetryOptionsBuilder};
pub use types::{ContextKind, FunctionSignature, ReturnShape, TypeTag};
pub use value::Value;
