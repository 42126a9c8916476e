use crate::types::TypeTag;

/// Errors thrown while turning values into payloads or back
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum SerializationError {
    /// Values of kind `{kind}` cannot be serialized
    Unsupported {
        /// The offending kind
        kind: TypeTag,
    },
    /// Float values must be finite to be represented: {0}
    NonFiniteFloat(f64),
    /// Values nested deeper than {max} containers cannot be serialized
    NestingTooDeep {
        /// Deepest nesting allowed
        max: usize,
    },
    /// Payload has missing or unknown encoding: {0:?}
    WrongEncoding(Option<String>),
    /// Malformed payload envelope: {0}
    Envelope(#[from] prost::DecodeError),
    /// Malformed payload data: {0}
    Json(#[from] serde_json::Error),
    /// Expected {expected} values in payload but found {actual}
    ArityMismatch {
        /// How many the target descriptor declares
        expected: usize,
        /// How many were actually decoded
        actual: usize,
    },
    /// Decoded value {index} has type `{actual}` which does not conform to `{expected}`
    TypeMismatch {
        /// One-based position in the payload list
        index: usize,
        /// Declared type
        expected: TypeTag,
        /// Runtime type of the decoded value
        actual: TypeTag,
    },
}

/// Errors thrown when a call site does not match the declared signature of a callable
#[derive(thiserror::Error, Debug, displaydoc::Display, PartialEq)]
pub enum SignatureError {
    /// Provided type `{0}` is not a function type
    NotAFunction(TypeTag),
    /// Expected {expected} args for function `{function}` but found {actual}
    ArgumentCount {
        /// Function name
        function: String,
        /// Declared parameter count, excluding a leading context
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },
    /// Cannot assign argument {index} of function `{function}` from type `{actual}` to type `{expected}`
    ArgumentType {
        /// Function name
        function: String,
        /// One-based position of the offending parameter in the declaration
        index: usize,
        /// Runtime type of the supplied argument
        actual: TypeTag,
        /// Declared parameter type
        expected: TypeTag,
    },
    /// Function `{function}` returns {count} results, it must return either error or (result, error)
    ReturnArity {
        /// Function name
        function: String,
        /// Declared result count
        count: usize,
    },
    /// The last result of function `{function}` must be an error but is `{found}`
    ReturnNotError {
        /// Function name
        function: String,
        /// Declared type in the error slot
        found: TypeTag,
    },
}

/// Errors thrown by [crate::ActivityRegistry::register]
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum RegistrationError {
    /// Activity `{0}` is already registered
    AlreadyRegistered(String),
    /// Activities must have a non-empty name
    EmptyName,
    /// Activity `{0}` has no implementation and cannot be registered
    MissingHandler(String),
    /// Invalid activity signature: {0}
    InvalidSignature(#[from] SignatureError),
    /// Parameter {index} of activity `{function}` has type `{ty}` which cannot be serialized
    UnsupportedParameter {
        /// Activity name
        function: String,
        /// One-based position in the declaration
        index: usize,
        /// Declared type
        ty: TypeTag,
    },
    /// Activity `{function}` returns type `{ty}` which cannot be serialized
    UnsupportedResult {
        /// Activity name
        function: String,
        /// Declared result type
        ty: TypeTag,
    },
    /// Parameter {index} of activity `{function}` is a context, which is only allowed first
    MisplacedContext {
        /// Activity name
        function: String,
        /// One-based position in the declaration
        index: usize,
    },
}

/// Errors thrown when the resolved activity parameters are not fit for scheduling
#[derive(thiserror::Error, Debug, displaydoc::Display, PartialEq, Eq)]
pub enum ValidationError {
    /// Activity parameters were never configured, a task list is required
    NotConfigured,
    /// Missing or negative {field}: {value}
    InvalidTimeout {
        /// Name of the offending parameter
        field: &'static str,
        /// The value it held
        value: i32,
    },
}

/// Not an activity context
#[derive(thiserror::Error, Debug, displaydoc::Display, Clone, Copy, PartialEq, Eq)]
pub struct NotActivityContext;

/// Errors returned by a [crate::ServiceInvoker]
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum InvokerError {
    /// The activity was cancelled or is no longer known to the service
    Cancelled,
    /// Error talking to the service: {0:?}
    Transport(anyhow::Error),
}

/// Errors thrown by [crate::record_activity_heartbeat]. Cancellation is never reported here, it
/// is observed through the execution context.
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum HeartbeatError {
    /// Heartbeat recorded outside of an activity: {0}
    NotActivityContext(#[from] NotActivityContext),
    /// Heartbeat details could not be serialized: {0}
    Serialization(#[from] SerializationError),
}

/// Errors thrown while executing a registered activity against an encoded input
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum ActivityExecutionError {
    /// Activity `{0}` was declared without an implementation
    NotImplemented(String),
    /// Activity signature is invalid: {0}
    Signature(#[from] SignatureError),
    /// Activity input could not be decoded: {0}
    Input(SerializationError),
    /// Activity result could not be encoded: {0}
    Output(SerializationError),
    /// Activity `{activity}` returned a value but declares only an error result
    UnexpectedResult {
        /// Activity name
        activity: String,
    },
    /// Activity failed: {0:?}
    Failed(anyhow::Error),
}

/// Errors thrown while preparing an activity invocation or interpreting its result
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum InvocationError {
    /// Invalid activity parameters: {0}
    Validation(#[from] ValidationError),
    /// Arguments do not match the activity: {0}
    Signature(#[from] SignatureError),
    /// Arguments or results could not be (de)serialized: {0}
    Serialization(#[from] SerializationError),
}
