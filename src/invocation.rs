//! Turns a call site (an activity plus its arguments) into scheduling parameters, and an encoded
//! activity result back into a value.

use crate::{
    codec,
    errors::{InvocationError, SignatureError},
    options::{ActivityType, ExecuteActivityParameters, OptionChain},
    registry::{ActivityFunction, ActivityRegistry},
    signature::{callable_signature, return_shape, validate_signature_args},
    types::{FunctionSignature, ReturnShape, TypeTag},
    value::Value,
};
use std::sync::Arc;

/// The activity a call site refers to
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityTarget {
    /// A callable descriptor. Anything other than [TypeTag::Function] is rejected.
    Callable(TypeTag),
    /// A registered name, or the name of an activity implemented by another process
    Name(String),
}

impl From<FunctionSignature> for ActivityTarget {
    fn from(sig: FunctionSignature) -> Self {
        Self::Callable(TypeTag::function(sig))
    }
}

impl From<&ActivityFunction> for ActivityTarget {
    fn from(f: &ActivityFunction) -> Self {
        Self::Callable(f.type_tag())
    }
}

impl From<&Arc<ActivityFunction>> for ActivityTarget {
    fn from(f: &Arc<ActivityFunction>) -> Self {
        Self::from(f.as_ref())
    }
}

impl From<&str> for ActivityTarget {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ActivityTarget {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl ActivityTarget {
    /// The signature this target is checked against, if one is known
    fn signature<'a>(
        &'a self,
        registry: &'a ActivityRegistry,
    ) -> Result<Option<&'a FunctionSignature>, InvocationError> {
        Ok(match self {
            ActivityTarget::Callable(tag) => Some(callable_signature(tag)?),
            ActivityTarget::Name(name) => registry.resolve(name).map(|f| f.signature()),
        })
    }
}

/// Resolves and validates the configuration in `chain`, checks `args` against the target and
/// returns parameters ready to be scheduled.
///
/// Activities referenced by a name the registry does not know are assumed to be implemented
/// elsewhere, and their arguments are only checked for serializability.
pub fn prepare_activity(
    registry: &ActivityRegistry,
    chain: &OptionChain,
    target: &ActivityTarget,
    args: &[Value],
) -> Result<ExecuteActivityParameters, InvocationError> {
    let mut params = chain.build_invocation_parameters()?;
    let activity_type = match (target.signature(registry)?, target) {
        (Some(sig), _) => {
            validate_signature_args(sig, false, args)?;
            ActivityType::from(sig.name.as_str())
        }
        (None, ActivityTarget::Name(name)) => {
            debug!(activity = %name, "Scheduling activity not known to this registry");
            ActivityType::from(name.as_str())
        }
        (None, ActivityTarget::Callable(tag)) => {
            return Err(SignatureError::NotAFunction(tag.clone()).into())
        }
    };
    params.input = codec::encode_args(args)?;
    params.activity_type = activity_type;
    Ok(params)
}

/// Decodes the encoded result of a completed activity. Returns `None` for activities that
/// declare only an error result, or when no result was recorded.
pub fn decode_activity_result(
    registry: &ActivityRegistry,
    target: &ActivityTarget,
    result: Option<&[u8]>,
) -> Result<Option<Value>, InvocationError> {
    let expected = match target.signature(registry)? {
        Some(sig) => match return_shape(sig)? {
            ReturnShape::ErrorOnly => return Ok(None),
            ReturnShape::ResultAndError(ty) => ty,
        },
        None => TypeTag::Any,
    };
    match result {
        Some(data) => Ok(Some(codec::decode_one(data, &expected)?)),
        None => Ok(None),
    }
}

/// Encodes an activity's result for reporting to the service. `None` means the activity returned
/// only an error slot.
pub fn encode_activity_result(value: Option<&Value>) -> Result<Option<Vec<u8>>, InvocationError> {
    value
        .map(codec::encode_one)
        .transpose()
        .map_err(Into::into)
}
