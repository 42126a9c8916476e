//! Maps activity names to their declared signature and implementation.
//!
//! A registry is populated while the process initializes and is read-only afterwards. Share it
//! behind an `Arc` once registration is done; no locking is needed to read it.

use crate::{
    activity::ExecutionContext,
    codec,
    errors::{ActivityExecutionError, RegistrationError, SerializationError, SignatureError},
    signature::{leading_context_len, return_shape},
    types::{ContextKind, FunctionSignature, ReturnShape, TypeTag},
    value::Value,
};
use futures::future::{BoxFuture, FutureExt};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    future::Future,
    sync::Arc,
};

type ActivityResult = Result<Option<Value>, anyhow::Error>;
type ActivityHandler =
    dyn Fn(ExecutionContext, Vec<Value>) -> BoxFuture<'static, ActivityResult> + Send + Sync;

/// An activity's declared signature together with (optionally) its implementation.
///
/// The handler receives the decoded arguments, excluding the leading context parameter if one is
/// declared, and returns the result value. Activities whose only result is an error return
/// `Ok(None)`.
#[derive(Clone)]
pub struct ActivityFunction {
    signature: FunctionSignature,
    handler: Option<Arc<ActivityHandler>>,
}

impl ActivityFunction {
    pub fn new<F, Fut>(signature: FunctionSignature, handler: F) -> Self
    where
        F: Fn(ExecutionContext, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Value>, anyhow::Error>> + Send + 'static,
    {
        Self {
            signature,
            handler: Some(Arc::new(move |ctx: ExecutionContext, args: Vec<Value>| {
                handler(ctx, args).boxed()
            })),
        }
    }

    /// Describes an activity implemented elsewhere. It can be invoked by reference but not
    /// registered or executed here.
    pub fn declared(signature: FunctionSignature) -> Self {
        Self {
            signature,
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    /// The callable descriptor for this activity
    pub fn type_tag(&self) -> TypeTag {
        TypeTag::function(self.signature.clone())
    }

    pub fn return_shape(&self) -> Result<ReturnShape, SignatureError> {
        return_shape(&self.signature)
    }

    /// Runs the activity against an encoded input, returning the encoded result if the activity
    /// declares one
    pub async fn execute(
        &self,
        ctx: ExecutionContext,
        input: &[u8],
    ) -> Result<Option<Vec<u8>>, ActivityExecutionError> {
        let handler = self
            .handler
            .as_ref()
            .ok_or_else(|| ActivityExecutionError::NotImplemented(self.name().to_owned()))?;
        let shape = self.return_shape()?;
        let skip = leading_context_len(&self.signature, false);
        let args = codec::decode_args(input, &self.signature.params[skip..])
            .map_err(ActivityExecutionError::Input)?;

        debug!(activity = %self.name(), "Executing activity");
        let result = handler(ctx, args)
            .await
            .map_err(ActivityExecutionError::Failed)?;

        match (shape, result) {
            (ReturnShape::ErrorOnly, None) => Ok(None),
            (ReturnShape::ErrorOnly, Some(_)) => Err(ActivityExecutionError::UnexpectedResult {
                activity: self.name().to_owned(),
            }),
            (ReturnShape::ResultAndError(expected), result) => {
                let result = result.unwrap_or(Value::Null);
                if !result.conforms_to(&expected) {
                    return Err(ActivityExecutionError::Output(
                        SerializationError::TypeMismatch {
                            index: 1,
                            expected,
                            actual: result.type_tag(),
                        },
                    ));
                }
                codec::encode_one(&result)
                    .map(Some)
                    .map_err(ActivityExecutionError::Output)
            }
        }
    }
}

impl Debug for ActivityFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityFunction")
            .field("signature", &self.signature)
            .field("implemented", &self.handler.is_some())
            .finish()
    }
}

/// Table of registered activities, keyed by name
#[derive(Debug, Clone, Default)]
pub struct ActivityRegistry {
    activities: HashMap<String, Arc<ActivityFunction>>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers an activity. Fails if its signature is unusable or another
    /// activity already uses its name.
    pub fn register(
        &mut self,
        function: ActivityFunction,
    ) -> Result<Arc<ActivityFunction>, RegistrationError> {
        validate_registration(&function)?;
        if self.activities.contains_key(function.name()) {
            return Err(RegistrationError::AlreadyRegistered(
                function.name().to_owned(),
            ));
        }
        debug!(activity = %function.signature, "Registered activity");
        let function = Arc::new(function);
        self.activities
            .insert(function.name().to_owned(), function.clone());
        Ok(function)
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<ActivityFunction>> {
        self.activities.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.activities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Registers an activity during process start-up.
///
/// # Panics
/// If the activity cannot be registered. A bad registration is a programming error and start-up
/// must not continue.
pub fn register_activity(registry: &mut ActivityRegistry, function: ActivityFunction) {
    if let Err(e) = registry.register(function) {
        panic!("Failed to register activity: {}", e);
    }
}

fn validate_registration(function: &ActivityFunction) -> Result<(), RegistrationError> {
    let sig = function.signature();
    if sig.name.is_empty() {
        return Err(RegistrationError::EmptyName);
    }
    if function.handler.is_none() {
        return Err(RegistrationError::MissingHandler(sig.name.clone()));
    }
    let shape = return_shape(sig)?;

    for (i, param) in sig.params.iter().enumerate() {
        if i == 0 && param.is_context(ContextKind::Activity) {
            continue;
        }
        if matches!(param, TypeTag::Context(_)) && i > 0 {
            return Err(RegistrationError::MisplacedContext {
                function: sig.name.clone(),
                index: i + 1,
            });
        }
        if !param.is_serializable() {
            return Err(RegistrationError::UnsupportedParameter {
                function: sig.name.clone(),
                index: i + 1,
                ty: param.clone(),
            });
        }
    }

    match shape.result_type() {
        Some(ty) if !ty.is_serializable() => Err(RegistrationError::UnsupportedResult {
            function: sig.name.clone(),
            ty: ty.clone(),
        }),
        _ => Ok(()),
    }
}
