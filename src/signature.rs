//! Checks call sites and declared results against a callable's [FunctionSignature].

use crate::{
    errors::SignatureError,
    types::{ContextKind, FunctionSignature, ReturnShape, TypeTag},
    value::Value,
};

/// Confirms that `args` can be used to call the callable described by `callable`.
///
/// A leading parameter whose type is the context matching the caller's flavor (workflow context
/// when `is_workflow`, activity context otherwise) is skipped and not counted against `args`.
/// Every other declared parameter must be matched by exactly one argument, in order, whose value
/// conforms to the declared type. Optional and variadic arguments are not supported.
pub fn validate_call_args(
    callable: &TypeTag,
    is_workflow: bool,
    args: &[Value],
) -> Result<(), SignatureError> {
    validate_signature_args(callable_signature(callable)?, is_workflow, args)
}

/// Returns the signature of a callable descriptor, or an error if it is not a function
pub fn callable_signature(callable: &TypeTag) -> Result<&FunctionSignature, SignatureError> {
    match callable {
        TypeTag::Function(sig) => Ok(sig),
        other => Err(SignatureError::NotAFunction(other.clone())),
    }
}

/// Same as [validate_call_args], for a signature already known to be callable
pub fn validate_signature_args(
    sig: &FunctionSignature,
    is_workflow: bool,
    args: &[Value],
) -> Result<(), SignatureError> {
    let skip = leading_context_len(sig, is_workflow);
    let declared = &sig.params[skip..];

    if declared.len() != args.len() {
        return Err(SignatureError::ArgumentCount {
            function: sig.name.clone(),
            expected: declared.len(),
            actual: args.len(),
        });
    }

    for (i, (expected, arg)) in declared.iter().zip(args).enumerate() {
        if !arg.conforms_to(expected) {
            return Err(SignatureError::ArgumentType {
                function: sig.name.clone(),
                index: skip + i + 1,
                actual: arg.type_tag(),
                expected: expected.clone(),
            });
        }
    }
    Ok(())
}

/// Returns 1 if the first declared parameter is the expected context, 0 otherwise
pub(crate) fn leading_context_len(sig: &FunctionSignature, is_workflow: bool) -> usize {
    let kind = if is_workflow {
        ContextKind::Workflow
    } else {
        ContextKind::Activity
    };
    match sig.params.first() {
        Some(first) if first.is_context(kind) => 1,
        _ => 0,
    }
}

/// Confirms a callable returns either a single error, or a result followed by an error
pub fn validate_return_shape(callable: &TypeTag) -> Result<ReturnShape, SignatureError> {
    return_shape(callable_signature(callable)?)
}

pub(crate) fn return_shape(sig: &FunctionSignature) -> Result<ReturnShape, SignatureError> {
    let err_slot = match sig.results.as_slice() {
        [err] | [_, err] => err,
        other => {
            return Err(SignatureError::ReturnArity {
                function: sig.name.clone(),
                count: other.len(),
            })
        }
    };
    if *err_slot != TypeTag::Error {
        return Err(SignatureError::ReturnNotError {
            function: sig.name.clone(),
            found: err_slot.clone(),
        });
    }
    Ok(match sig.results.as_slice() {
        [result, _] => ReturnShape::ResultAndError(result.clone()),
        _ => ReturnShape::ErrorOnly,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn act_ctx() -> TypeTag {
        TypeTag::Context(ContextKind::Activity)
    }

    fn f(params: Vec<TypeTag>) -> TypeTag {
        TypeTag::function(FunctionSignature::new(
            "f",
            params,
            [TypeTag::String, TypeTag::Error],
        ))
    }

    #[test]
    fn not_a_function() {
        assert_matches!(
            validate_call_args(&TypeTag::String, false, &[]),
            Err(SignatureError::NotAFunction(TypeTag::String))
        );
        assert_matches!(
            validate_return_shape(&TypeTag::Int),
            Err(SignatureError::NotAFunction(TypeTag::Int))
        );
    }

    #[rstest]
    #[case::exact(vec![act_ctx(), TypeTag::Int], vec![Value::Int(42)], true)]
    #[case::no_ctx(vec![TypeTag::Int], vec![Value::Int(42)], true)]
    #[case::one_extra(vec![act_ctx(), TypeTag::Int], vec![Value::Int(1), Value::Int(2)], false)]
    #[case::one_missing(vec![act_ctx(), TypeTag::Int], vec![], false)]
    #[case::nothing(vec![act_ctx()], vec![], true)]
    #[case::wrong_ctx_counted(
        vec![TypeTag::Context(ContextKind::Workflow), TypeTag::Int],
        vec![Value::Int(1)],
        false
    )]
    #[case::any(vec![TypeTag::Any, TypeTag::Any], vec![Value::Null, Value::from("s")], true)]
    fn arity(#[case] params: Vec<TypeTag>, #[case] args: Vec<Value>, #[case] ok: bool) {
        assert_eq!(validate_call_args(&f(params), false, &args).is_ok(), ok);
    }

    #[test]
    fn count_mismatch_names_counts() {
        let err = validate_call_args(&f(vec![act_ctx(), TypeTag::Int]), false, &[]).unwrap_err();
        assert_eq!(
            err,
            SignatureError::ArgumentCount {
                function: "f".to_string(),
                expected: 1,
                actual: 0
            }
        );
        assert_eq!(err.to_string(), "Expected 1 args for function `f` but found 0");
    }

    #[test]
    fn context_matching_depends_on_flavor() {
        let wf = f(vec![TypeTag::Context(ContextKind::Workflow), TypeTag::Int]);
        assert!(validate_call_args(&wf, true, &[Value::Int(1)]).is_ok());
        assert!(validate_call_args(&wf, false, &[Value::Int(1)]).is_err());
        let act = f(vec![act_ctx(), TypeTag::Int]);
        assert!(validate_call_args(&act, false, &[Value::Int(1)]).is_ok());
        assert!(validate_call_args(&act, true, &[Value::Int(1)]).is_err());
    }

    #[test]
    fn type_mismatch_names_index_and_types() {
        let callable = f(vec![act_ctx(), TypeTag::Int, TypeTag::String]);
        let err =
            validate_call_args(&callable, false, &[Value::Int(1), Value::Bool(false)]).unwrap_err();
        assert_eq!(
            err,
            SignatureError::ArgumentType {
                function: "f".to_string(),
                index: 3,
                actual: TypeTag::Bool,
                expected: TypeTag::String,
            }
        );
    }

    #[test]
    fn first_mismatch_wins() {
        let callable = f(vec![TypeTag::Int, TypeTag::String]);
        assert_matches!(
            validate_call_args(&callable, false, &[Value::from("a"), Value::Int(1)]),
            Err(SignatureError::ArgumentType { index: 1, .. })
        );
    }

    #[rstest]
    #[case::error_only(vec![TypeTag::Error], Ok(ReturnShape::ErrorOnly))]
    #[case::result_error(
        vec![TypeTag::String, TypeTag::Error],
        Ok(ReturnShape::ResultAndError(TypeTag::String))
    )]
    #[case::none(vec![], Err(()))]
    #[case::three(vec![TypeTag::Int, TypeTag::Int, TypeTag::Error], Err(()))]
    #[case::no_error(vec![TypeTag::String], Err(()))]
    #[case::error_first(vec![TypeTag::Error, TypeTag::String], Err(()))]
    fn return_shapes(#[case] results: Vec<TypeTag>, #[case] expected: Result<ReturnShape, ()>) {
        let callable = TypeTag::function(FunctionSignature::new("g", [], results));
        assert_eq!(validate_return_shape(&callable).map_err(|_| ()), expected);
    }
}
