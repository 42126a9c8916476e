use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use workflow_activity_core::{
    codec, current_activity_info,
    errors::{InvocationError, InvokerError, SignatureError, ValidationError},
    record_activity_heartbeat, register_activity, ActivityFunction, ActivityOptions,
    ActivityRegistry, ActivityTarget, ContextKind, ExecutionContext, FunctionSignature,
    OptionChain, PollActivityTaskResponse, ServiceInvoker, TypeTag, Value, WorkflowExecution,
};

/// Records every heartbeat, and reports cancellation once `cancel_after` heartbeats were seen
#[derive(Default)]
struct FakeService {
    heartbeats: Mutex<Vec<Vec<Value>>>,
    cancel_after: Option<usize>,
}

#[async_trait::async_trait]
impl ServiceInvoker for FakeService {
    async fn heartbeat(&self, details: Vec<u8>) -> Result<(), InvokerError> {
        let mut hbs = self.heartbeats.lock().unwrap();
        hbs.push(codec::decode_untyped(&details).unwrap());
        match self.cancel_after {
            Some(n) if hbs.len() >= n => Err(InvokerError::Cancelled),
            _ => Ok(()),
        }
    }
}

fn format_sig() -> FunctionSignature {
    FunctionSignature::new(
        "format_order",
        [TypeTag::Context(ContextKind::Activity), TypeTag::Int],
        [TypeTag::String, TypeTag::Error],
    )
}

fn registry() -> ActivityRegistry {
    let mut reg = ActivityRegistry::new();
    register_activity(
        &mut reg,
        ActivityFunction::new(format_sig(), |ctx, args| async move {
            let info = current_activity_info(&ctx);
            assert_eq!(info.activity_type.name, "format_order");
            record_activity_heartbeat(&ctx, &[Value::from("started")]).await?;
            if ctx.is_cancelled() {
                anyhow::bail!("cancelled");
            }
            Ok(Some(Value::from(if args == vec![Value::Int(42)] {
                "ok"
            } else {
                "unexpected"
            })))
        }),
    );
    reg
}

fn chain() -> OptionChain {
    OptionChain::default().with_activity_options(
        &ActivityOptions::new()
            .task_list("q")
            .schedule_to_close_timeout(Duration::from_secs(5))
            .schedule_to_start_timeout(Duration::from_secs(5))
            .start_to_close_timeout(Duration::from_secs(5)),
    )
}

fn task_for(input: Vec<u8>) -> PollActivityTaskResponse {
    PollActivityTaskResponse {
        task_token: b"token".to_vec(),
        activity_id: "1".to_string(),
        activity_type: "format_order".into(),
        workflow_execution: WorkflowExecution {
            id: "wf".to_string(),
            run_id: "run".to_string(),
        },
        input,
    }
}

#[tokio::test]
async fn schedule_execute_and_decode() {
    let reg = registry();
    let target = ActivityTarget::from("format_order");
    let params =
        workflow_activity_core::prepare_activity(&reg, &chain(), &target, &[Value::Int(42)])
            .unwrap();
    assert_eq!(params.task_list_name, "q");
    assert_eq!(params.schedule_to_start_timeout_seconds, 5);
    assert_eq!(params.activity_type.name, "format_order");
    assert_eq!(
        codec::decode_args(&params.input, &[TypeTag::Int]).unwrap(),
        vec![Value::Int(42)]
    );

    let service = Arc::new(FakeService::default());
    let task = task_for(params.input.clone());
    let ctx = ExecutionContext::new().bind_activity_task(
        &task,
        service.clone(),
        workflow_activity_core::activity_span(&task),
    );
    let activity = reg.resolve(&task.activity_type.name).unwrap();
    let result = activity.execute(ctx, &task.input).await.unwrap();

    let decoded =
        workflow_activity_core::decode_activity_result(&reg, &target, result.as_deref()).unwrap();
    assert_eq!(decoded, Some(Value::from("ok")));
    assert_eq!(
        *service.heartbeats.lock().unwrap(),
        vec![vec![Value::from("started")]]
    );
}

#[tokio::test]
async fn cancellation_observed_through_heartbeat() {
    let reg = registry();
    let input = codec::encode_args(&[Value::Int(42)]).unwrap();
    let service = Arc::new(FakeService {
        cancel_after: Some(1),
        ..Default::default()
    });
    let base = ExecutionContext::new();
    let ctx = base.bind_activity_task(&task_for(input.clone()), service, tracing::Span::none());
    let err = reg
        .resolve("format_order")
        .unwrap()
        .execute(ctx.clone(), &input)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("cancelled"));
    assert!(ctx.is_cancelled());
    assert!(!base.is_cancelled());
}

#[test]
fn bad_calls_are_rejected_before_scheduling() {
    let reg = registry();
    let target: ActivityTarget = format_sig().into();
    let err = workflow_activity_core::prepare_activity(
        &reg,
        &chain(),
        &target,
        &[Value::from("forty-two")],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InvocationError::Signature(SignatureError::ArgumentType { index: 2, .. })
    ));

    let no_timeouts = OptionChain::default().with_task_list("q");
    let err = workflow_activity_core::prepare_activity(
        &reg,
        &no_timeouts,
        &target,
        &[Value::Int(42)],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InvocationError::Validation(ValidationError::InvalidTimeout {
            field: "schedule_to_start_timeout_seconds",
            value: 0
        })
    ));
}
