//! 全链路集成测试：上下文装配、循环依赖中的代理织入与关闭清扫

use aop_runtime::{
    dispatch, MethodInvocation, NamePatternPointcut, PointcutAdvisor, WovenProxy,
};
use app_context::ContextBuilder;
use container_core::{
    ComponentDefinition, ContainerError, PropertyValue, TypeDescriptor, Value,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Default)]
struct Service {
    peer: Mutex<Option<Value>>,
    handled: AtomicUsize,
}

fn service_definition(peer_name: &str) -> Arc<ComponentDefinition> {
    let descriptor = TypeDescriptor::builder::<Service>()
        .constructor(0, |_| Ok(Service::default()))
        .setter("peer", |service: &Service, value| {
            *service.peer.lock() = Some(value);
            Ok(())
        })
        .method("handle", |service: &Service, _args| {
            service.handled.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
        .build();
    Arc::new(
        ComponentDefinition::new(descriptor).with_binding("peer", PropertyValue::reference(peer_name)),
    )
}

fn advisor_definition(
    patterns: &'static [&'static str],
    intercepted: Arc<AtomicUsize>,
) -> Arc<ComponentDefinition> {
    let descriptor = TypeDescriptor::builder::<PointcutAdvisor>()
        .constructor(0, move |_| {
            let intercepted = intercepted.clone();
            let interceptor = move |inv: &mut MethodInvocation<'_>| {
                intercepted.fetch_add(1, Ordering::SeqCst);
                inv.proceed()
            };
            Ok(PointcutAdvisor::new(
                NamePatternPointcut::new(patterns.iter().copied()).into_pointcut(),
                Arc::new(interceptor),
            ))
        })
        .build();
    Arc::new(ComponentDefinition::new(descriptor))
}

fn peer_of(service: &Value) -> Value {
    let target = match service.downcast_ref::<WovenProxy>() {
        Some(proxy) => proxy.target().clone(),
        None => service.clone(),
    };
    let peer = target
        .downcast_ref::<Service>()
        .expect("目标应为 Service")
        .peer
        .lock()
        .clone();
    peer.expect("peer 应已注入")
}

#[test]
fn circular_references_round_trip_to_same_instance() -> anyhow::Result<()> {
    init_test_logger();
    let context = ContextBuilder::new()
        .definition("a", service_definition("b"))
        .definition("b", service_definition("a"))
        .build();
    context.refresh()?;

    let a = context.get_component("a")?;
    let b_in_a = peer_of(&a);
    let a_in_b = peer_of(&b_in_a);
    assert!(Arc::ptr_eq(&a_in_b, &a));
    Ok(())
}

#[test]
fn proxy_identity_survives_dependency_cycle() {
    init_test_logger();
    let intercepted = Arc::new(AtomicUsize::new(0));
    let context = ContextBuilder::new()
        .enable_interception()
        .definition("advisor", advisor_definition(&["handle"], intercepted.clone()))
        .definition("a", service_definition("b"))
        .definition("b", service_definition("a"))
        .build();
    context.refresh().unwrap();

    let a = context.get_component("a").unwrap();
    let b = context.get_component("b").unwrap();
    assert!(a.downcast_ref::<WovenProxy>().is_some());
    assert!(b.downcast_ref::<WovenProxy>().is_some());

    // 注入对方的引用与对外暴露的组件是同一个代理
    assert!(Arc::ptr_eq(&peer_of(&a), &b));
    assert!(Arc::ptr_eq(&peer_of(&b), &a));
}

#[test]
fn advised_calls_are_intercepted_and_plain_calls_are_not() {
    let intercepted = Arc::new(AtomicUsize::new(0));
    let context = ContextBuilder::new()
        .enable_interception()
        .definition("advisor", advisor_definition(&["handle"], intercepted.clone()))
        .definition("a", service_definition("b"))
        .definition("b", service_definition("a"))
        .build();
    context.refresh().unwrap();

    let a = context.get_component("a").unwrap();
    let descriptor = service_definition("b").descriptor().clone();

    dispatch(&a, &descriptor, "handle", &[]).unwrap();
    dispatch(&a, &descriptor, "handle", &[]).unwrap();
    assert_eq!(intercepted.load(Ordering::SeqCst), 2);

    // 目标方法确实落在原始实例上
    let target = a.downcast_ref::<WovenProxy>().unwrap().target();
    let service = target.downcast_ref::<Service>().unwrap();
    assert_eq!(service.handled.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_component_reports_not_found_and_leaves_context_usable() {
    let context = ContextBuilder::new()
        .definition("a", {
            let descriptor = TypeDescriptor::builder::<Service>()
                .constructor(0, |_| Ok(Service::default()))
                .build();
            Arc::new(ComponentDefinition::new(descriptor))
        })
        .build();
    context.refresh().unwrap();

    match context.get_component("ghost") {
        Err(ContainerError::NotFound { name }) => assert_eq!(name, "ghost"),
        other => panic!("期望 NotFound, 实际: {:?}", other.map(|_| ())),
    }
    // 失败的检索不得影响既有组件
    assert!(context.get_component("a").is_ok());
}

#[test]
fn close_runs_destroy_hooks_in_reverse_creation_order() {
    let order = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut builder = ContextBuilder::new();
    for name in ["x", "y", "z"] {
        let order = order.clone();
        let descriptor = TypeDescriptor::builder::<Service>()
            .constructor(0, |_| Ok(Service::default()))
            .destroy_hook("shutdown", move |_| {
                order.lock().push(name.to_string());
                Ok(())
            })
            .build();
        builder = builder.definition(name, Arc::new(ComponentDefinition::new(descriptor)));
    }

    let context = builder.build();
    context.refresh().unwrap();
    context.close().unwrap();
    assert_eq!(*order.lock(), vec!["z", "y", "x"]);
}

#[test]
fn destroy_failure_is_aggregated_and_sweep_completes() {
    let swept = Arc::new(AtomicUsize::new(0));
    let mut builder = ContextBuilder::new();
    for name in ["good_one", "bad", "good_two"] {
        let swept = swept.clone();
        let descriptor = TypeDescriptor::builder::<Service>()
            .constructor(0, |_| Ok(Service::default()))
            .destroy_hook("shutdown", move |_| {
                swept.fetch_add(1, Ordering::SeqCst);
                if name == "bad" {
                    Err("关闭失败".into())
                } else {
                    Ok(())
                }
            })
            .build();
        builder = builder.definition(name, Arc::new(ComponentDefinition::new(descriptor)));
    }

    let context = builder.build();
    context.refresh().unwrap();
    match context.close() {
        Err(ContainerError::DisposalAggregate { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].name, "bad");
        }
        other => panic!("期望聚合销毁错误, 实际: {:?}", other.map(|_| ())),
    }
    assert_eq!(swept.load(Ordering::SeqCst), 3);
}
