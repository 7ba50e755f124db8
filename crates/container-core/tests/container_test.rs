//! 组件容器集成测试：构造管线、循环依赖、扩展钩子与生命周期

use container_core::{
    ComponentContainer, ComponentDefinition, ComponentProcessor, ComponentScope, ContainerError,
    ContainerResult, ConversionService, InstantiationAwareProcessor, PropertyBindings,
    PropertyValue, StringValueResolver, TypeDescriptor, Value,
};
use parking_lot::Mutex;
use std::any::TypeId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Node {
    peer: Mutex<Option<Value>>,
}

fn node_definition(peer_name: &str) -> Arc<ComponentDefinition> {
    let descriptor = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Ok(Node::default()))
        .setter("peer", |node: &Node, value| {
            *node.peer.lock() = Some(value);
            Ok(())
        })
        .build();
    Arc::new(
        ComponentDefinition::new(descriptor).with_binding("peer", PropertyValue::reference(peer_name)),
    )
}

#[test]
fn circular_singletons_resolve_to_identical_instances() {
    let container = ComponentContainer::new();
    container.register_definition("a", node_definition("b"));
    container.register_definition("b", node_definition("a"));

    let a = container.get_component("a").unwrap();
    let b = container.get_component("b").unwrap();

    // b 中注入的 a 必须与对外暴露的 a 是同一实例，反之亦然
    let a_node = a.clone().downcast::<Node>().unwrap();
    let b_node = b.clone().downcast::<Node>().unwrap();
    let a_in_b = b_node.peer.lock().clone().unwrap();
    let b_in_a = a_node.peer.lock().clone().unwrap();
    assert!(Arc::ptr_eq(&a_in_b, &a));
    assert!(Arc::ptr_eq(&b_in_a, &b));
}

#[test]
fn singleton_is_cached_and_prototype_is_not() {
    let container = ComponentContainer::new();
    let descriptor = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Ok(Node::default()))
        .build();
    container.register_definition(
        "single",
        Arc::new(ComponentDefinition::new(descriptor.clone())),
    );
    container.register_definition(
        "proto",
        Arc::new(ComponentDefinition::new(descriptor).with_scope(ComponentScope::Prototype)),
    );

    let s1 = container.get_component("single").unwrap();
    let s2 = container.get_component("single").unwrap();
    assert!(Arc::ptr_eq(&s1, &s2));

    let p1 = container.get_component("proto").unwrap();
    let p2 = container.get_component("proto").unwrap();
    assert!(!Arc::ptr_eq(&p1, &p2));
}

#[test]
fn missing_component_is_not_found_and_failure_leaves_state_clean() {
    let container = ComponentContainer::new();
    assert!(!container.contains_component("ghost"));
    assert!(matches!(
        container.get_component("ghost"),
        Err(ContainerError::NotFound { .. })
    ));

    // 构造失败不得在缓存中留下残留条目
    let failing = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Err("故意失败".into()))
        .build();
    container.register_definition("broken", Arc::new(ComponentDefinition::new(failing)));
    assert!(container.get_component("broken").is_err());
    assert!(container.get_component("broken").is_err());

    // 同名换成可用定义后应能正常构造
    let working = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Ok(Node::default()))
        .build();
    container.register_definition("broken", Arc::new(ComponentDefinition::new(working)));
    assert!(container.get_component("broken").is_ok());
}

#[derive(Default)]
struct Server {
    port: Mutex<u16>,
    banner: Mutex<String>,
}

struct StringToU16;

impl ConversionService for StringToU16 {
    fn can_convert(&self, source: TypeId, target: TypeId) -> bool {
        source == TypeId::of::<String>() && target == TypeId::of::<u16>()
    }

    fn convert(&self, value: Value, _target: TypeId) -> Result<Value, container_core::BoxError> {
        let text = value
            .downcast_ref::<String>()
            .ok_or("源值不是字符串")?;
        let port: u16 = text.parse()?;
        Ok(Arc::new(port))
    }
}

struct BannerResolver;

impl StringValueResolver for BannerResolver {
    fn resolve(&self, value: &str) -> Result<String, container_core::BoxError> {
        Ok(value.replace("${app.name}", "demo"))
    }
}

#[test]
fn literal_binding_goes_through_resolver_and_conversion() -> anyhow::Result<()> {
    let container = ComponentContainer::new();
    container.set_conversion_service(Arc::new(StringToU16));
    container.add_string_resolver(Arc::new(BannerResolver));

    let descriptor = TypeDescriptor::builder::<Server>()
        .constructor(0, |_| Ok(Server::default()))
        .setter("port", |server: &Server, value| {
            *server.port.lock() = *value.downcast_ref::<u16>().ok_or("端口类型错误")?;
            Ok(())
        })
        .property_type::<u16>("port")
        .setter("banner", |server: &Server, value| {
            *server.banner.lock() = value.downcast_ref::<String>().ok_or("横幅类型错误")?.clone();
            Ok(())
        })
        .build();
    container.register_definition(
        "server",
        Arc::new(
            ComponentDefinition::new(descriptor)
                .with_binding("port", PropertyValue::literal("8080".to_string()))
                .with_binding("banner", PropertyValue::literal("welcome to ${app.name}".to_string())),
        ),
    );

    let server = container.get_component_as::<Server>("server")?;
    assert_eq!(*server.port.lock(), 8080);
    assert_eq!(*server.banner.lock(), "welcome to demo");
    Ok(())
}

#[test]
fn binding_without_setter_is_property_binding_error() {
    let container = ComponentContainer::new();
    let descriptor = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Ok(Node::default()))
        .build();
    container.register_definition(
        "node",
        Arc::new(
            ComponentDefinition::new(descriptor)
                .with_binding("unknown", PropertyValue::literal(1i32)),
        ),
    );

    assert!(matches!(
        container.get_component("node"),
        Err(ContainerError::PropertyBinding { .. })
    ));
}

#[derive(Default)]
struct Tracked {
    events: Mutex<Vec<&'static str>>,
}

struct EventRecorder;

impl ComponentProcessor for EventRecorder {
    fn before_initialization(&self, instance: Value, _name: &str) -> ContainerResult<Option<Value>> {
        if let Some(tracked) = instance.downcast_ref::<Tracked>() {
            tracked.events.lock().push("before_init");
        }
        Ok(Some(instance))
    }

    fn after_initialization(&self, instance: Value, _name: &str) -> ContainerResult<Option<Value>> {
        if let Some(tracked) = instance.downcast_ref::<Tracked>() {
            tracked.events.lock().push("after_init");
        }
        Ok(Some(instance))
    }
}

#[test]
fn initialization_hooks_run_in_pipeline_order() {
    let container = ComponentContainer::new();
    container.add_processor(Arc::new(EventRecorder));

    let descriptor = TypeDescriptor::builder::<Tracked>()
        .constructor(0, |_| Ok(Tracked::default()))
        .init_hook("on_ready", |tracked| {
            tracked.events.lock().push("contract");
            Ok(())
        })
        .method("warm_up", |tracked: &Tracked, _args| {
            tracked.events.lock().push("definition_hook");
            Ok(None)
        })
        .build();
    container.register_definition(
        "tracked",
        Arc::new(ComponentDefinition::new(descriptor).with_init_hook("warm_up")),
    );

    let tracked = container.get_component_as::<Tracked>("tracked").unwrap();
    assert_eq!(
        *tracked.events.lock(),
        vec!["before_init", "contract", "definition_hook", "after_init"]
    );
}

#[test]
fn init_hook_matching_contract_name_runs_once() {
    let container = ComponentContainer::new();
    let descriptor = TypeDescriptor::builder::<Tracked>()
        .constructor(0, |_| Ok(Tracked::default()))
        .init_hook("on_ready", |tracked| {
            tracked.events.lock().push("contract");
            Ok(())
        })
        .build();
    container.register_definition(
        "tracked",
        Arc::new(ComponentDefinition::new(descriptor).with_init_hook("on_ready")),
    );

    let tracked = container.get_component_as::<Tracked>("tracked").unwrap();
    assert_eq!(*tracked.events.lock(), vec!["contract"]);
}

struct PopulationVeto {
    initialized: Arc<AtomicBool>,
}

impl ComponentProcessor for PopulationVeto {
    fn after_initialization(&self, instance: Value, _name: &str) -> ContainerResult<Option<Value>> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(Some(instance))
    }

    fn as_instantiation_aware(&self) -> Option<&dyn InstantiationAwareProcessor> {
        Some(self)
    }
}

impl InstantiationAwareProcessor for PopulationVeto {
    fn after_instantiation(&self, _instance: &Value, _name: &str) -> ContainerResult<bool> {
        Ok(false)
    }
}

#[test]
fn population_veto_skips_bindings_but_initialization_still_runs() {
    let container = ComponentContainer::new();
    let initialized = Arc::new(AtomicBool::new(false));
    container.add_processor(Arc::new(PopulationVeto {
        initialized: initialized.clone(),
    }));
    container.register_definition("a", node_definition("missing"));

    // 填充被取消，对缺失组件的引用绑定不会触发解析
    let a = container.get_component_as::<Node>("a").unwrap();
    assert!(a.peer.lock().is_none());
    assert!(initialized.load(Ordering::SeqCst));
}

struct Substituting;

impl ComponentProcessor for Substituting {
    fn after_initialization(&self, instance: Value, _name: &str) -> ContainerResult<Option<Value>> {
        if instance.downcast_ref::<&'static str>().is_some() {
            return Ok(Some(Arc::new("decorated")));
        }
        Ok(Some(instance))
    }

    fn as_instantiation_aware(&self) -> Option<&dyn InstantiationAwareProcessor> {
        Some(self)
    }
}

impl InstantiationAwareProcessor for Substituting {
    fn before_instantiation(
        &self,
        _descriptor: &Arc<TypeDescriptor>,
        name: &str,
    ) -> ContainerResult<Option<Value>> {
        if name == "stub" {
            Ok(Some(Arc::new("substitute")))
        } else {
            Ok(None)
        }
    }
}

#[test]
fn pre_instantiation_substitute_short_circuits_but_gets_after_init() {
    let container = ComponentContainer::new();
    container.add_processor(Arc::new(Substituting));

    let descriptor = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Err("常规构造不应被触发".into()))
        .build();
    container.register_definition("stub", Arc::new(ComponentDefinition::new(descriptor)));

    let value = container.get_component("stub").unwrap();
    assert_eq!(*value.downcast_ref::<&'static str>().unwrap(), "decorated");
}

struct BindingInjector;

impl ComponentProcessor for BindingInjector {
    fn as_instantiation_aware(&self) -> Option<&dyn InstantiationAwareProcessor> {
        Some(self)
    }
}

impl InstantiationAwareProcessor for BindingInjector {
    fn bindings(
        &self,
        _bindings: &PropertyBindings,
        _instance: &Value,
        name: &str,
    ) -> ContainerResult<Option<PropertyBindings>> {
        if name != "server" {
            return Ok(None);
        }
        let mut extra = PropertyBindings::new();
        extra.add("port", PropertyValue::literal(9090u16));
        Ok(Some(extra))
    }
}

#[test]
fn binding_processor_overrides_configured_binding() {
    let container = ComponentContainer::new();
    container.add_processor(Arc::new(BindingInjector));

    let descriptor = TypeDescriptor::builder::<Server>()
        .constructor(0, |_| Ok(Server::default()))
        .setter("port", |server: &Server, value| {
            *server.port.lock() = *value.downcast_ref::<u16>().ok_or("端口类型错误")?;
            Ok(())
        })
        .build();
    container.register_definition(
        "server",
        Arc::new(
            ComponentDefinition::new(descriptor).with_binding("port", PropertyValue::literal(8080u16)),
        ),
    );

    let server = container.get_component_as::<Server>("server").unwrap();
    assert_eq!(*server.port.lock(), 9090);
}

struct Connection {
    id: usize,
}

struct ConnectionFactory {
    counter: AtomicUsize,
}

#[test]
fn factory_component_exposes_cached_product() {
    let container = ComponentContainer::new();
    let descriptor = TypeDescriptor::builder::<ConnectionFactory>()
        .constructor(0, |_| {
            Ok(ConnectionFactory {
                counter: AtomicUsize::new(0),
            })
        })
        .produces(true, |factory| {
            Ok(Arc::new(Connection {
                id: factory.counter.fetch_add(1, Ordering::SeqCst),
            }))
        })
        .build();
    container.register_definition("conn", Arc::new(ComponentDefinition::new(descriptor)));

    let first = container.get_component("conn").unwrap();
    let second = container.get_component("conn").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.downcast_ref::<Connection>().unwrap().id, 0);
}

#[test]
fn non_singleton_factory_produces_fresh_products() {
    let container = ComponentContainer::new();
    let descriptor = TypeDescriptor::builder::<ConnectionFactory>()
        .constructor(0, |_| {
            Ok(ConnectionFactory {
                counter: AtomicUsize::new(0),
            })
        })
        .produces(false, |factory| {
            Ok(Arc::new(Connection {
                id: factory.counter.fetch_add(1, Ordering::SeqCst),
            }))
        })
        .build();
    container.register_definition("conn", Arc::new(ComponentDefinition::new(descriptor)));

    let first = container.get_component("conn").unwrap();
    let second = container.get_component("conn").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.downcast_ref::<Connection>().unwrap().id, 1);
}

#[derive(Default)]
struct Aware {
    seen_name: Mutex<Option<String>>,
    container_attached: AtomicBool,
}

#[test]
fn aware_capabilities_fire_before_initialization() {
    let container = ComponentContainer::new();
    let descriptor = TypeDescriptor::builder::<Aware>()
        .constructor(0, |_| Ok(Aware::default()))
        .name_aware(|aware, name| {
            *aware.seen_name.lock() = Some(name.to_string());
        })
        .container_aware(|aware, container| {
            if container.contains_component("self_aware") {
                aware.container_attached.store(true, Ordering::SeqCst);
            }
        })
        .build();
    container.register_definition("self_aware", Arc::new(ComponentDefinition::new(descriptor)));

    let aware = container.get_component_as::<Aware>("self_aware").unwrap();
    assert_eq!(aware.seen_name.lock().as_deref(), Some("self_aware"));
    assert!(aware.container_attached.load(Ordering::SeqCst));
}

struct EarlyReferenceCounter {
    fired: Arc<AtomicUsize>,
}

impl ComponentProcessor for EarlyReferenceCounter {
    fn as_instantiation_aware(&self) -> Option<&dyn InstantiationAwareProcessor> {
        Some(self)
    }
}

impl InstantiationAwareProcessor for EarlyReferenceCounter {
    fn early_reference(&self, instance: Value, _name: &str) -> ContainerResult<Option<Value>> {
        self.fired.fetch_add(1, Ordering::SeqCst);
        Ok(Some(instance))
    }
}

#[test]
fn early_reference_hooks_fire_only_for_cycle_exposed_singletons() {
    let container = ComponentContainer::new();
    let fired = Arc::new(AtomicUsize::new(0));
    container.add_processor(Arc::new(EarlyReferenceCounter {
        fired: fired.clone(),
    }));

    let descriptor = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Ok(Node::default()))
        .build();
    container.register_definition("solo", Arc::new(ComponentDefinition::new(descriptor)));
    container.get_component("solo").unwrap();
    // 无循环依赖时工厂不被触发, 早期引用钩子不执行
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    container.register_definition("a", node_definition("b"));
    container.register_definition("b", node_definition("a"));
    container.get_component("a").unwrap();
    // 环中只有率先被回指的组件曝光早期引用
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn destroy_all_runs_hooks_in_reverse_creation_order() {
    let container = ComponentContainer::new();
    let order = Arc::new(Mutex::new(Vec::<String>::new()));

    for name in ["x", "y", "z"] {
        let order = order.clone();
        let descriptor = TypeDescriptor::builder::<Node>()
            .constructor(0, |_| Ok(Node::default()))
            .destroy_hook("shutdown", move |_| {
                order.lock().push(name.to_string());
                Ok(())
            })
            .build();
        container.register_definition(name, Arc::new(ComponentDefinition::new(descriptor)));
        container.get_component(name).unwrap();
    }

    container.destroy_all().unwrap();
    assert_eq!(*order.lock(), vec!["z", "y", "x"]);

    // 销毁后缓存清空，组件可以重新构造
    assert!(container.get_component("x").is_ok());
}

#[test]
fn components_of_type_collects_definitions_and_singletons() {
    let container = ComponentContainer::new();
    let descriptor = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Ok(Node::default()))
        .build();
    container.register_definition("first", Arc::new(ComponentDefinition::new(descriptor)));
    container.register_singleton("second", Arc::new(Node::default()));
    container.register_singleton("other", Arc::new(42i32));

    let nodes = container.components_of_type::<Node>().unwrap();
    assert_eq!(nodes.len(), 2);
    assert!(nodes.contains_key("first"));
    assert!(nodes.contains_key("second"));
}

#[test]
fn typed_lookup_mismatch_reports_both_types() {
    let container = ComponentContainer::new();
    let descriptor = TypeDescriptor::builder::<Node>()
        .constructor(0, |_| Ok(Node::default()))
        .build();
    container.register_definition("node", Arc::new(ComponentDefinition::new(descriptor)));

    match container.get_component_as::<Server>("node") {
        Err(ContainerError::TypeMismatch { name, .. }) => assert_eq!(name, "node"),
        other => panic!("期望类型不匹配错误, 实际: {:?}", other.map(|_| ())),
    }
}
