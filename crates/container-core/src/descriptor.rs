//! 类型描述符：反射的显式替代物
//!
//! 每个可被容器管理的类型登记一张元数据表：构造函数、属性 setter、
//! 方法表、声明的接口、生命周期回调与感知能力。容器与代理织入子系统
//! 全部通过这张表完成动态构造、属性注入与方法分派。

use crate::container::ComponentContainer;
use crate::error::BoxError;
use crate::value::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// 构造函数闭包类型
pub type ConstructorFn = Arc<dyn Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync>;

/// 属性 setter 闭包类型，作用于类型擦除后的目标实例
pub type SetterFn = Arc<dyn Fn(&(dyn Any + Send + Sync), Value) -> Result<(), BoxError> + Send + Sync>;

/// 方法表条目闭包类型，返回 `None` 表示方法无返回值
pub type MethodFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &[Value]) -> Result<Option<Value>, BoxError> + Send + Sync>;

/// 生命周期回调闭包类型
pub type LifecycleFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync>;

/// 容器感知能力回调类型
pub type ContainerAwareFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync), Arc<ComponentContainer>) + Send + Sync>;

/// 名称感知能力回调类型
pub type NameAwareFn = Arc<dyn Fn(&(dyn Any + Send + Sync), &str) + Send + Sync>;

/// 描述符感知能力回调类型
pub type DescriptorAwareFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync), Arc<TypeDescriptor>) + Send + Sync>;

/// 工厂组件的产物闭包类型
pub type ProduceFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<Value, BoxError> + Send + Sync>;

/// 一条构造函数登记：参数数量与调用闭包
#[derive(Clone)]
pub struct ConstructorSpec {
    arity: usize,
    invoke: ConstructorFn,
}

impl ConstructorSpec {
    /// 构造函数的参数数量
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// 以给定参数调用构造函数
    pub fn invoke(&self, args: &[Value]) -> Result<Value, BoxError> {
        (self.invoke)(args)
    }
}

/// 类型声明实现的一个接口
#[derive(Debug, Clone)]
pub struct InterfaceSpec {
    /// 接口名称
    pub name: &'static str,
    /// 接口 trait 对象的类型标识
    pub type_id: TypeId,
}

/// 类型元数据表
///
/// 构建一次后不可变，以 `Arc` 在定义、容器与代理之间共享。
pub struct TypeDescriptor {
    type_name: &'static str,
    type_id: TypeId,
    constructors: Vec<ConstructorSpec>,
    setters: HashMap<String, SetterFn>,
    property_types: HashMap<String, TypeId>,
    methods: HashMap<String, MethodFn>,
    interfaces: Vec<InterfaceSpec>,
    init: Option<(&'static str, LifecycleFn)>,
    destroy: Option<(&'static str, LifecycleFn)>,
    container_aware: Option<ContainerAwareFn>,
    name_aware: Option<NameAwareFn>,
    descriptor_aware: Option<DescriptorAwareFn>,
    producer: Option<ProduceFn>,
    produced_singleton: bool,
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("constructors", &self.constructors.len())
            .field("setters", &self.setters.len())
            .field("methods", &self.methods.len())
            .field("interfaces", &self.interfaces)
            .finish()
    }
}

impl TypeDescriptor {
    /// 为类型 `T` 创建描述符构建器
    pub fn builder<T: Any + Send + Sync>() -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder {
            type_name: std::any::type_name::<T>(),
            constructors: Vec::new(),
            setters: HashMap::new(),
            property_types: HashMap::new(),
            methods: HashMap::new(),
            interfaces: Vec::new(),
            init: None,
            destroy: None,
            container_aware: None,
            name_aware: None,
            descriptor_aware: None,
            producer: None,
            produced_singleton: true,
            _marker: PhantomData,
        }
    }

    /// 类型名称
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 被描述组件类型的标识
    ///
    /// 命名刻意避开 `Any::type_id`：描述符经常以 `Arc` 共享流转，
    /// 同名方法会被智能指针自身的 `Any` 实现抢先匹配。
    pub fn component_type_id(&self) -> TypeId {
        self.type_id
    }

    /// 按参数数量选择构造函数，取声明序中第一个匹配项
    ///
    /// 仅比较参数数量，不做完整的签名匹配，这是有意保留的简化语义。
    pub fn select_constructor(&self, arity: usize) -> Option<&ConstructorSpec> {
        self.constructors.iter().find(|c| c.arity == arity)
    }

    /// 按属性名称查找 setter
    pub fn setter(&self, name: &str) -> Option<&SetterFn> {
        self.setters.get(name)
    }

    /// 属性声明的目标类型，用于类型强转
    pub fn property_type(&self, name: &str) -> Option<TypeId> {
        self.property_types.get(name).copied()
    }

    /// 按名称查找方法表条目
    pub fn method(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }

    /// 方法表是否非空（子类式代理的前提）
    pub fn has_methods(&self) -> bool {
        !self.methods.is_empty()
    }

    /// 方法表的一份快照，供代理在创建期绑定超类调用句柄
    pub fn methods_snapshot(&self) -> HashMap<String, MethodFn> {
        self.methods.clone()
    }

    /// 类型声明的接口集
    pub fn interfaces(&self) -> &[InterfaceSpec] {
        &self.interfaces
    }

    /// 规范初始化回调及其方法名
    pub fn init(&self) -> Option<(&'static str, &LifecycleFn)> {
        self.init.as_ref().map(|(n, f)| (*n, f))
    }

    /// 规范销毁回调及其方法名
    pub fn destroy(&self) -> Option<(&'static str, &LifecycleFn)> {
        self.destroy.as_ref().map(|(n, f)| (*n, f))
    }

    /// 容器感知能力回调
    pub fn container_aware(&self) -> Option<&ContainerAwareFn> {
        self.container_aware.as_ref()
    }

    /// 名称感知能力回调
    pub fn name_aware(&self) -> Option<&NameAwareFn> {
        self.name_aware.as_ref()
    }

    /// 描述符感知能力回调
    pub fn descriptor_aware(&self) -> Option<&DescriptorAwareFn> {
        self.descriptor_aware.as_ref()
    }

    /// 工厂组件的产物闭包
    pub fn producer(&self) -> Option<&ProduceFn> {
        self.producer.as_ref()
    }

    /// 工厂组件的产物是否按单例缓存
    pub fn produced_singleton(&self) -> bool {
        self.produced_singleton
    }
}

fn expect_target<'a, T: Any>(
    target: &'a (dyn Any + Send + Sync),
    type_name: &'static str,
) -> Result<&'a T, BoxError> {
    target
        .downcast_ref::<T>()
        .ok_or_else(|| format!("目标实例不是 {type_name}").into())
}

/// [`TypeDescriptor`] 的构建器，泛型参数保证登记的闭包作用于同一类型
pub struct TypeDescriptorBuilder<T> {
    type_name: &'static str,
    constructors: Vec<ConstructorSpec>,
    setters: HashMap<String, SetterFn>,
    property_types: HashMap<String, TypeId>,
    methods: HashMap<String, MethodFn>,
    interfaces: Vec<InterfaceSpec>,
    init: Option<(&'static str, LifecycleFn)>,
    destroy: Option<(&'static str, LifecycleFn)>,
    container_aware: Option<ContainerAwareFn>,
    name_aware: Option<NameAwareFn>,
    descriptor_aware: Option<DescriptorAwareFn>,
    producer: Option<ProduceFn>,
    produced_singleton: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypeDescriptorBuilder<T> {
    /// 登记一个构造函数，按声明次序参与选择
    pub fn constructor<F>(mut self, arity: usize, build: F) -> Self
    where
        F: Fn(&[Value]) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorSpec {
            arity,
            invoke: Arc::new(move |args| build(args).map(|t| Arc::new(t) as Value)),
        });
        self
    }

    /// 登记一个属性 setter
    pub fn setter<F>(mut self, name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&T, Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let type_name = self.type_name;
        self.setters.insert(
            name.into(),
            Arc::new(move |target, value| apply(expect_target::<T>(target, type_name)?, value)),
        );
        self
    }

    /// 声明属性的目标类型，填充时据此尝试类型强转
    pub fn property_type<V: Any>(mut self, name: impl Into<String>) -> Self {
        self.property_types.insert(name.into(), TypeId::of::<V>());
        self
    }

    /// 登记一个方法表条目
    pub fn method<F>(mut self, name: impl Into<String>, invoke: F) -> Self
    where
        F: Fn(&T, &[Value]) -> Result<Option<Value>, BoxError> + Send + Sync + 'static,
    {
        let type_name = self.type_name;
        self.methods.insert(
            name.into(),
            Arc::new(move |target, args| invoke(expect_target::<T>(target, type_name)?, args)),
        );
        self
    }

    /// 声明类型实现的一个接口
    pub fn interface<I: ?Sized + Any>(mut self, name: &'static str) -> Self {
        self.interfaces.push(InterfaceSpec {
            name,
            type_id: TypeId::of::<I>(),
        });
        self
    }

    /// 登记规范初始化回调及其方法名
    ///
    /// 定义中配置的初始化钩子若与该方法名相同，视为同一操作只调用一次。
    pub fn init_hook<F>(mut self, name: &'static str, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let type_name = self.type_name;
        self.init = Some((
            name,
            Arc::new(move |target| hook(expect_target::<T>(target, type_name)?)),
        ));
        self
    }

    /// 登记规范销毁回调及其方法名
    pub fn destroy_hook<F>(mut self, name: &'static str, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let type_name = self.type_name;
        self.destroy = Some((
            name,
            Arc::new(move |target| hook(expect_target::<T>(target, type_name)?)),
        ));
        self
    }

    /// 登记容器感知能力
    pub fn container_aware<F>(mut self, aware: F) -> Self
    where
        F: Fn(&T, Arc<ComponentContainer>) + Send + Sync + 'static,
    {
        let type_name = self.type_name;
        self.container_aware = Some(Arc::new(move |target, container| {
            if let Ok(t) = expect_target::<T>(target, type_name) {
                aware(t, container);
            }
        }));
        self
    }

    /// 登记名称感知能力
    pub fn name_aware<F>(mut self, aware: F) -> Self
    where
        F: Fn(&T, &str) + Send + Sync + 'static,
    {
        let type_name = self.type_name;
        self.name_aware = Some(Arc::new(move |target, name| {
            if let Ok(t) = expect_target::<T>(target, type_name) {
                aware(t, name);
            }
        }));
        self
    }

    /// 登记描述符感知能力
    pub fn descriptor_aware<F>(mut self, aware: F) -> Self
    where
        F: Fn(&T, Arc<TypeDescriptor>) + Send + Sync + 'static,
    {
        let type_name = self.type_name;
        self.descriptor_aware = Some(Arc::new(move |target, descriptor| {
            if let Ok(t) = expect_target::<T>(target, type_name) {
                aware(t, descriptor);
            }
        }));
        self
    }

    /// 声明该类型为工厂组件：对外暴露的是产物而非工厂实例本身
    pub fn produces<F>(mut self, singleton: bool, produce: F) -> Self
    where
        F: Fn(&T) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let type_name = self.type_name;
        self.producer = Some(Arc::new(move |target| {
            produce(expect_target::<T>(target, type_name)?)
        }));
        self.produced_singleton = singleton;
        self
    }

    /// 完成构建
    pub fn build(self) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor {
            type_name: self.type_name,
            type_id: TypeId::of::<T>(),
            constructors: self.constructors,
            setters: self.setters,
            property_types: self.property_types,
            methods: self.methods,
            interfaces: self.interfaces,
            init: self.init,
            destroy: self.destroy,
            container_aware: self.container_aware,
            name_aware: self.name_aware,
            descriptor_aware: self.descriptor_aware,
            producer: self.producer,
            produced_singleton: self.produced_singleton,
        })
    }
}
