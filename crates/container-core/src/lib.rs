//! # 组件容器核心
//!
//! 组件生命周期运行时的核心层：组件定义、类型描述符、三级单例缓存、
//! 实例化策略与扩展钩子流水线。上层的代理织入与应用上下文都建立在
//! 本 crate 的容器之上。
//!
//! ## 核心概念
//!
//! - **组件定义** ([`ComponentDefinition`])：名称、作用域、属性绑定
//!   与生命周期钩子配置的载体
//! - **类型描述符** ([`TypeDescriptor`])：构造函数、setter、方法表与
//!   接口声明的显式元数据表
//! - **三级单例缓存** ([`SingletonCache`])：完成态、早期引用与早期
//!   引用工厂三层，用于解开单例间的循环依赖
//! - **扩展钩子** ([`ComponentProcessor`] 等)：五个生命周期切入点，
//!   代理织入等横切能力经由钩子接入
//!
//! ## 快速上手
//!
//! ```
//! use container_core::{ComponentContainer, ComponentDefinition, TypeDescriptor};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default)]
//! struct Greeter;
//!
//! let container = ComponentContainer::new();
//! let descriptor = TypeDescriptor::builder::<Greeter>()
//!     .constructor(0, |_| Ok(Greeter))
//!     .build();
//! container.register_definition("greeter", Arc::new(ComponentDefinition::new(descriptor)));
//!
//! let greeter = container.get_component_as::<Greeter>("greeter").unwrap();
//! assert!(Arc::strong_count(&greeter) >= 1);
//! ```

pub mod container;
pub mod convert;
pub mod definition;
pub mod descriptor;
pub mod error;
pub mod instantiate;
pub mod processor;
pub mod singleton;
pub mod value;

pub use container::ComponentContainer;
pub use convert::{ConversionService, StringValueResolver};
pub use definition::{ComponentDefinition, ComponentScope, DefinitionStore};
pub use descriptor::{
    ConstructorFn, ConstructorSpec, ContainerAwareFn, DescriptorAwareFn, InterfaceSpec,
    LifecycleFn, MethodFn, NameAwareFn, ProduceFn, SetterFn, TypeDescriptor,
    TypeDescriptorBuilder,
};
pub use error::{BoxError, ContainerError, ContainerResult, DisposalFailure};
pub use instantiate::{DirectInstantiation, InstantiationStrategy, SubclassCapableInstantiation};
pub use processor::{ComponentProcessor, DefinitionProcessor, InstantiationAwareProcessor};
pub use singleton::{DisposalRecord, SingletonCache, SingletonFactory, TeardownFn};
pub use value::{ComponentReference, PropertyBinding, PropertyBindings, PropertyValue, Value};
