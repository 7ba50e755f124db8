//! 组件定义与定义仓库

use crate::descriptor::TypeDescriptor;
use crate::error::{ContainerError, ContainerResult};
use crate::value::{PropertyBindings, PropertyValue};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// 组件作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentScope {
    /// 单例：每个名称恰好一个实例，缓存至容器关闭
    #[default]
    Singleton,
    /// 原型：每次请求都构造新实例，从不缓存
    Prototype,
}

/// 组件定义
///
/// 外壳不可变；属性绑定集可变，实例化前扩展钩子可以按名称追加或
/// 覆盖绑定条目。
pub struct ComponentDefinition {
    descriptor: Arc<TypeDescriptor>,
    scope: ComponentScope,
    bindings: RwLock<PropertyBindings>,
    init_hook: Option<String>,
    destroy_hook: Option<String>,
}

impl std::fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("type_name", &self.descriptor.type_name())
            .field("scope", &self.scope)
            .field("bindings", &self.bindings.read().len())
            .field("init_hook", &self.init_hook)
            .field("destroy_hook", &self.destroy_hook)
            .finish()
    }
}

impl ComponentDefinition {
    /// 基于类型描述符创建定义，默认单例作用域
    pub fn new(descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            descriptor,
            scope: ComponentScope::Singleton,
            bindings: RwLock::new(PropertyBindings::new()),
            init_hook: None,
            destroy_hook: None,
        }
    }

    /// 设置作用域
    pub fn with_scope(mut self, scope: ComponentScope) -> Self {
        self.scope = scope;
        self
    }

    /// 追加一条属性绑定
    pub fn with_binding(self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.bindings.write().add(name, value);
        self
    }

    /// 配置定义级初始化钩子的方法名
    pub fn with_init_hook(mut self, name: impl Into<String>) -> Self {
        self.init_hook = Some(name.into());
        self
    }

    /// 配置定义级销毁钩子的方法名
    pub fn with_destroy_hook(mut self, name: impl Into<String>) -> Self {
        self.destroy_hook = Some(name.into());
        self
    }

    /// 类型描述符
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// 作用域
    pub fn scope(&self) -> ComponentScope {
        self.scope
    }

    /// 是否单例作用域
    pub fn is_singleton(&self) -> bool {
        self.scope == ComponentScope::Singleton
    }

    /// 当前属性绑定集的一份快照
    pub fn bindings_snapshot(&self) -> PropertyBindings {
        self.bindings.read().clone()
    }

    /// 追加或覆盖一条属性绑定
    pub fn add_binding(&self, name: impl Into<String>, value: PropertyValue) {
        self.bindings.write().add(name, value);
    }

    /// 将一组绑定合并入定义，按名称覆盖
    pub fn merge_bindings(&self, bindings: PropertyBindings) {
        self.bindings.write().merge(bindings);
    }

    /// 定义级初始化钩子方法名
    pub fn init_hook(&self) -> Option<&str> {
        self.init_hook.as_deref()
    }

    /// 定义级销毁钩子方法名
    pub fn destroy_hook(&self) -> Option<&str> {
        self.destroy_hook.as_deref()
    }
}

/// 定义仓库
///
/// 引导阶段写入、此后以读为主；并发注册同名定义时后写胜出，
/// 重复名称的甄别策略由定义来源方负责。
#[derive(Debug, Default)]
pub struct DefinitionStore {
    definitions: DashMap<String, Arc<ComponentDefinition>>,
}

impl DefinitionStore {
    /// 创建空仓库
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册定义，同名覆盖（幂等，不报错）
    pub fn register(&self, name: impl Into<String>, definition: Arc<ComponentDefinition>) {
        let name = name.into();
        debug!(
            "注册组件定义: {} ({})",
            name,
            definition.descriptor().type_name()
        );
        self.definitions.insert(name, definition);
    }

    /// 按名称查找定义
    pub fn get(&self, name: &str) -> ContainerResult<Arc<ComponentDefinition>> {
        self.definitions
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ContainerError::not_found(name))
    }

    /// 是否存在指定名称的定义，O(1)
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// 全部已注册名称，次序不作保证
    pub fn names(&self) -> Vec<String> {
        self.definitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// 已注册定义数量
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// 仓库是否为空
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
