//! 组件容器
//!
//! 把定义仓库、三级单例缓存、实例化策略、扩展钩子流水线、属性装配
//! 与生命周期调用编排为完整的构造管线。对外暴露按名称/按类型的组件
//! 检索接口。

use crate::convert::{ConversionService, StringValueResolver};
use crate::definition::{ComponentDefinition, DefinitionStore};
use crate::error::{ContainerError, ContainerResult};
use crate::instantiate::{DirectInstantiation, InstantiationStrategy};
use crate::processor::ComponentProcessor;
use crate::singleton::{DisposalRecord, SingletonCache};
use crate::value::{PropertyValue, Value};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// 组件容器
///
/// 通过 [`ComponentContainer::new`] 获得 `Arc` 包装的实例；容器持有
/// 自身的弱引用，用于向组件下发容器句柄以及在早期引用工厂闭包中
/// 回调自身。多个容器实例可以共存，互不干扰。
pub struct ComponentContainer {
    self_ref: Weak<ComponentContainer>,
    definitions: DefinitionStore,
    singletons: SingletonCache,
    processors: RwLock<Vec<Arc<dyn ComponentProcessor>>>,
    strategy: RwLock<Arc<dyn InstantiationStrategy>>,
    conversion: RwLock<Option<Arc<dyn ConversionService>>>,
    string_resolvers: RwLock<Vec<Arc<dyn StringValueResolver>>>,
    produced: DashMap<String, Value>,
}

impl ComponentContainer {
    /// 创建新容器，默认使用直接构造策略
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            definitions: DefinitionStore::new(),
            singletons: SingletonCache::new(),
            processors: RwLock::new(Vec::new()),
            strategy: RwLock::new(Arc::new(DirectInstantiation)),
            conversion: RwLock::new(None),
            string_resolvers: RwLock::new(Vec::new()),
            produced: DashMap::new(),
        })
    }

    /// 定义仓库
    pub fn definitions(&self) -> &DefinitionStore {
        &self.definitions
    }

    /// 注册组件定义，同名覆盖
    pub fn register_definition(&self, name: impl Into<String>, definition: Arc<ComponentDefinition>) {
        self.definitions.register(name, definition);
    }

    /// 直接注册一个预构建单例，立即提交至完成态缓存
    pub fn register_singleton(&self, name: impl Into<String>, instance: Value) {
        let name = name.into();
        info!("注册预构建单例: {}", name);
        self.singletons.commit(&name, instance);
    }

    /// 追加扩展钩子；重复添加同一钩子时移到队尾
    pub fn add_processor(&self, processor: Arc<dyn ComponentProcessor>) {
        let mut processors = self.processors.write();
        processors.retain(|existing| !Arc::ptr_eq(existing, &processor));
        processors.push(processor);
    }

    /// 替换实例化策略
    pub fn set_instantiation_strategy(&self, strategy: Arc<dyn InstantiationStrategy>) {
        *self.strategy.write() = strategy;
    }

    /// 配置类型转换服务
    pub fn set_conversion_service(&self, service: Arc<dyn ConversionService>) {
        *self.conversion.write() = Some(service);
    }

    /// 追加字符串值解析器
    pub fn add_string_resolver(&self, resolver: Arc<dyn StringValueResolver>) {
        self.string_resolvers.write().push(resolver);
    }

    /// 是否存在指定名称的组件（定义或已注册单例）
    pub fn contains_component(&self, name: &str) -> bool {
        self.definitions.contains(name) || self.singletons.contains_finished(name)
    }

    /// 按名称获取组件
    pub fn get_component(&self, name: &str) -> ContainerResult<Value> {
        self.do_get(name, &[])
    }

    /// 按名称获取组件，携带构造参数
    pub fn get_component_with_args(&self, name: &str, args: &[Value]) -> ContainerResult<Value> {
        self.do_get(name, args)
    }

    /// 按名称获取组件并向下转型到指定类型
    ///
    /// 组件的运行时表示可能已被扩展钩子替换（如织入代理），此时错误
    /// 信息会如实说明实际表示并非定义声明的类型。
    pub fn get_component_as<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        let value = self.get_component(name)?;
        let runtime_id = value.as_ref().type_id();
        value.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
            name: name.to_string(),
            requested: std::any::type_name::<T>().to_string(),
            actual: match self.definitions.get(name) {
                Ok(definition) => {
                    let declared = definition.descriptor().type_name();
                    if definition.descriptor().component_type_id() == runtime_id {
                        declared.to_string()
                    } else {
                        format!("{declared} 的运行时替代表示")
                    }
                }
                Err(_) => "<无定义>".to_string(),
            },
        })
    }

    /// 获取指定具体类型的全部组件，键为组件名称
    ///
    /// 同时覆盖按定义声明的组件（必要时触发构造）与直接注册的单例。
    pub fn components_of_type<T: Any + Send + Sync>(
        &self,
    ) -> ContainerResult<HashMap<String, Arc<T>>> {
        let target = std::any::TypeId::of::<T>();
        let mut result = HashMap::new();

        for name in self.definitions.names() {
            let definition = self.definitions.get(&name)?;
            if definition.descriptor().component_type_id() != target {
                continue;
            }
            let value = self.get_component(&name)?;
            if let Ok(typed) = value.downcast::<T>() {
                result.insert(name, typed);
            }
        }

        for (name, value) in self.singletons.finished_snapshot() {
            if result.contains_key(&name) {
                continue;
            }
            if let Ok(typed) = value.downcast::<T>() {
                result.insert(name, typed);
            }
        }

        Ok(result)
    }

    /// 销毁全部已登记的单例，逆注册序执行销毁动作
    pub fn destroy_all(&self) -> ContainerResult<()> {
        info!("开始销毁所有单例组件");
        self.produced.clear();
        self.singletons.destroy_all()
    }

    fn do_get(&self, name: &str, args: &[Value]) -> ContainerResult<Value> {
        if let Some(shared) = self.singletons.get_singleton(name)? {
            debug!("单例缓存命中: {}", name);
            return self.resolve_factory_component(name, shared);
        }

        let definition = self.definitions.get(name)?;
        let instance = self.create_component(name, &definition, args)?;
        self.resolve_factory_component(name, instance)
    }

    /// 工厂组件的产物解析：描述符声明了产物闭包时，对外暴露产物
    fn resolve_factory_component(&self, name: &str, instance: Value) -> ContainerResult<Value> {
        let Ok(definition) = self.definitions.get(name) else {
            return Ok(instance);
        };
        let descriptor = definition.descriptor();
        let Some(producer) = descriptor.producer() else {
            return Ok(instance);
        };

        if descriptor.produced_singleton() {
            if let Some(cached) = self.produced.get(name) {
                return Ok(cached.value().clone());
            }
        }
        debug!("工厂组件产出对象: {}", name);
        let product = producer(instance.as_ref())
            .map_err(|source| ContainerError::instantiation(name, source))?;
        if descriptor.produced_singleton() {
            self.produced.insert(name.to_string(), product.clone());
        }
        Ok(product)
    }

    /// 创建组件；失败时清掉该名称的待定缓存条目，保证可重试
    fn create_component(
        &self,
        name: &str,
        definition: &Arc<ComponentDefinition>,
        args: &[Value],
    ) -> ContainerResult<Value> {
        if let Some(substitute) = self.resolve_before_instantiation(name, definition)? {
            return Ok(substitute);
        }
        let result = self.do_create(name, definition, args);
        if result.is_err() {
            self.singletons.discard_pending(name);
        }
        result
    }

    /// 实例化前表决：钩子可给出替代实例，完全跳过常规构造
    fn resolve_before_instantiation(
        &self,
        name: &str,
        definition: &Arc<ComponentDefinition>,
    ) -> ContainerResult<Option<Value>> {
        let processors = self.processors.read().clone();
        for processor in &processors {
            let Some(aware) = processor.as_instantiation_aware() else {
                continue;
            };
            if let Some(substitute) = aware.before_instantiation(definition.descriptor(), name)? {
                debug!("实例化前钩子给出替代实例: {}", name);
                let substitute = self.apply_after_initialization(substitute, name)?;
                return Ok(Some(substitute));
            }
        }
        Ok(None)
    }

    fn do_create(
        &self,
        name: &str,
        definition: &Arc<ComponentDefinition>,
        args: &[Value],
    ) -> ContainerResult<Value> {
        debug!("创建组件: {}", name);
        // 1. 实例化原始对象
        let raw = self.create_instance(name, definition, args)?;

        // 2. 单例提前曝光：登记早期引用工厂以解开循环依赖
        if definition.is_singleton() {
            let container = self.self_ref.clone();
            let early_name = name.to_string();
            let early_raw = raw.clone();
            self.singletons.register_factory(
                name,
                Box::new(move || match container.upgrade() {
                    Some(container) => container.early_reference(&early_name, early_raw),
                    None => Ok(early_raw),
                }),
            );
        }

        // 3. 实例化后闸门
        let keep_populating = self.apply_after_instantiation(name, &raw)?;
        if keep_populating {
            // 4. 填充前允许钩子改写绑定集
            self.apply_binding_processors(name, &raw, definition)?;
            // 5. 属性装配
            self.populate(name, &raw, definition)?;
        } else {
            debug!("组件 {} 的属性填充被扩展钩子取消", name);
        }

        // 6. 初始化（即便跳过了填充也照常执行）
        let raw_for_teardown = raw.clone();
        let initialized = self.initialize(name, raw, definition)?;

        // 7. 登记销毁记录；销毁动作作用于原始实例
        self.register_disposable(name, &raw_for_teardown, definition);

        // 8. 单例采用曝光过的表示并做终态晋升
        if definition.is_singleton() {
            // 循环依赖中已向依赖方曝光过早期引用时以曝光的表示为准，
            // 环内所有依赖方与对外检索共享同一对象身份；未曝光过的
            // 工厂不做触发，直接采纳初始化管线的产出
            let exposed = match self.singletons.peek_early(name) {
                Some(exposed) => exposed,
                None => initialized,
            };
            self.singletons.commit(name, exposed.clone());
            info!("组件构造完成: {}", name);
            Ok(exposed)
        } else {
            info!("组件构造完成 (原型): {}", name);
            Ok(initialized)
        }
    }

    fn create_instance(
        &self,
        name: &str,
        definition: &Arc<ComponentDefinition>,
        args: &[Value],
    ) -> ContainerResult<Value> {
        let descriptor = definition.descriptor();
        let constructor = descriptor.select_constructor(args.len()).ok_or_else(|| {
            ContainerError::instantiation(
                name,
                format!(
                    "类型 {} 没有参数数量为 {} 的构造函数",
                    descriptor.type_name(),
                    args.len()
                ),
            )
        })?;
        let strategy = self.strategy.read().clone();
        strategy.instantiate(definition, name, constructor, args)
    }

    /// 早期引用曝光阶段：依次让实例化感知钩子替换早期表示
    fn early_reference(&self, name: &str, raw: Value) -> ContainerResult<Value> {
        debug!("曝光早期引用: {}", name);
        let mut exposed = raw;
        let processors = self.processors.read().clone();
        for processor in &processors {
            let Some(aware) = processor.as_instantiation_aware() else {
                continue;
            };
            match aware.early_reference(exposed.clone(), name)? {
                Some(replacement) => exposed = replacement,
                None => break,
            }
        }
        Ok(exposed)
    }

    fn apply_after_instantiation(&self, name: &str, instance: &Value) -> ContainerResult<bool> {
        let processors = self.processors.read().clone();
        for processor in &processors {
            let Some(aware) = processor.as_instantiation_aware() else {
                continue;
            };
            if !aware.after_instantiation(instance, name)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn apply_binding_processors(
        &self,
        name: &str,
        instance: &Value,
        definition: &Arc<ComponentDefinition>,
    ) -> ContainerResult<()> {
        let processors = self.processors.read().clone();
        for processor in &processors {
            let Some(aware) = processor.as_instantiation_aware() else {
                continue;
            };
            let snapshot = definition.bindings_snapshot();
            if let Some(rewritten) = aware.bindings(&snapshot, instance, name)? {
                definition.merge_bindings(rewritten);
            }
        }
        Ok(())
    }

    /// 属性装配：引用递归解析，字面量先经字符串解析器再做类型强转
    fn populate(
        &self,
        name: &str,
        instance: &Value,
        definition: &Arc<ComponentDefinition>,
    ) -> ContainerResult<()> {
        let descriptor = definition.descriptor();
        for binding in definition.bindings_snapshot().entries() {
            let property = binding.name();
            let value = match binding.value() {
                PropertyValue::Reference(reference) => self.get_component(reference.target())?,
                PropertyValue::Literal(literal) => {
                    let mut value = literal.clone();
                    value = self
                        .resolve_string_literal(value)
                        .map_err(|source| ContainerError::property_binding(name, property, source))?;
                    value = self
                        .coerce(descriptor.property_type(property), value)
                        .map_err(|source| ContainerError::property_binding(name, property, source))?;
                    value
                }
            };

            let setter = descriptor.setter(property).ok_or_else(|| {
                ContainerError::property_binding(name, property, "类型未登记该属性的 setter")
            })?;
            setter(instance.as_ref(), value)
                .map_err(|source| ContainerError::property_binding(name, property, source))?;
        }
        Ok(())
    }

    /// 字符串字面量先交给外部字符串解析协作者
    fn resolve_string_literal(&self, value: Value) -> Result<Value, crate::error::BoxError> {
        let Some(text) = value.downcast_ref::<String>().cloned() else {
            return Ok(value);
        };
        let resolvers = self.string_resolvers.read().clone();
        if resolvers.is_empty() {
            return Ok(value);
        }
        let mut resolved = text;
        for resolver in &resolvers {
            resolved = resolver.resolve(&resolved)?;
        }
        Ok(Arc::new(resolved))
    }

    /// 类型强转：源目标类型一致或未配置转换服务时原样返回
    fn coerce(
        &self,
        target: Option<std::any::TypeId>,
        value: Value,
    ) -> Result<Value, crate::error::BoxError> {
        let Some(target) = target else {
            return Ok(value);
        };
        if value.as_ref().type_id() == target {
            return Ok(value);
        }
        let Some(service) = self.conversion.read().clone() else {
            return Ok(value);
        };
        let source = value.as_ref().type_id();
        if service.can_convert(source, target) {
            service.convert(value, target)
        } else {
            Ok(value)
        }
    }

    /// 初始化：能力回调、前置钩子、初始化契约与定义级钩子、后置钩子
    fn initialize(
        &self,
        name: &str,
        instance: Value,
        definition: &Arc<ComponentDefinition>,
    ) -> ContainerResult<Value> {
        let descriptor = definition.descriptor();

        // 能力回调按能力逐项分派，而非类型层级
        if let Some(aware) = descriptor.container_aware() {
            if let Some(container) = self.self_ref.upgrade() {
                aware(instance.as_ref(), container);
            }
        }
        if let Some(aware) = descriptor.name_aware() {
            aware(instance.as_ref(), name);
        }
        if let Some(aware) = descriptor.descriptor_aware() {
            aware(instance.as_ref(), descriptor.clone());
        }

        let wrapped = self.apply_before_initialization(instance, name)?;
        self.invoke_init_hooks(name, &wrapped, definition)?;
        self.apply_after_initialization(wrapped, name)
    }

    /// 依次调用实例自身的初始化契约与定义级初始化钩子
    ///
    /// 两者都存在且并非同一操作时各调用一次。
    fn invoke_init_hooks(
        &self,
        name: &str,
        instance: &Value,
        definition: &Arc<ComponentDefinition>,
    ) -> ContainerResult<()> {
        let descriptor = definition.descriptor();
        if let Some((_, hook)) = descriptor.init() {
            debug!("执行初始化契约: {}", name);
            hook(instance.as_ref()).map_err(|source| ContainerError::lifecycle(name, source))?;
        }
        if let Some(hook_name) = definition.init_hook() {
            if descriptor.init().map(|(canonical, _)| canonical) != Some(hook_name) {
                let method = descriptor.method(hook_name).ok_or_else(|| {
                    ContainerError::lifecycle(name, format!("找不到初始化方法 {hook_name}"))
                })?;
                debug!("执行定义级初始化钩子 {}: {}", hook_name, name);
                method(instance.as_ref(), &[])
                    .map_err(|source| ContainerError::lifecycle(name, source))?;
            }
        }
        Ok(())
    }

    fn apply_before_initialization(&self, instance: Value, name: &str) -> ContainerResult<Value> {
        let mut current = instance;
        let processors = self.processors.read().clone();
        for processor in &processors {
            match processor.before_initialization(current.clone(), name)? {
                Some(replacement) => current = replacement,
                None => break,
            }
        }
        Ok(current)
    }

    fn apply_after_initialization(&self, instance: Value, name: &str) -> ContainerResult<Value> {
        let mut current = instance;
        let processors = self.processors.read().clone();
        for processor in &processors {
            match processor.after_initialization(current.clone(), name)? {
                Some(replacement) => current = replacement,
                None => break,
            }
        }
        Ok(current)
    }

    /// 声明了销毁契约或配置了销毁钩子的单例登记销毁记录
    fn register_disposable(
        &self,
        name: &str,
        instance: &Value,
        definition: &Arc<ComponentDefinition>,
    ) {
        if !definition.is_singleton() {
            return;
        }
        let descriptor = definition.descriptor();
        let hook_name = definition.destroy_hook();
        if descriptor.destroy().is_none() && hook_name.is_none() {
            return;
        }

        let mut record = DisposalRecord::new(name);
        if let Some((_, contract)) = descriptor.destroy() {
            let target = instance.clone();
            let contract = contract.clone();
            record.push_action(Box::new(move || contract(target.as_ref())));
        }
        if let Some(hook_name) = hook_name {
            if descriptor.destroy().map(|(canonical, _)| canonical) != Some(hook_name) {
                match descriptor.method(hook_name) {
                    Some(method) => {
                        let target = instance.clone();
                        let method = method.clone();
                        record.push_action(Box::new(move || {
                            method(target.as_ref(), &[]).map(|_| ())
                        }));
                    }
                    None => {
                        let missing = format!("找不到销毁方法 {hook_name}");
                        record.push_action(Box::new(move || Err(missing.into())));
                    }
                }
            }
        }
        debug!("登记销毁记录: {}", name);
        self.singletons.register_disposal(record);
    }
}
