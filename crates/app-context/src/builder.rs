//! 上下文构建器

use crate::context::AppContext;
use crate::listener::ContextListener;
use aop_runtime::AdvisorAutoProxyProcessor;
use container_core::{
    ComponentContainer, ComponentDefinition, ComponentProcessor, ConversionService,
    DefinitionProcessor, InstantiationStrategy, StringValueResolver, Value,
};
use std::sync::Arc;
use tracing::info;

/// 应用上下文构建器
///
/// 声明式地汇集定义、预构建单例、扩展钩子与外部协作者；`build`
/// 组装出尚未刷新的上下文，组件构造推迟到 [`AppContext::refresh`]。
#[derive(Default)]
pub struct ContextBuilder {
    definitions: Vec<(String, Arc<ComponentDefinition>)>,
    singletons: Vec<(String, Value)>,
    processors: Vec<Arc<dyn ComponentProcessor>>,
    definition_processors: Vec<Arc<dyn DefinitionProcessor>>,
    listeners: Vec<Arc<dyn ContextListener>>,
    conversion: Option<Arc<dyn ConversionService>>,
    string_resolvers: Vec<Arc<dyn StringValueResolver>>,
    strategy: Option<Arc<dyn InstantiationStrategy>>,
    enable_interception: bool,
}

impl ContextBuilder {
    /// 创建空构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 声明一个组件定义；刷新时按声明次序急切构造单例
    pub fn definition(mut self, name: impl Into<String>, definition: Arc<ComponentDefinition>) -> Self {
        self.definitions.push((name.into(), definition));
        self
    }

    /// 注册一个预构建单例
    pub fn singleton(mut self, name: impl Into<String>, instance: Value) -> Self {
        self.singletons.push((name.into(), instance));
        self
    }

    /// 追加一个扩展钩子
    pub fn processor(mut self, processor: Arc<dyn ComponentProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// 追加一个定义级扩展钩子，刷新伊始执行
    pub fn definition_processor(mut self, processor: Arc<dyn DefinitionProcessor>) -> Self {
        self.definition_processors.push(processor);
        self
    }

    /// 追加一个上下文生命周期监听器
    pub fn listener(mut self, listener: Arc<dyn ContextListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// 配置类型转换服务
    pub fn conversion_service(mut self, service: Arc<dyn ConversionService>) -> Self {
        self.conversion = Some(service);
        self
    }

    /// 追加一个字符串值解析器
    pub fn string_resolver(mut self, resolver: Arc<dyn StringValueResolver>) -> Self {
        self.string_resolvers.push(resolver);
        self
    }

    /// 替换实例化策略
    pub fn instantiation_strategy(mut self, strategy: Arc<dyn InstantiationStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// 开启切面织入：安装自动代理钩子, 按容器中的顾问织入组件
    pub fn enable_interception(mut self) -> Self {
        self.enable_interception = true;
        self
    }

    /// 组装上下文（不触发组件构造）
    pub fn build(self) -> AppContext {
        let container = ComponentContainer::new();

        if let Some(strategy) = self.strategy {
            container.set_instantiation_strategy(strategy);
        }
        if let Some(conversion) = self.conversion {
            container.set_conversion_service(conversion);
        }
        for resolver in self.string_resolvers {
            container.add_string_resolver(resolver);
        }
        if self.enable_interception {
            container.add_processor(Arc::new(AdvisorAutoProxyProcessor::new(&container)));
        }
        for processor in self.processors {
            container.add_processor(processor);
        }

        let mut eager = Vec::with_capacity(self.definitions.len());
        for (name, definition) in self.definitions {
            container.register_definition(&name, definition);
            eager.push(name);
        }
        for (name, instance) in self.singletons {
            container.register_singleton(name, instance);
        }

        info!("上下文组装完成: {} 个定义", eager.len());
        AppContext::assemble(container, eager, self.definition_processors, self.listeners)
    }
}
