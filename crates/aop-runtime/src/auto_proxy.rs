//! 自动代理扩展钩子

use crate::advisor::PointcutAdvisor;
use crate::proxy::{ProxyFactory, WovenProxy};
use container_core::{
    ComponentContainer, ComponentProcessor, ContainerError, ContainerResult,
    InstantiationAwareProcessor, Value,
};
use dashmap::DashSet;
use std::sync::{Arc, Weak};
use tracing::debug;

/// 按顾问织入的自动代理钩子
///
/// 挂接在两个切入点上：常规组件走初始化后置钩子织入；被循环依赖
/// 提前曝光的组件走早期引用钩子织入。同一名称只织入一次——早期
/// 织入过的组件在后置钩子中原样放行。
pub struct AdvisorAutoProxyProcessor {
    container: Weak<ComponentContainer>,
    early_proxied: DashSet<String>,
}

impl AdvisorAutoProxyProcessor {
    /// 创建绑定到指定容器的自动代理钩子
    pub fn new(container: &Arc<ComponentContainer>) -> Self {
        Self {
            container: Arc::downgrade(container),
            early_proxied: DashSet::new(),
        }
    }

    /// 织入基础设施自身（顾问、代理）不参与自动代理
    fn is_infrastructure(instance: &Value) -> bool {
        instance.downcast_ref::<PointcutAdvisor>().is_some()
            || instance.downcast_ref::<WovenProxy>().is_some()
    }

    /// 发现匹配的顾问并在必要时织入代理
    fn wrap_if_necessary(&self, instance: Value, name: &str) -> ContainerResult<Value> {
        if Self::is_infrastructure(&instance) {
            return Ok(instance);
        }
        let Some(container) = self.container.upgrade() else {
            return Ok(instance);
        };
        // 未以定义注册的组件没有描述符, 无从织入
        let Ok(definition) = container.definitions().get(name) else {
            return Ok(instance);
        };
        let descriptor = definition.descriptor().clone();

        let mut advisors: Vec<(String, Arc<PointcutAdvisor>)> = container
            .components_of_type::<PointcutAdvisor>()?
            .into_iter()
            .filter(|(_, advisor)| advisor.applies_to(&descriptor))
            .collect();
        if advisors.is_empty() {
            return Ok(instance);
        }
        // 按名称排序, 保证拦截器链的次序确定
        advisors.sort_by(|a, b| a.0.cmp(&b.0));

        debug!("自动代理: {} 命中 {} 个顾问", name, advisors.len());
        let subclass_capable = descriptor.has_methods();
        let proxy = ProxyFactory::new(instance, descriptor)
            .add_advisors(advisors.into_iter().map(|(_, advisor)| advisor))
            .proxy_target_class(subclass_capable)
            .create()
            .map_err(|source| ContainerError::proxy_creation(name, source))?;
        let woven: Value = proxy;
        Ok(woven)
    }
}

impl ComponentProcessor for AdvisorAutoProxyProcessor {
    fn after_initialization(&self, instance: Value, name: &str) -> ContainerResult<Option<Value>> {
        // 早期引用阶段已织入过的组件不再二次织入
        if self.early_proxied.remove(name).is_some() {
            return Ok(Some(instance));
        }
        self.wrap_if_necessary(instance, name).map(Some)
    }

    fn as_instantiation_aware(&self) -> Option<&dyn InstantiationAwareProcessor> {
        Some(self)
    }
}

impl InstantiationAwareProcessor for AdvisorAutoProxyProcessor {
    fn early_reference(&self, instance: Value, name: &str) -> ContainerResult<Option<Value>> {
        self.early_proxied.insert(name.to_string());
        self.wrap_if_necessary(instance, name).map(Some)
    }
}
