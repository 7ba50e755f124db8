//! 织入代理与代理工厂

use crate::advisor::PointcutAdvisor;
use crate::error::{ProxyError, ProxyResult};
use crate::interceptor::{MethodInterceptor, MethodInvocation};
use container_core::{MethodFn, TypeDescriptor, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// 代理的织入形态
enum ProxyKind {
    /// 接口式：调用时经类型描述符查找方法
    InterfaceBased,
    /// 子类式：创建期绑定方法表快照，作为"超类调用"句柄
    SubclassBased {
        bound_methods: HashMap<String, MethodFn>,
    },
}

/// 织入后的代理对象
///
/// 代理持有原始目标实例与匹配到的顾问集；每次方法调用先组装命中
/// 该方法的拦截器链，再经 [`MethodInvocation`] 环绕执行目标方法。
/// 代理自身以 [`Value`] 的形态替换容器中的目标实例。
pub struct WovenProxy {
    target: Value,
    descriptor: Arc<TypeDescriptor>,
    advisors: Vec<Arc<PointcutAdvisor>>,
    kind: ProxyKind,
}

impl std::fmt::Debug for WovenProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            ProxyKind::InterfaceBased => "interface",
            ProxyKind::SubclassBased { .. } => "subclass",
        };
        f.debug_struct("WovenProxy")
            .field("type_name", &self.descriptor.type_name())
            .field("kind", &kind)
            .field("advisors", &self.advisors.len())
            .finish()
    }
}

impl WovenProxy {
    /// 被代理的原始目标实例
    pub fn target(&self) -> &Value {
        &self.target
    }

    /// 目标类型的描述符
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// 通过代理调用方法
    ///
    /// 未命中任何顾问的方法直接透传到目标方法。
    pub fn invoke(&self, method: &str, args: &[Value]) -> ProxyResult<Option<Value>> {
        let terminal = match &self.kind {
            ProxyKind::SubclassBased { bound_methods } => bound_methods.get(method),
            ProxyKind::InterfaceBased => self.descriptor.method(method),
        }
        .ok_or_else(|| ProxyError::UnknownMethod {
            method: method.to_string(),
        })?;

        let chain: Vec<Arc<dyn MethodInterceptor>> = self
            .advisors
            .iter()
            .filter(|advisor| advisor.pointcut().matches_method(method, &self.descriptor))
            .map(|advisor| advisor.interceptor().clone())
            .collect();

        if chain.is_empty() {
            trace!("方法 {} 未命中任何顾问, 直接透传", method);
            return terminal(self.target.as_ref(), args)
                .map_err(|source| ProxyError::invocation(method, source));
        }

        trace!("方法 {} 命中 {} 个拦截器", method, chain.len());
        MethodInvocation::new(&self.target, method, args, &chain, terminal)
            .proceed()
            .map_err(|source| ProxyError::invocation(method, source))
    }
}

/// 代理工厂
///
/// 汇集目标实例、类型描述符与顾问集，按织入形态开关产出代理。
pub struct ProxyFactory {
    target: Value,
    descriptor: Arc<TypeDescriptor>,
    advisors: Vec<Arc<PointcutAdvisor>>,
    proxy_target_class: bool,
}

impl ProxyFactory {
    /// 以目标实例与类型描述符创建工厂，默认接口式织入
    pub fn new(target: Value, descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            target,
            descriptor,
            advisors: Vec::new(),
            proxy_target_class: false,
        }
    }

    /// 追加一个顾问
    pub fn add_advisor(mut self, advisor: Arc<PointcutAdvisor>) -> Self {
        self.advisors.push(advisor);
        self
    }

    /// 追加一组顾问
    pub fn add_advisors(mut self, advisors: impl IntoIterator<Item = Arc<PointcutAdvisor>>) -> Self {
        self.advisors.extend(advisors);
        self
    }

    /// 是否采用子类式织入（绕过接口声明, 直接代理目标类型）
    pub fn proxy_target_class(mut self, enabled: bool) -> Self {
        self.proxy_target_class = enabled;
        self
    }

    /// 产出代理
    ///
    /// 子类式要求目标类型登记了方法表；接口式要求目标类型声明了
    /// 至少一个接口。
    pub fn create(self) -> ProxyResult<Arc<WovenProxy>> {
        let kind = if self.proxy_target_class {
            if !self.descriptor.has_methods() {
                return Err(ProxyError::MissingMethodTable {
                    type_name: self.descriptor.type_name().to_string(),
                });
            }
            ProxyKind::SubclassBased {
                bound_methods: self.descriptor.methods_snapshot(),
            }
        } else {
            if self.descriptor.interfaces().is_empty() {
                return Err(ProxyError::NoInterfaces {
                    type_name: self.descriptor.type_name().to_string(),
                });
            }
            ProxyKind::InterfaceBased
        };

        debug!(
            "织入代理: {} ({} 个顾问)",
            self.descriptor.type_name(),
            self.advisors.len()
        );
        Ok(Arc::new(WovenProxy {
            target: self.target,
            descriptor: self.descriptor,
            advisors: self.advisors,
            kind,
        }))
    }
}

/// 统一的方法分派入口：值可能是代理, 也可能是原始实例
///
/// 调用方从容器取回组件后经此分派方法调用，无须关心织入是否发生。
pub fn dispatch(
    value: &Value,
    descriptor: &Arc<TypeDescriptor>,
    method: &str,
    args: &[Value],
) -> ProxyResult<Option<Value>> {
    if let Some(proxy) = value.downcast_ref::<WovenProxy>() {
        return proxy.invoke(method, args);
    }
    let target_method = descriptor.method(method).ok_or_else(|| ProxyError::UnknownMethod {
        method: method.to_string(),
    })?;
    target_method(value.as_ref(), args).map_err(|source| ProxyError::invocation(method, source))
}
