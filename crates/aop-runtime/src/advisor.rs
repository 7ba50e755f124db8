//! 顾问：切点与拦截器的绑定

use crate::interceptor::MethodInterceptor;
use crate::pointcut::Pointcut;
use container_core::TypeDescriptor;
use std::sync::Arc;

/// 切点顾问：一个切点与一个拦截器的配对
///
/// 以普通组件的身份注册进容器，自动代理钩子按类型发现全部顾问并
/// 据此决定哪些组件需要织入代理。
pub struct PointcutAdvisor {
    pointcut: Pointcut,
    interceptor: Arc<dyn MethodInterceptor>,
}

impl PointcutAdvisor {
    /// 以切点与拦截器创建顾问
    pub fn new(pointcut: Pointcut, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        Self {
            pointcut,
            interceptor,
        }
    }

    /// 匹配一切方法的顾问
    pub fn match_all(interceptor: Arc<dyn MethodInterceptor>) -> Self {
        Self::new(Pointcut::match_all(), interceptor)
    }

    /// 顾问的切点
    pub fn pointcut(&self) -> &Pointcut {
        &self.pointcut
    }

    /// 顾问的拦截器
    pub fn interceptor(&self) -> &Arc<dyn MethodInterceptor> {
        &self.interceptor
    }

    /// 顾问是否覆盖指定目标类型（类级匹配）
    pub fn applies_to(&self, descriptor: &TypeDescriptor) -> bool {
        self.pointcut.matches_class(descriptor)
    }
}

impl std::fmt::Debug for PointcutAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointcutAdvisor")
            .field("pointcut", &self.pointcut)
            .finish()
    }
}
