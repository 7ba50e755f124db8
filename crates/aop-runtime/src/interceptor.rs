//! 方法拦截器与调用链

use container_core::{BoxError, MethodFn, Value};
use std::sync::Arc;
use tracing::trace;

/// 环绕通知拦截器
///
/// 拦截器对 [`MethodInvocation::proceed`] 的调用次数不受限制：零次
/// 即短路目标方法，一次是常规环绕，多次可用于重试类通知。
pub trait MethodInterceptor: Send + Sync {
    /// 环绕目标方法执行
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Option<Value>, BoxError>;
}

impl<F> MethodInterceptor for F
where
    F: Fn(&mut MethodInvocation<'_>) -> Result<Option<Value>, BoxError> + Send + Sync,
{
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Option<Value>, BoxError> {
        self(invocation)
    }
}

/// 一次进行中的代理方法调用
///
/// 携带目标实例、方法名、参数与剩余拦截器链；`proceed` 沿链推进,
/// 链耗尽后调用目标方法本身。
pub struct MethodInvocation<'a> {
    target: &'a Value,
    method: &'a str,
    args: &'a [Value],
    chain: &'a [Arc<dyn MethodInterceptor>],
    terminal: &'a MethodFn,
    cursor: usize,
}

impl<'a> MethodInvocation<'a> {
    /// 创建一次调用
    pub fn new(
        target: &'a Value,
        method: &'a str,
        args: &'a [Value],
        chain: &'a [Arc<dyn MethodInterceptor>],
        terminal: &'a MethodFn,
    ) -> Self {
        Self {
            target,
            method,
            args,
            chain,
            terminal,
            cursor: 0,
        }
    }

    /// 目标实例
    pub fn target(&self) -> &Value {
        self.target
    }

    /// 被调用的方法名称
    pub fn method(&self) -> &str {
        self.method
    }

    /// 调用参数
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// 推进到链上的下一个拦截器；链耗尽时执行目标方法
    ///
    /// 返回后游标回退，因此同一拦截器可以再次推进。
    pub fn proceed(&mut self) -> Result<Option<Value>, BoxError> {
        if self.cursor >= self.chain.len() {
            trace!("拦截器链耗尽, 调用目标方法: {}", self.method);
            return (self.terminal)(self.target.as_ref(), self.args);
        }
        let interceptor = self.chain[self.cursor].clone();
        self.cursor += 1;
        let result = interceptor.invoke(self);
        self.cursor -= 1;
        result
    }
}

/// 前置通知：只关心目标方法执行之前的切面逻辑
pub trait BeforeAdvice: Send + Sync {
    /// 目标方法执行前调用；返回错误即中止本次调用
    fn before(&self, method: &str, args: &[Value], target: &Value) -> Result<(), BoxError>;
}

impl<F> BeforeAdvice for F
where
    F: Fn(&str, &[Value], &Value) -> Result<(), BoxError> + Send + Sync,
{
    fn before(&self, method: &str, args: &[Value], target: &Value) -> Result<(), BoxError> {
        self(method, args, target)
    }
}

/// 把前置通知适配为环绕拦截器
pub struct BeforeAdviceInterceptor {
    advice: Arc<dyn BeforeAdvice>,
}

impl BeforeAdviceInterceptor {
    /// 包装一个前置通知
    pub fn new(advice: Arc<dyn BeforeAdvice>) -> Self {
        Self { advice }
    }
}

impl MethodInterceptor for BeforeAdviceInterceptor {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Option<Value>, BoxError> {
        self.advice
            .before(invocation.method(), invocation.args(), invocation.target())?;
        invocation.proceed()
    }
}
