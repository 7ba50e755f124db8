//! # 面向切面运行时
//!
//! 建立在组件容器之上的代理织入层：切点描述"在哪些方法上生效"，
//! 拦截器描述"生效时做什么"，顾问把两者配对；代理工厂按织入形态
//! 产出代理对象，自动代理钩子把整套机制接入容器的构造管线。
//!
//! ## 两种织入形态
//!
//! - **接口式**：调用时经类型描述符查找方法，要求目标类型声明接口
//! - **子类式**：创建期快照方法表作为"超类调用"句柄，要求目标类型
//!   登记方法表
//!
//! 容器与调用方通过 [`dispatch`] 统一分派方法调用，无须区分取回的
//! 组件是代理还是原始实例。

pub mod advisor;
pub mod auto_proxy;
pub mod error;
pub mod interceptor;
pub mod pointcut;
pub mod proxy;

pub use advisor::PointcutAdvisor;
pub use auto_proxy::AdvisorAutoProxyProcessor;
pub use error::{ProxyError, ProxyResult};
pub use interceptor::{BeforeAdvice, BeforeAdviceInterceptor, MethodInterceptor, MethodInvocation};
pub use pointcut::{ClassFilter, MethodMatcher, NamePatternPointcut, Pointcut};
pub use proxy::{dispatch, ProxyFactory, WovenProxy};
