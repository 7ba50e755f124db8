//! 代理织入的错误类型定义

use container_core::BoxError;
use thiserror::Error;

/// 代理织入与方法分派错误
#[derive(Error, Debug)]
pub enum ProxyError {
    /// 接口式代理要求目标类型声明至少一个接口
    #[error("接口式代理创建失败: 类型 {type_name} 未声明任何接口")]
    NoInterfaces {
        /// 目标类型名称
        type_name: String,
    },

    /// 子类式代理要求目标类型登记方法表
    #[error("子类式代理创建失败: 类型 {type_name} 未登记方法表")]
    MissingMethodTable {
        /// 目标类型名称
        type_name: String,
    },

    /// 通过代理调用了未登记的方法
    #[error("方法未登记: {method}")]
    UnknownMethod {
        /// 请求的方法名称
        method: String,
    },

    /// 拦截器链或目标方法执行失败
    #[error("方法调用失败: {method}, 原因: {source}")]
    Invocation {
        /// 方法名称
        method: String,
        /// 底层失败原因
        source: BoxError,
    },
}

impl ProxyError {
    /// 创建方法调用错误
    pub fn invocation(method: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Invocation {
            method: method.into(),
            source: source.into(),
        }
    }
}

/// 结果类型别名
pub type ProxyResult<T> = Result<T, ProxyError>;
