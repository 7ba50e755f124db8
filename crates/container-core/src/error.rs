//! 错误类型定义

use thiserror::Error;

/// 被包装的底层错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 容器错误类型
#[derive(Error, Debug)]
pub enum ContainerError {
    /// 按名称查找组件失败
    #[error("组件未注册: {name}")]
    NotFound {
        /// 请求的组件名称
        name: String,
    },

    /// 构造组件实例失败
    #[error("组件实例化失败: {name}, 原因: {source}")]
    Instantiation {
        /// 组件名称
        name: String,
        /// 底层失败原因
        source: BoxError,
    },

    /// 属性装配失败
    #[error("属性绑定失败: 组件 {name} 的属性 {property}, 原因: {source}")]
    PropertyBinding {
        /// 组件名称
        name: String,
        /// 出错的属性名称
        property: String,
        /// 底层失败原因
        source: BoxError,
    },

    /// 初始化或销毁回调失败
    #[error("生命周期回调失败: 组件 {name}, 原因: {source}")]
    Lifecycle {
        /// 组件名称
        name: String,
        /// 底层失败原因
        source: BoxError,
    },

    /// 按类型获取组件时类型不可赋值
    #[error("类型不匹配: 组件 {name} 请求类型 {requested}, 实际类型 {actual}")]
    TypeMismatch {
        /// 组件名称
        name: String,
        /// 调用方请求的类型名称
        requested: String,
        /// 实际解析得到的类型名称
        actual: String,
    },

    /// 代理织入失败
    #[error("代理创建失败: 组件 {name}, 原因: {source}")]
    ProxyCreation {
        /// 组件名称
        name: String,
        /// 底层失败原因
        source: BoxError,
    },

    /// 销毁清扫完成后汇总的失败集合
    #[error("销毁阶段共 {} 个组件失败: [{}]", failures.len(), format_failures(failures))]
    DisposalAggregate {
        /// 每个失败组件的名称与原因
        failures: Vec<DisposalFailure>,
    },
}

/// 单个组件的销毁失败信息
#[derive(Debug)]
pub struct DisposalFailure {
    /// 组件名称
    pub name: String,
    /// 底层失败原因
    pub source: BoxError,
}

fn format_failures(failures: &[DisposalFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.source))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ContainerError {
    /// 创建组件未注册错误
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// 创建实例化错误
    pub fn instantiation(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Instantiation {
            name: name.into(),
            source: source.into(),
        }
    }

    /// 创建属性绑定错误
    pub fn property_binding(
        name: impl Into<String>,
        property: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::PropertyBinding {
            name: name.into(),
            property: property.into(),
            source: source.into(),
        }
    }

    /// 创建生命周期错误
    pub fn lifecycle(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Lifecycle {
            name: name.into(),
            source: source.into(),
        }
    }

    /// 创建代理创建错误
    pub fn proxy_creation(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ProxyCreation {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// 结果类型别名
pub type ContainerResult<T> = Result<T, ContainerError>;
