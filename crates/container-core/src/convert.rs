//! 外部协作者的边界契约

use crate::error::BoxError;
use crate::value::Value;
use std::any::TypeId;

/// 类型转换服务（外部协作者）
///
/// 属性填充阶段对字面量值做类型强转时咨询此服务；容器可以完全
/// 不配置转换服务，此时跳过强转。
pub trait ConversionService: Send + Sync {
    /// 是否支持从源类型到目标类型的转换
    fn can_convert(&self, source: TypeId, target: TypeId) -> bool;

    /// 执行转换
    fn convert(&self, value: Value, target: TypeId) -> Result<Value, BoxError>;
}

/// 字符串值解析器（外部协作者）
///
/// 内嵌占位符的字符串字面量在进入属性装配之前先经此解析。
pub trait StringValueResolver: Send + Sync {
    /// 解析字符串值，返回替换后的结果
    fn resolve(&self, value: &str) -> Result<String, BoxError>;
}
