//! 实例化策略

use crate::definition::ComponentDefinition;
use crate::descriptor::ConstructorSpec;
use crate::error::{ContainerError, ContainerResult};
use crate::value::Value;

/// 实例化策略 trait
///
/// 构造函数由调用方按参数数量预先选定（声明序首个匹配），策略只
/// 负责以选定的构造函数产出原始实例。
pub trait InstantiationStrategy: Send + Sync {
    /// 以选定的构造函数创建原始实例
    fn instantiate(
        &self,
        definition: &ComponentDefinition,
        name: &str,
        constructor: &ConstructorSpec,
        args: &[Value],
    ) -> ContainerResult<Value>;
}

/// 直接构造：调用选定的构造函数
#[derive(Debug, Default)]
pub struct DirectInstantiation;

impl InstantiationStrategy for DirectInstantiation {
    fn instantiate(
        &self,
        _definition: &ComponentDefinition,
        name: &str,
        constructor: &ConstructorSpec,
        args: &[Value],
    ) -> ContainerResult<Value> {
        constructor
            .invoke(args)
            .map_err(|source| ContainerError::instantiation(name, source))
    }
}

/// 子类式构造：产出可作为子类式代理基类的实例
///
/// 实例本身与直接构造无异（透传、无行为覆盖），但要求类型登记了
/// 方法表——后续的子类式织入需要据此捕获超类调用句柄。
#[derive(Debug, Default)]
pub struct SubclassCapableInstantiation;

impl InstantiationStrategy for SubclassCapableInstantiation {
    fn instantiate(
        &self,
        definition: &ComponentDefinition,
        name: &str,
        constructor: &ConstructorSpec,
        args: &[Value],
    ) -> ContainerResult<Value> {
        if !definition.descriptor().has_methods() {
            return Err(ContainerError::instantiation(
                name,
                format!(
                    "类型 {} 未登记方法表, 无法作为子类式代理的基类",
                    definition.descriptor().type_name()
                ),
            ));
        }
        constructor
            .invoke(args)
            .map_err(|source| ContainerError::instantiation(name, source))
    }
}
