//! 扩展钩子流水线的参与者接口
//!
//! 五个生命周期切入点按注册次序遍历全部钩子，阶段内前一个钩子的
//! 输出即后一个钩子的输入，副作用同步可见。返回 `None` 表示终止本
//! 阶段的继续遍历，以最后一个非 `None` 值为准。

use crate::definition::DefinitionStore;
use crate::descriptor::TypeDescriptor;
use crate::error::ContainerResult;
use crate::value::{PropertyBindings, Value};
use std::sync::Arc;

/// 标准扩展钩子：环绕初始化的前置与后置处理
pub trait ComponentProcessor: Send + Sync {
    /// 初始化前处理，可替换实例
    fn before_initialization(&self, instance: Value, _name: &str) -> ContainerResult<Option<Value>> {
        Ok(Some(instance))
    }

    /// 初始化后处理，可替换实例（代理织入的标准切入点）
    fn after_initialization(&self, instance: Value, _name: &str) -> ContainerResult<Option<Value>> {
        Ok(Some(instance))
    }

    /// 若同时实现了实例化感知扩展接口，返回对应视图
    fn as_instantiation_aware(&self) -> Option<&dyn InstantiationAwareProcessor> {
        None
    }
}

/// 实例化感知扩展钩子：参与实例化前后与属性填充阶段
pub trait InstantiationAwareProcessor: ComponentProcessor {
    /// 实例化前表决，返回替代实例则完全跳过常规构造
    ///
    /// 首个非 `None` 结果胜出，本阶段其余钩子不再执行。
    fn before_instantiation(
        &self,
        _descriptor: &Arc<TypeDescriptor>,
        _name: &str,
    ) -> ContainerResult<Option<Value>> {
        Ok(None)
    }

    /// 实例化后闸门，返回 `false` 则跳过属性填充（初始化仍执行）
    fn after_instantiation(&self, _instance: &Value, _name: &str) -> ContainerResult<bool> {
        Ok(true)
    }

    /// 属性填充前改写绑定集，返回的条目按名称合并进定义
    fn bindings(
        &self,
        _bindings: &PropertyBindings,
        _instance: &Value,
        _name: &str,
    ) -> ContainerResult<Option<PropertyBindings>> {
        Ok(None)
    }

    /// 早期引用曝光，可替换早期表示（代理织入的循环依赖切入点）
    fn early_reference(&self, instance: Value, _name: &str) -> ContainerResult<Option<Value>> {
        Ok(Some(instance))
    }
}

/// 定义级扩展钩子：在任何组件实例化之前改写定义仓库
pub trait DefinitionProcessor: Send + Sync {
    /// 处理定义仓库
    fn process(&self, store: &DefinitionStore) -> ContainerResult<()>;
}
