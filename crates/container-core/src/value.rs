//! 组件实例与属性值的统一表示

use std::any::Any;
use std::sync::Arc;

/// 组件实例与字面量值的统一表示
///
/// 容器内部不区分"某个具体类型的实例"与"任意值"，统一以类型擦除的
/// 共享指针流转，按需向下转型。
pub type Value = Arc<dyn Any + Send + Sync>;

/// 对另一个组件定义的符号引用，在属性填充阶段按名称惰性解析
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReference {
    target: String,
}

impl ComponentReference {
    /// 创建指向指定组件名称的引用
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// 被引用的组件名称
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// 属性值：字面量或组件引用
#[derive(Clone)]
pub enum PropertyValue {
    /// 字面量值，按原样（或经类型强转后）写入目标属性
    Literal(Value),
    /// 组件引用，填充时通过容器递归解析
    Reference(ComponentReference),
}

impl PropertyValue {
    /// 从具体值创建字面量属性值
    pub fn literal<V: Any + Send + Sync>(value: V) -> Self {
        Self::Literal(Arc::new(value))
    }

    /// 创建指向指定组件名称的引用属性值
    pub fn reference(target: impl Into<String>) -> Self {
        Self::Reference(ComponentReference::new(target))
    }
}

impl std::fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(_) => f.write_str("Literal(..)"),
            Self::Reference(r) => f.debug_tuple("Reference").field(&r.target).finish(),
        }
    }
}

/// 单条属性绑定
#[derive(Debug, Clone)]
pub struct PropertyBinding {
    name: String,
    value: PropertyValue,
}

impl PropertyBinding {
    /// 创建属性绑定
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// 属性名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 属性值
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }
}

/// 有序的属性绑定集
///
/// 同一定义内属性名称唯一：按名称重复写入时原地覆盖，保持首次
/// 插入的次序（后写胜出）。
#[derive(Debug, Clone, Default)]
pub struct PropertyBindings {
    entries: Vec<PropertyBinding>,
}

impl PropertyBindings {
    /// 创建空的绑定集
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一条绑定，名称已存在时覆盖旧值
    pub fn add(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        if let Some(existing) = self.entries.iter_mut().find(|b| b.name == name) {
            existing.value = value;
        } else {
            self.entries.push(PropertyBinding::new(name, value));
        }
    }

    /// 按名称查找绑定值
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.value)
    }

    /// 将另一组绑定合并进来，按名称覆盖
    pub fn merge(&mut self, other: PropertyBindings) {
        for binding in other.entries {
            self.add(binding.name, binding.value);
        }
    }

    /// 全部绑定条目，保持插入次序
    pub fn entries(&self) -> &[PropertyBinding] {
        &self.entries
    }

    /// 绑定条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 绑定集是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
