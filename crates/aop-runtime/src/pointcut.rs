//! 切点：类筛选器与方法匹配器的组合

use container_core::TypeDescriptor;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// 类级筛选器：判断一个目标类型是否落入切点范围
pub trait ClassFilter: Send + Sync {
    /// 目标类型是否匹配
    fn matches(&self, descriptor: &TypeDescriptor) -> bool;
}

impl<F> ClassFilter for F
where
    F: Fn(&TypeDescriptor) -> bool + Send + Sync,
{
    fn matches(&self, descriptor: &TypeDescriptor) -> bool {
        self(descriptor)
    }
}

/// 方法级匹配器：判断目标类型上的某个方法是否落入切点范围
pub trait MethodMatcher: Send + Sync {
    /// 指定方法是否匹配
    fn matches(&self, method: &str, descriptor: &TypeDescriptor) -> bool;
}

impl<F> MethodMatcher for F
where
    F: Fn(&str, &TypeDescriptor) -> bool + Send + Sync,
{
    fn matches(&self, method: &str, descriptor: &TypeDescriptor) -> bool {
        self(method, descriptor)
    }
}

static MATCH_ALL_CLASSES: Lazy<Arc<dyn ClassFilter>> =
    Lazy::new(|| Arc::new(|_: &TypeDescriptor| true));

static MATCH_ALL_METHODS: Lazy<Arc<dyn MethodMatcher>> =
    Lazy::new(|| Arc::new(|_: &str, _: &TypeDescriptor| true));

/// 切点：类筛选器与方法匹配器的组合
///
/// 两级匹配都通过时方法才被通知覆盖。类筛选在自动代理决策阶段使用，
/// 方法匹配在每次代理调用时使用。
#[derive(Clone)]
pub struct Pointcut {
    class_filter: Arc<dyn ClassFilter>,
    method_matcher: Arc<dyn MethodMatcher>,
}

impl Pointcut {
    /// 以指定的类筛选器与方法匹配器创建切点
    pub fn new(class_filter: Arc<dyn ClassFilter>, method_matcher: Arc<dyn MethodMatcher>) -> Self {
        Self {
            class_filter,
            method_matcher,
        }
    }

    /// 匹配一切类型与方法的切点
    pub fn match_all() -> Self {
        Self {
            class_filter: MATCH_ALL_CLASSES.clone(),
            method_matcher: MATCH_ALL_METHODS.clone(),
        }
    }

    /// 只做方法级匹配的切点，类级一律通过
    pub fn for_methods(method_matcher: Arc<dyn MethodMatcher>) -> Self {
        Self {
            class_filter: MATCH_ALL_CLASSES.clone(),
            method_matcher,
        }
    }

    /// 类级匹配
    pub fn matches_class(&self, descriptor: &TypeDescriptor) -> bool {
        self.class_filter.matches(descriptor)
    }

    /// 方法级匹配（隐含类级匹配通过）
    pub fn matches_method(&self, method: &str, descriptor: &TypeDescriptor) -> bool {
        self.class_filter.matches(descriptor) && self.method_matcher.matches(method, descriptor)
    }
}

impl std::fmt::Debug for Pointcut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pointcut(..)")
    }
}

/// 按方法名模式匹配的切点
///
/// 模式支持精确名称与尾部 `*` 通配（如 `find*` 匹配所有 `find` 开头
/// 的方法），任一模式命中即匹配。
#[derive(Debug, Clone)]
pub struct NamePatternPointcut {
    patterns: Vec<String>,
}

impl NamePatternPointcut {
    /// 以一组方法名模式创建切点
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    fn matches_name(&self, method: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            match pattern.strip_suffix('*') {
                Some(prefix) => method.starts_with(prefix),
                None => method == pattern,
            }
        })
    }

    /// 转换为通用切点
    pub fn into_pointcut(self) -> Pointcut {
        Pointcut::for_methods(Arc::new(move |method: &str, _: &TypeDescriptor| {
            self.matches_name(method)
        }))
    }
}
