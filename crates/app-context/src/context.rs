//! 应用上下文

use crate::listener::ContextListener;
use container_core::{
    ComponentContainer, ContainerResult, DefinitionProcessor, Value,
};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 应用上下文
///
/// 在裸容器之上提供确定的生命周期：`refresh` 执行定义级钩子、急切
/// 构造全部单例并广播引导完成事件；`close` 广播关闭事件并逆序销毁
/// 单例。两个阶段各自幂等，未显式关闭的上下文在丢弃时自动关闭。
pub struct AppContext {
    container: Arc<ComponentContainer>,
    eager: Vec<String>,
    definition_processors: Vec<Arc<dyn DefinitionProcessor>>,
    listeners: Vec<Arc<dyn ContextListener>>,
    refreshed: AtomicBool,
    closed: AtomicBool,
}

impl AppContext {
    pub(crate) fn assemble(
        container: Arc<ComponentContainer>,
        eager: Vec<String>,
        definition_processors: Vec<Arc<dyn DefinitionProcessor>>,
        listeners: Vec<Arc<dyn ContextListener>>,
    ) -> Self {
        Self {
            container,
            eager,
            definition_processors,
            listeners,
            refreshed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// 底层容器
    pub fn container(&self) -> &Arc<ComponentContainer> {
        &self.container
    }

    /// 刷新上下文：定义级钩子、急切单例构造与引导完成广播
    ///
    /// 重复刷新是无操作。任一单例构造失败即中止并返回错误，已完成
    /// 的单例保持可用。
    pub fn refresh(&self) -> ContainerResult<()> {
        if self.refreshed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("刷新上下文");

        for processor in &self.definition_processors {
            processor.process(self.container.definitions())?;
        }

        // 按声明次序急切构造；定义级钩子新增的定义排在其后
        let mut names = self.eager.clone();
        for name in self.container.definitions().names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        for name in &names {
            let definition = self.container.definitions().get(name)?;
            if definition.is_singleton() && definition.descriptor().producer().is_none() {
                self.container.get_component(name)?;
            }
        }

        for listener in &self.listeners {
            listener.on_bootstrap_complete(&self.container);
        }
        info!("上下文就绪: {} 个定义", names.len());
        Ok(())
    }

    /// 按名称获取组件
    pub fn get_component(&self, name: &str) -> ContainerResult<Value> {
        self.container.get_component(name)
    }

    /// 按名称获取组件并向下转型
    pub fn get_component_as<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.container.get_component_as::<T>(name)
    }

    /// 是否存在指定名称的组件
    pub fn contains_component(&self, name: &str) -> bool {
        self.container.contains_component(name)
    }

    /// 关闭上下文：广播关闭事件后逆序销毁全部单例
    ///
    /// 重复关闭是无操作。
    pub fn close(&self) -> ContainerResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("关闭上下文");
        for listener in &self.listeners {
            listener.on_container_closing(&self.container);
        }
        self.container.destroy_all()
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!("上下文关闭时销毁失败: {}", error);
        }
    }
}
