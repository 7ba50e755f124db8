//! 上下文生命周期事件监听

use container_core::ComponentContainer;
use std::sync::Arc;

/// 上下文生命周期监听器
///
/// 两个通知点各至多触发一次：引导完成在全部急切单例构造完毕之后，
/// 容器关闭在销毁清扫开始之前。
pub trait ContextListener: Send + Sync {
    /// 引导完成：全部急切单例已就绪
    fn on_bootstrap_complete(&self, _container: &Arc<ComponentContainer>) {}

    /// 容器即将关闭：单例仍然可用, 销毁清扫尚未开始
    fn on_container_closing(&self, _container: &Arc<ComponentContainer>) {}
}
