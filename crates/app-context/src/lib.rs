//! # 应用上下文
//!
//! 组件容器的装配外壳：以构建器声明定义、扩展钩子与外部协作者，
//! `refresh` 一次性完成定义级处理、急切单例构造与引导完成广播，
//! `close`（或丢弃上下文）逆序销毁全部单例。
//!
//! ```
//! use app_context::ContextBuilder;
//! use container_core::{ComponentDefinition, TypeDescriptor};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default)]
//! struct Clock;
//!
//! let descriptor = TypeDescriptor::builder::<Clock>()
//!     .constructor(0, |_| Ok(Clock))
//!     .build();
//! let context = ContextBuilder::new()
//!     .definition("clock", Arc::new(ComponentDefinition::new(descriptor)))
//!     .build();
//! context.refresh().unwrap();
//! assert!(context.contains_component("clock"));
//! ```

pub mod builder;
pub mod context;
pub mod listener;

pub use builder::ContextBuilder;
pub use context::AppContext;
pub use listener::ContextListener;
