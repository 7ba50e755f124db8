//! 三级单例缓存与销毁注册表
//!
//! 三级缓存解决单例之间的循环依赖：一级缓存存放已完成初始化的实例，
//! 二级缓存存放提前曝光的早期引用，三级缓存存放延迟生成早期引用的
//! 工厂闭包。晋升方向严格单向：工厂 → 早期引用 → 完成态，绝不回退。

use crate::error::{BoxError, ContainerError, ContainerResult, DisposalFailure};
use crate::value::Value;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// 早期引用工厂闭包，按名称至多执行一次
pub type SingletonFactory = Box<dyn FnOnce() -> ContainerResult<Value> + Send>;

/// 单条销毁动作
pub type TeardownFn = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

/// 一个组件的销毁记录：名称加有序的销毁动作序列
pub struct DisposalRecord {
    name: String,
    actions: Vec<TeardownFn>,
}

impl DisposalRecord {
    /// 创建空的销毁记录
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// 组件名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 追加一条销毁动作
    pub fn push_action(&mut self, action: TeardownFn) {
        self.actions.push(action);
    }
}

/// 同一名称在二、三级缓存中的待定状态
enum PendingState {
    /// 无待定表示（工厂已被取走执行中，或已被清理）
    Idle,
    /// 三级缓存：早期引用工厂
    Factory(SingletonFactory),
    /// 二级缓存：已曝光的早期引用
    Early(Value),
}

/// 三级单例缓存
///
/// 一级缓存是并发映射，可无锁并发读写；二、三级缓存合并为按名称的
/// 状态机，由每个名称各自的互斥锁保护，保证"取出工厂、执行、写回
/// 早期引用"这一晋升序列的原子性。
#[derive(Default)]
pub struct SingletonCache {
    finished: DashMap<String, Value>,
    pending: DashMap<String, Arc<Mutex<PendingState>>>,
    disposals: Mutex<Vec<DisposalRecord>>,
}

impl SingletonCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次检索一、二、三级缓存
    ///
    /// 命中三级缓存时执行工厂并将结果晋升至二级缓存，同时移除三级
    /// 条目；整个晋升过程持有该名称的互斥锁，因此工厂对任一名称至多
    /// 执行一次。工厂执行期间对其他名称的递归检索走各自的锁，不会
    /// 相互阻塞。
    pub fn get_singleton(&self, name: &str) -> ContainerResult<Option<Value>> {
        if let Some(entry) = self.finished.get(name) {
            return Ok(Some(entry.value().clone()));
        }

        let Some(slot) = self.pending.get(name).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };

        let mut state = slot.lock();
        match std::mem::replace(&mut *state, PendingState::Idle) {
            PendingState::Early(value) => {
                *state = PendingState::Early(value.clone());
                Ok(Some(value))
            }
            PendingState::Factory(factory) => {
                debug!("晋升早期引用: {}", name);
                let value = factory()?;
                *state = PendingState::Early(value.clone());
                Ok(Some(value))
            }
            PendingState::Idle => {
                // 可能恰在加锁前被终态晋升清理，回查一级缓存
                Ok(self.finished.get(name).map(|entry| entry.value().clone()))
            }
        }
    }

    /// 查看二级缓存中已曝光的早期引用，不触发三级缓存的工厂
    ///
    /// 终态晋升前据此判断该名称是否已向依赖方曝光过早期表示。
    pub fn peek_early(&self, name: &str) -> Option<Value> {
        let slot = self.pending.get(name).map(|entry| entry.value().clone())?;
        let state = slot.lock();
        match &*state {
            PendingState::Early(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// 注册早期引用工厂（写入三级缓存）
    ///
    /// 一级缓存已有该名称时不予写入，避免覆盖完成态单例；写入的同时
    /// 清掉同名的陈旧早期引用——构建中的组件不可能同时持有旧曝光。
    pub fn register_factory(&self, name: &str, factory: SingletonFactory) {
        if self.finished.contains_key(name) {
            debug!("忽略工厂注册, 单例已完成: {}", name);
            return;
        }
        let slot = self
            .pending
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(PendingState::Idle)))
            .value()
            .clone();
        *slot.lock() = PendingState::Factory(factory);
    }

    /// 终态晋升：写入一级缓存并清除该名称的二、三级条目
    pub fn commit(&self, name: &str, instance: Value) {
        debug!("提交完成态单例: {}", name);
        self.finished.insert(name.to_string(), instance);
        self.pending.remove(name);
    }

    /// 丢弃该名称的待定条目，用于构造失败后的清理
    pub fn discard_pending(&self, name: &str) {
        self.pending.remove(name);
    }

    /// 一级缓存是否持有该名称
    pub fn contains_finished(&self, name: &str) -> bool {
        self.finished.contains_key(name)
    }

    /// 一级缓存的一份快照
    pub fn finished_snapshot(&self) -> Vec<(String, Value)> {
        self.finished
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// 追加销毁记录；同名重复注册时原地覆盖，保留首次注册的次序
    pub fn register_disposal(&self, record: DisposalRecord) {
        let mut disposals = self.disposals.lock();
        if let Some(existing) = disposals.iter_mut().find(|r| r.name == record.name) {
            *existing = record;
        } else {
            disposals.push(record);
        }
    }

    /// 按注册次序的逆序执行全部销毁动作
    ///
    /// 单个动作失败不会中断清扫；所有失败在清扫完成后汇总为一个
    /// 聚合错误返回。清扫结束后清空全部缓存层。
    pub fn destroy_all(&self) -> ContainerResult<()> {
        let records: Vec<DisposalRecord> = {
            let mut disposals = self.disposals.lock();
            disposals.drain(..).collect()
        };

        let mut failures = Vec::new();
        for mut record in records.into_iter().rev() {
            debug!("销毁组件: {}", record.name);
            for action in record.actions.drain(..) {
                if let Err(source) = action() {
                    warn!("组件 {} 的销毁动作失败: {}", record.name, source);
                    failures.push(DisposalFailure {
                        name: record.name.clone(),
                        source,
                    });
                }
            }
        }

        self.finished.clear();
        self.pending.clear();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::DisposalAggregate { failures })
        }
    }
}
