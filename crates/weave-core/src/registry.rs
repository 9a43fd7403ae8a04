//! Marker Registry：标记 → 有序拦截器列表。
//!
//! # 教案式说明
//! - **意图 (Why)**：注册发生在装配期且频率极低，调用期却需要高频读取；因此读取走
//!   `ArcSwap` 快照（零锁），写入以互斥锁串行化并整表替换，与路由表热更新同构；
//! - **结构 (How)**：
//!   1. `table` 持有 [`MarkerTable`] 快照，记录标记的首次注册顺序与各自的拦截器列表；
//!   2. `revision` 在每次注册后递增，供 [`ChainCache`] 判定条目是否过期；
//!   3. 每次注册成功后同步清空已接线的 `ChainCache`，既有代理在下一次调用时即可看到新注册；
//! - **契约 (What)**：
//!   - 只增不删：同一标记可多次注册，全部按注册顺序保留；
//!   - 查找从不失败，未注册的标记返回空列表；
//!   - 非法标记（空名的命名标记）在任何状态变更前以 `InvalidArgument` 拒绝。

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::{
    cache::ChainCache,
    error::{InterceptError, Result},
    interceptor::{Advice, AdviceInterceptor, Interceptor},
    marker::{Marker, MarkerId},
};

/// 注册表快照。
#[derive(Clone, Default)]
struct MarkerTable {
    order: Vec<MarkerId>,
    entries: HashMap<MarkerId, Vec<Arc<dyn Interceptor>>>,
    total: usize,
}

/// 标记注册表。
///
/// 以 `Arc<MarkerRegistry>` 的形式显式交给 [`Weaver`](crate::Weaver)，不存在全局单例。
pub struct MarkerRegistry {
    table: ArcSwap<MarkerTable>,
    writer: Mutex<()>,
    revision: AtomicU64,
    cache: Arc<ChainCache>,
}

impl MarkerRegistry {
    /// 创建空注册表，并接线一个独占的调用链缓存。
    ///
    /// 缓存不与其他注册表共享：条目上的修订号只对本注册表有意义。
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(MarkerTable::default()),
            writer: Mutex::new(()),
            revision: AtomicU64::new(0),
            cache: Arc::new(ChainCache::new()),
        }
    }

    /// 在 `marker` 下追加拦截器。
    pub fn register(&self, marker: MarkerId, interceptor: Arc<dyn Interceptor>) -> Result<()> {
        if !marker.is_valid() {
            return Err(InterceptError::invalid_argument(
                "cannot register an interceptor under a marker with an empty name",
            ));
        }

        let revision = {
            let _guard = self.writer.lock();
            let mut next = MarkerTable::clone(&self.table.load());
            let list = next.entries.entry(marker.clone()).or_default();
            if list.is_empty() {
                next.order.push(marker.clone());
            }
            list.push(interceptor);
            next.total += 1;
            // 先发布新表再递增修订号：读到新修订号的调用方必然能读到新表。
            self.table.store(Arc::new(next));
            self.revision.fetch_add(1, Ordering::AcqRel) + 1
        };

        self.cache.invalidate_all();
        tracing::debug!(
            target: "weave::registry",
            marker = %marker,
            revision,
            "registered interceptor"
        );
        Ok(())
    }

    /// 在标记类型 `M` 下追加拦截器。
    pub fn register_for<M: Marker>(&self, interceptor: impl Interceptor) -> Result<()> {
        self.register(M::id(), Arc::new(interceptor))
    }

    /// 将 Advice 适配为拦截器后注册。
    pub fn register_advice(&self, marker: MarkerId, advice: impl Advice) -> Result<()> {
        self.register(marker, Arc::new(AdviceInterceptor::new(advice)))
    }

    /// 在标记类型 `M` 下注册 Advice。
    pub fn register_advice_for<M: Marker>(&self, advice: impl Advice) -> Result<()> {
        self.register_advice(M::id(), advice)
    }

    /// 返回 `marker` 下按注册顺序排列的拦截器；未注册时为空。
    pub fn lookup(&self, marker: &MarkerId) -> Vec<Arc<dyn Interceptor>> {
        self.table
            .load()
            .entries
            .get(marker)
            .cloned()
            .unwrap_or_default()
    }

    /// 已注册的标记，按首次注册顺序排列。
    pub fn markers(&self) -> Vec<MarkerId> {
        self.table.load().order.clone()
    }

    /// 当前修订号，每次注册递增。
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// 本注册表独占的调用链缓存。
    pub fn cache(&self) -> &Arc<ChainCache> {
        &self.cache
    }

    /// 注册总数（跨全部标记）。
    pub fn len(&self) -> usize {
        self.table.load().total
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
