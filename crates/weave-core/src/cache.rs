//! # ChainCache：按方法缓存组合后的调用链
//!
//! ## 核心意图（Why）
//! - 同一方法的重复调用跳过解析与组合，命中后直接执行已缓存的 [`Invocation`]；
//! - 以 `DashMap` 提供分片并发存储，多线程首调可以同时进行。
//!
//! ## 行为契约（What）
//! - 键为 [`MethodKey`]（已构建描述符的身份 + 方法名），每个注册表独占一份缓存；
//! - `get_or_compile`：命中且修订号一致时直接返回；否则在分片锁之外组合并写回；
//! - `invalidate_all`：整表清空，由注册表在每次注册后同步调用，不支持单条失效；
//! - 每个条目记录组合时所依据的注册表修订号，修订号落后的条目视为未命中，
//!   从而覆盖“组合进行中恰好发生注册”的竞态。
//!
//! ## 风险提示（Trade-offs）
//! - 并发首调可能重复组合同一方法；组合是纯函数，结果等价，后写者覆盖先写者即可。

use dashmap::DashMap;

use crate::{chain::Invocation, descriptor::MethodKey};

#[derive(Clone)]
struct CachedChain {
    revision: u64,
    invocation: Invocation,
}

/// 方法级调用链缓存。
#[derive(Default)]
pub struct ChainCache {
    entries: DashMap<MethodKey, CachedChain>,
}

impl ChainCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取或组合调用链。
    ///
    /// - `revision`：调用方读取到的注册表修订号，应在解析之前读取；
    /// - `compile`：未命中时执行的解析 + 组合过程，不持有任何分片锁。
    pub fn get_or_compile<F>(&self, key: &MethodKey, revision: u64, compile: F) -> Invocation
    where
        F: FnOnce() -> Invocation,
    {
        if let Some(cached) = self.entries.get(key)
            && cached.revision == revision
        {
            return cached.invocation.clone();
        }

        let invocation = compile();
        tracing::debug!(
            target: "weave::cache",
            method = key.method(),
            revision,
            depth = invocation.depth(),
            "compiled interceptor chain"
        );
        self.entries.insert(
            key.clone(),
            CachedChain {
                revision,
                invocation: invocation.clone(),
            },
        );
        invocation
    }

    /// 清空全部条目。
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
