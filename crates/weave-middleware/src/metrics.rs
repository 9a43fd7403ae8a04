use std::{
    borrow::Cow,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use weave_core::{Arguments, CallResult, Interceptor, Invocation, MethodDescriptor, Target};

/// 指标拦截器配置。
///
/// # 教案式说明
/// - **意图（Why）**：允许同一进程内多个实例按 `label` 区分，并按需关闭计时；
/// - **契约（What）**：
///   - `label`：出现在调试日志中的实例名；
///   - `record_latency`：是否累计耗时，关闭后 `total_latency` 恒为零。
#[derive(Clone, Debug)]
pub struct MetricsInterceptorConfig {
    pub label: Cow<'static, str>,
    pub record_latency: bool,
}

impl Default for MetricsInterceptorConfig {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("metrics"),
            record_latency: true,
        }
    }
}

#[derive(Default)]
struct MethodStats {
    calls: AtomicU64,
    failures: AtomicU64,
    latency_nanos: AtomicU64,
}

/// 单个方法的指标快照。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSnapshot {
    /// `接口::方法`。
    pub method: String,
    pub calls: u64,
    pub failures: u64,
    pub total_latency: Duration,
}

/// 按方法聚合调用次数、失败次数与累计耗时的拦截器。
///
/// # 教案式说明
/// - **意图（Why）**：在不侵入业务代码的情况下获得方法级调用画像；
/// - **结构（How）**：计数器存放于 `DashMap<String, MethodStats>`，各字段为原子量；
///   `Clone` 共享同一份计数器，注册后仍可通过保留的句柄读取快照；
/// - **契约（What）**：
///   - 不改变参数与结果，失败原样返回；
///   - 计数在调用返回后更新，快照按方法名排序。
/// - **风险提示（Trade-offs）**：键为方法全名，基数等于被标记方法的数量。
#[derive(Clone, Default)]
pub struct MetricsInterceptor {
    config: MetricsInterceptorConfig,
    stats: Arc<DashMap<String, MethodStats>>,
}

impl MetricsInterceptor {
    pub fn new(config: MetricsInterceptorConfig) -> Self {
        Self {
            config,
            stats: Arc::default(),
        }
    }

    /// 当前全部方法的快照。
    pub fn snapshot(&self) -> Vec<MethodSnapshot> {
        let mut snapshot: Vec<MethodSnapshot> = self
            .stats
            .iter()
            .map(|entry| MethodSnapshot {
                method: entry.key().clone(),
                calls: entry.calls.load(Ordering::Relaxed),
                failures: entry.failures.load(Ordering::Relaxed),
                total_latency: Duration::from_nanos(entry.latency_nanos.load(Ordering::Relaxed)),
            })
            .collect();
        snapshot.sort_by(|left, right| left.method.cmp(&right.method));
        snapshot
    }

    /// 单个方法的快照；从未被调用时返回 `None`。
    pub fn method(&self, qualified_name: &str) -> Option<MethodSnapshot> {
        self.snapshot()
            .into_iter()
            .find(|snapshot| snapshot.method == qualified_name)
    }

    fn record(&self, method: &MethodDescriptor, failed: bool, elapsed: Option<Duration>) {
        let name = method.qualified_name();
        let stats = self.stats.entry(name).or_default();
        stats.calls.fetch_add(1, Ordering::Relaxed);
        if failed {
            stats.failures.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(elapsed) = elapsed {
            let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
            stats.latency_nanos.fetch_add(nanos, Ordering::Relaxed);
        }
    }
}

impl Interceptor for MetricsInterceptor {
    fn intercept(
        &self,
        target: &dyn Target,
        method: &MethodDescriptor,
        args: Arguments,
        next: &Invocation,
    ) -> CallResult {
        let started = self.config.record_latency.then(Instant::now);
        let result = next.proceed(target, method, args);
        self.record(method, result.is_err(), started.map(|at| at.elapsed()));
        if result.is_err() {
            tracing::debug!(
                target: "weave::metrics",
                label = self.config.label.as_ref(),
                method = %method.qualified_name(),
                "recorded failed call"
            );
        }
        result
    }
}
