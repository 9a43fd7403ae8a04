//! weave-demo：以仓库接口演示标记、Advice 与拦截器的组合效果。
//!
//! # 教案式说明
//! - **意图（Why）**：给出一个可运行的最小装配：类型级审计、方法级日志、类型级计量与参数级改写；
//! - **流程（How）**：
//!   1. 安装 `tracing-subscriber`（`RUST_LOG` 未设置时回退到 `info`）；
//!   2. 可选地从第一个命令行参数指向的 TOML 文件加载 [`ProxyConfig`]；
//!   3. 注册拦截器、创建代理并发起若干调用，最后打印指标快照；
//! - **契约（What）**：任何装配或调用失败都以非零退出码结束，并附带上下文说明。

use std::{
    collections::HashMap,
    env, fs,
    sync::{Arc, Mutex},
};

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use weave_core::{
    Advice, Arguments, InterceptError, MarkerRegistry, MethodDescriptor, ProxyConfig, Result,
    Target, Weaver, declare_markers, interceptor_fn, interface,
};
use weave_middleware::{LoggingAdvice, LoggingAdviceConfig, MetricsInterceptor};

declare_markers!(
    /// 需要审计的类型。
    Secured,
    /// 需要记录调用日志的方法。
    Traced,
    /// 含敏感数据的参数。
    Sensitive,
);

interface! {
    /// 用户仓库。
    trait Repository => RepositoryProxy [Secured] {
        fn get(&self, id: u64) -> Option<String> [Traced];
        fn save(&self, id: u64, password: String [Sensitive]) -> ();
    }
}

#[derive(Debug, thiserror::Error)]
#[error("user {0} already exists")]
struct Duplicate(u64);

#[derive(Default)]
struct InMemoryRepository {
    users: Mutex<HashMap<u64, String>>,
}

impl Repository for InMemoryRepository {
    fn get(&self, id: u64) -> Result<Option<String>> {
        let users = self
            .users
            .lock()
            .map_err(|_| InterceptError::message("user table poisoned"))?;
        Ok(users.get(&id).cloned())
    }

    fn save(&self, id: u64, password: String) -> Result<()> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| InterceptError::message("user table poisoned"))?;
        if users.contains_key(&id) {
            return Err(InterceptError::failure(Duplicate(id)));
        }
        users.insert(id, password);
        Ok(())
    }
}

/// 在调用前输出审计记录。
struct Audit;

impl Advice for Audit {
    fn before(&self, target: &dyn Target, method: &MethodDescriptor, _: &Arguments) -> Result<()> {
        tracing::info!(delegate = target.type_name(), method = method.name(), "audit: enter");
        Ok(())
    }
}

fn install_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("安装 tracing subscriber 失败")
}

fn load_config() -> anyhow::Result<ProxyConfig> {
    let Some(path) = env::args().nth(1) else {
        return Ok(ProxyConfig::default());
    };
    let raw = fs::read_to_string(&path).with_context(|| format!("读取配置文件 {path} 失败"))?;
    ProxyConfig::from_toml_str(&raw).with_context(|| format!("解析配置文件 {path} 失败"))
}

fn main() -> anyhow::Result<()> {
    install_tracing()?;
    let config = load_config()?;

    let registry = Arc::new(MarkerRegistry::new());
    let metrics = MetricsInterceptor::default();
    registry.register_advice_for::<Secured>(Audit)?;
    registry.register_advice_for::<Traced>(LoggingAdvice::new(LoggingAdviceConfig {
        label: "repository".into(),
        ..LoggingAdviceConfig::default()
    }))?;
    registry.register_for::<Secured>(metrics.clone())?;
    // 敏感参数在进入委托前去除首尾空白。
    registry.register_for::<Sensitive>(interceptor_fn(|target, method, mut args, next| {
        let trimmed = args.get::<String>(method, 1)?.trim().to_owned();
        args.replace(1, trimmed)?;
        next.proceed(target, method, args)
    }))?;

    let weaver = Weaver::with_config(Arc::clone(&registry), config);
    let repository = weaver
        .create_proxy::<dyn Repository>(Arc::new(InMemoryRepository::default()))
        .context("创建 Repository 代理失败")?;

    repository.save(1, "  hunter2 ".to_owned())?;
    let user = repository.get(1)?;
    tracing::info!(?user, "loaded user");

    if let Err(err) = repository.save(1, "again".to_owned()) {
        let duplicate = err.downcast_failure::<Duplicate>().is_some();
        tracing::warn!(%err, duplicate, "save rejected");
    }

    match repository.as_proxy().equals(repository.as_proxy()) {
        Err(err) if err.is_unsupported() => tracing::info!(%err, "identity stays with the caller"),
        other => anyhow::bail!("unexpected identity result: {other:?}"),
    }

    for entry in metrics.snapshot() {
        tracing::info!(
            method = %entry.method,
            calls = entry.calls,
            failures = entry.failures,
            latency = ?entry.total_latency,
            "metrics"
        );
    }
    Ok(())
}
