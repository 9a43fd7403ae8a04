//! 代理行为配置。
//!
//! # 教案式说明
//! - **意图 (Why)**：为调用链缓存与调用级追踪提供装配期开关，默认值即生产推荐值；
//! - **契约 (What)**：
//!   - `cache_chains`：默认开启，每个方法只组合一次调用链；关闭后每次调用重新解析，
//!     便于调试注册顺序，语义不变；
//!   - `trace_calls`：默认关闭，开启后每次代理调用进入一个 `weave.call` 调试 span；
//!   - 可由 serde 反序列化，缺失字段取默认值；启用 `toml` 特性后可直接解析 TOML 文本。

use serde::Deserialize;

#[cfg(feature = "toml")]
use crate::error::{InterceptError, Result};

/// [`Weaver`](crate::Weaver) 创建的代理所共享的配置。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// 是否缓存组合后的调用链。
    pub cache_chains: bool,
    /// 是否为每次代理调用创建追踪 span。
    pub trace_calls: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            cache_chains: true,
            trace_calls: false,
        }
    }
}

impl ProxyConfig {
    /// 从 TOML 文本解析配置，解析失败返回 `InvalidArgument`。
    #[cfg(feature = "toml")]
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| {
            InterceptError::invalid_argument(format!("invalid proxy configuration: {err}"))
        })
    }
}
