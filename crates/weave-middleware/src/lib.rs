//! weave-middleware：可直接注册到标记上的通用拦截器。
//!
//! # 教案式概览
//! - **意图（Why）**：为常见横切关注点提供现成实现，业务只需选择标记并注册；
//! - **结构（How）**：[`logging`] 提供基于 `tracing` 的 [`LoggingAdvice`]，[`metrics`] 提供按方法
//!   聚合的 [`MetricsInterceptor`]，二者都遵循 `weave_core` 的 [`Advice`](weave_core::Advice) /
//!   [`Interceptor`](weave_core::Interceptor) 契约；
//! - **契约（What）**：组件本身不改变参数与返回值，失败原样向外传播。

pub mod logging;
pub mod metrics;

pub use logging::{LoggingAdvice, LoggingAdviceConfig};
pub use metrics::{MethodSnapshot, MetricsInterceptor, MetricsInterceptorConfig};
