//! 拦截管线端到端测试。
//!
//! # 教案式说明
//! - **意图 (Why)**：从代理入口验证标记解析、调用链组合、缓存失效与失败传播的整体契约；
//! - **结构 (How)**：共享夹具位于 [`support`]，其余子模块各自覆盖一类行为；
//! - **契约 (What)**：每个测试自建注册表与代理，互不共享状态，可并行执行。

mod support;

mod cache;
mod failures;
mod observability;
