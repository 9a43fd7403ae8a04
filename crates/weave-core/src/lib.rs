//! weave-core：基于标记的方法拦截与代理外观。
//!
//! # 教案式概览
//! - **意图（Why）**：让日志、审计、计量等横切行为以“标记 + 注册”的方式附着到接口调用上，
//!   业务实现与调用方都无需改动；
//! - **结构（How）**：
//!   - [`marker`] / [`descriptor`]：标记身份与接口、方法、参数描述符；
//!   - [`registry`]：标记 → 有序拦截器列表，注册即使调用链缓存失效；
//!   - [`resolver`] / [`chain`]：按“类型 → 方法 → 参数”收集标记，组合为单个 [`Invocation`]；
//!   - [`cache`]：按方法缓存组合结果；
//!   - [`proxy`]：[`Weaver`] 创建代理，[`interface!`] 为具体 trait 生成强类型代理；
//!   - [`invoker`]：调用链最内层，对委托发起真实调用；
//! - **契约（What）**：所有调用在调用方线程上同步完成；委托失败原样传播；身份敏感操作返回
//!   [`InterceptError::Unsupported`]。

pub mod cache;
pub mod chain;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod interceptor;
pub mod invoker;
pub mod marker;
pub mod proxy;
pub mod registry;
pub mod resolver;
pub mod value;

pub use cache::ChainCache;
pub use chain::{Invocation, compile};
pub use config::ProxyConfig;
pub use descriptor::{
    DeclaringType, IdentityOp, InterfaceBuilder, InterfaceDescriptor, InterfaceId,
    MethodDescriptor, MethodKey, MethodSignature, ParameterDescriptor,
};
pub use error::{BoxError, InterceptError, Result};
pub use interceptor::{
    Advice, AdviceInterceptor, FnAdvice, FnInterceptor, Interceptor, Outcome, advice_fn,
    interceptor_fn,
};
pub use invoker::{CallResult, Target, invoke};
pub use marker::{Marker, MarkerId};
pub use proxy::{Interface, Proxy, Weaver};
pub use registry::MarkerRegistry;
pub use resolver::{collect_markers, resolve_interceptors};
pub use value::{ArgumentReader, Arguments, Payload, Value, return_value};
