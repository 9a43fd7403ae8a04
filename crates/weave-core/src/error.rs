//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为拦截管线对外暴露的错误语义提供集中定义：参数非法、身份类调用不受支持、委托/拦截器失败；
//! - 保证委托抛出的失败“原样”穿过整条调用链，调用方可以取回具体错误类型。
//!
//! ## 设计要求（What）
//! - 所有变体均 `Send + Sync + 'static`，可跨线程传播；
//! - 使用 `thiserror::Error` 派生，`Failure` 变体采用 `transparent`，不改变委托错误的 `Display` 与 `source`；
//! - Advice 的 `after` 阶段与被委托调用同时失败时，两者都必须保留（见 [`InterceptError::AfterAdvice`]）。

use std::{borrow::Cow, error::Error as StdError};

use thiserror::Error;

/// 装箱后的任意失败，作为委托或拦截器失败的统一载体。
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// 拦截管线的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：聚合注册期、代理创建期与调用期的全部失败路径，调用方只需面对一种错误类型；
/// - **契约 (What)**：
///   - `InvalidArgument`：注册或创建代理时输入非法，在任何状态变更之前同步返回；
///   - `Unsupported`：身份敏感操作（相等、哈希、字符串化）到达代理分发；
///   - `Failure`：委托或拦截器自身的失败，原样传播，不包装、不吞没；
///   - `AfterAdvice`：被委托调用失败后 Advice 的 `after` 也失败，两者同时保留；
///   - `TypeMismatch` / `UnknownMethod`：动态调用面上的形状错误。
/// - **风险 (Trade-offs)**：`Failure` 以 `Box<dyn Error>` 承载，调用方需要通过
///   [`InterceptError::downcast_failure`] 取回具体类型。
#[derive(Debug, Error)]
pub enum InterceptError {
    /// 注册或代理创建输入非法。
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: Cow<'static, str> },

    /// 身份敏感操作不可经由代理执行。
    #[error("operation `{operation}` is not supported on an interception proxy")]
    Unsupported { operation: Cow<'static, str> },

    /// 委托或拦截器抛出的失败。
    #[error(transparent)]
    Failure(BoxError),

    /// 被委托调用失败，且 Advice 的 `after` 阶段也失败。
    ///
    /// - `primary`：被委托调用（或更内层链路）产生的原始失败；
    /// - `after`：`after` 阶段自身的失败。
    #[error("{primary} (after advice also failed: {after})")]
    AfterAdvice {
        #[source]
        primary: Box<InterceptError>,
        after: Box<InterceptError>,
    },

    /// 参数或返回值的动态类型与声明不符。
    #[error("type mismatch in `{method}` at {position}: expected `{expected}`")]
    TypeMismatch {
        method: Cow<'static, str>,
        position: Cow<'static, str>,
        expected: &'static str,
    },

    /// 通过接口未声明的方法名发起调用。
    #[error("interface `{interface}` declares no method `{method}`")]
    UnknownMethod {
        interface: Cow<'static, str>,
        method: Cow<'static, str>,
    },
}

impl InterceptError {
    /// 构造参数非法错误。
    pub fn invalid_argument(reason: impl Into<Cow<'static, str>>) -> Self {
        InterceptError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// 构造身份操作不受支持错误。
    pub fn unsupported(operation: impl Into<Cow<'static, str>>) -> Self {
        InterceptError::Unsupported {
            operation: operation.into(),
        }
    }

    /// 将任意失败装箱为 `Failure`。
    ///
    /// 委托实现通常以 `Err(InterceptError::failure(MyError::..))` 返回业务失败。
    pub fn failure<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        InterceptError::Failure(Box::new(error))
    }

    /// 以纯文本消息构造 `Failure`，用于拦截器内的临时失败。
    pub fn message(message: impl Into<String>) -> Self {
        let message: String = message.into();
        InterceptError::Failure(message.into())
    }

    /// 若为 `Failure`，尝试取回具体错误类型。
    ///
    /// `AfterAdvice` 会沿 `primary` 继续查找，保证原始委托失败总能被取回。
    pub fn downcast_failure<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            InterceptError::Failure(inner) => inner.downcast_ref::<E>(),
            InterceptError::AfterAdvice { primary, .. } => primary.downcast_failure::<E>(),
            _ => None,
        }
    }

    /// 是否为 `Unsupported`。
    pub fn is_unsupported(&self) -> bool {
        matches!(self, InterceptError::Unsupported { .. })
    }

    /// 是否为 `InvalidArgument`。
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, InterceptError::InvalidArgument { .. })
    }
}

/// 框架统一的结果别名。
pub type Result<T, E = InterceptError> = core::result::Result<T, E>;
