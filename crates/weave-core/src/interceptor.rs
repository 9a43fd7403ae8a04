//! 拦截器与 Advice 契约。
//!
//! # 教案式说明
//! - **意图 (Why)**：[`Interceptor`] 是可感知调用链的完整形态，可以观察、改写参数、替换结果
//!   或直接短路调用；[`Advice`] 是受限形态，只能在调用前后观察，不能跳过或替换调用；
//! - **结构 (How)**：注册 Advice 时由 [`AdviceInterceptor`] 适配为拦截器：
//!   `before` → `next` → `after`，失败路径上 `after` 同样执行；
//! - **契约 (What)**：
//!   - `before` 失败时不会调用 `next`，也不会调用 `after`；
//!   - 被委托调用失败时 `after` 仍然执行，但无法吞没该失败；
//!   - 两者同时失败时返回 [`InterceptError::AfterAdvice`]，原始失败不会丢失。

use std::fmt;

use crate::{
    chain::Invocation,
    descriptor::MethodDescriptor,
    error::{InterceptError, Result},
    invoker::{CallResult, Target},
    value::{Arguments, Value},
};

/// 可感知调用链的拦截器。
///
/// 同一拦截器实例可被多条调用链与多个线程共享，因此必须是 `Send + Sync` 且不可变。
pub trait Interceptor: Send + Sync + 'static {
    /// 处理一次调用；`next` 代表链路剩余部分。
    fn intercept(
        &self,
        target: &dyn Target,
        method: &MethodDescriptor,
        args: Arguments,
        next: &Invocation,
    ) -> CallResult;
}

/// 仅能在调用前后观察的受限拦截器。
pub trait Advice: Send + Sync + 'static {
    /// 调用前执行；返回错误将阻止调用。
    fn before(&self, target: &dyn Target, method: &MethodDescriptor, args: &Arguments) -> Result<()> {
        let _ = (target, method, args);
        Ok(())
    }

    /// 调用后执行，无论成功还是失败。
    fn after(
        &self,
        target: &dyn Target,
        method: &MethodDescriptor,
        args: &Arguments,
        outcome: Outcome<'_>,
    ) -> Result<()> {
        let _ = (target, method, args, outcome);
        Ok(())
    }
}

/// 将 [`Advice`] 适配为 [`Interceptor`]。
pub struct AdviceInterceptor<A> {
    advice: A,
}

impl<A: Advice> AdviceInterceptor<A> {
    pub fn new(advice: A) -> Self {
        Self { advice }
    }

    pub fn advice(&self) -> &A {
        &self.advice
    }
}

impl<A: Advice> Interceptor for AdviceInterceptor<A> {
    fn intercept(
        &self,
        target: &dyn Target,
        method: &MethodDescriptor,
        args: Arguments,
        next: &Invocation,
    ) -> CallResult {
        self.advice.before(target, method, &args)?;
        let outcome = next.proceed(target, method, args.clone());
        let after = self.advice.after(target, method, &args, outcome.as_ref());
        match (outcome, after) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(after)) => Err(after),
            (Err(primary), Ok(())) => Err(primary),
            (Err(primary), Err(after)) => Err(InterceptError::AfterAdvice {
                primary: Box::new(primary),
                after: Box::new(after),
            }),
        }
    }
}

impl<A> fmt::Debug for AdviceInterceptor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceInterceptor")
            .field("advice", &std::any::type_name::<A>())
            .finish()
    }
}

/// 由闭包实现的拦截器，见 [`interceptor_fn`]。
pub struct FnInterceptor<F> {
    f: F,
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&dyn Target, &MethodDescriptor, Arguments, &Invocation) -> CallResult
        + Send
        + Sync
        + 'static,
{
    fn intercept(
        &self,
        target: &dyn Target,
        method: &MethodDescriptor,
        args: Arguments,
        next: &Invocation,
    ) -> CallResult {
        (self.f)(target, method, args, next)
    }
}

/// 以闭包构造拦截器。
///
/// ```
/// use weave_core::interceptor_fn;
///
/// let passthrough = interceptor_fn(|target, method, args, next| next.proceed(target, method, args));
/// # let _ = passthrough;
/// ```
pub fn interceptor_fn<F>(f: F) -> FnInterceptor<F>
where
    F: Fn(&dyn Target, &MethodDescriptor, Arguments, &Invocation) -> CallResult
        + Send
        + Sync
        + 'static,
{
    FnInterceptor { f }
}

/// 调用后阶段看到的结果。
pub type Outcome<'a> = core::result::Result<&'a Value, &'a InterceptError>;

/// 由一对闭包实现的 Advice，见 [`advice_fn`]。
pub struct FnAdvice<B, A> {
    before: B,
    after: A,
}

impl<B, A> Advice for FnAdvice<B, A>
where
    B: Fn(&MethodDescriptor, &Arguments) -> Result<()> + Send + Sync + 'static,
    A: Fn(&MethodDescriptor, &Arguments, Outcome<'_>) -> Result<()> + Send + Sync + 'static,
{
    fn before(&self, _target: &dyn Target, method: &MethodDescriptor, args: &Arguments) -> Result<()> {
        (self.before)(method, args)
    }

    fn after(
        &self,
        _target: &dyn Target,
        method: &MethodDescriptor,
        args: &Arguments,
        outcome: Outcome<'_>,
    ) -> Result<()> {
        (self.after)(method, args, outcome)
    }
}

/// 以前置、后置两个闭包构造 Advice。
pub fn advice_fn<B, A>(before: B, after: A) -> FnAdvice<B, A>
where
    B: Fn(&MethodDescriptor, &Arguments) -> Result<()> + Send + Sync + 'static,
    A: Fn(&MethodDescriptor, &Arguments, Outcome<'_>) -> Result<()> + Send + Sync + 'static,
{
    FnAdvice { before, after }
}
