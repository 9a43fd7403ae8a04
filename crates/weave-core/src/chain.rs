//! Chain Compiler：将有序拦截器列表组合为单个 [`Invocation`]。
//!
//! # 教案式说明
//! - **意图 (Why)**：调用期不再遍历拦截器列表，而是执行一次预先组合好的闭包链；组合结果可缓存、
//!   可跨线程复用；
//! - **结构 (How)**：以“直接调用 Invoker”为底座，自后向前遍历拦截器，每一步把当前 Invocation
//!   作为该拦截器的 `next` 包裹成新的 Invocation；
//! - **契约 (What)**：列表中第一个拦截器位于最外层，其前置逻辑最先执行、后置逻辑最后执行，
//!   与常见中间件嵌套语义一致；组合过程无副作用。

use std::{fmt, sync::Arc};

use crate::{
    descriptor::MethodDescriptor,
    interceptor::Interceptor,
    invoker::{self, CallResult, Target},
    value::Arguments,
};

type InvocationFn = dyn Fn(&dyn Target, &MethodDescriptor, Arguments) -> CallResult + Send + Sync;

/// 组合后的调用链。
#[derive(Clone)]
pub struct Invocation {
    call: Arc<InvocationFn>,
    depth: usize,
}

impl Invocation {
    /// 不含拦截器的链路：直接调用 Invoker。
    pub fn direct() -> Self {
        Self {
            call: erase(invoker::invoke),
            depth: 0,
        }
    }

    /// 以 `interceptor` 包裹 `next`。
    pub fn wrap(interceptor: Arc<dyn Interceptor>, next: Invocation) -> Self {
        let depth = next.depth + 1;
        Self {
            call: erase(move |target, method, args| {
                interceptor.intercept(target, method, args, &next)
            }),
            depth,
        }
    }

    /// 执行链路。
    pub fn proceed(&self, target: &dyn Target, method: &MethodDescriptor, args: Arguments) -> CallResult {
        (self.call)(target, method, args)
    }

    /// 链路中拦截器的数量。
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation").field("depth", &self.depth).finish()
    }
}

fn erase<F>(f: F) -> Arc<InvocationFn>
where
    F: Fn(&dyn Target, &MethodDescriptor, Arguments) -> CallResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 组合有序拦截器列表。
pub fn compile(interceptors: &[Arc<dyn Interceptor>]) -> Invocation {
    interceptors
        .iter()
        .rev()
        .fold(Invocation::direct(), |next, interceptor| {
            Invocation::wrap(Arc::clone(interceptor), next)
        })
}
