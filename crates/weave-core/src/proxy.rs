//! Proxy Façade：以接口形状包裹委托，把每次调用引导进组合后的拦截链。
//!
//! # 教案式说明
//! - **意图 (Why)**：调用方面对的仍是原接口，拦截行为由标记与注册表决定，业务代码无需感知；
//! - **结构 (How)**：
//!   1. [`Weaver`] 显式持有 `Arc<MarkerRegistry>` 与 [`ProxyConfig`]，负责校验接口描述并创建代理；
//!      经由 [`Interface`] 创建的代理复用同一份已构建描述符，因而共享调用链缓存条目；
//!   2. [`Proxy`] 是类型擦除的代理核心：按方法名取描述符 → 向 [`ChainCache`](crate::ChainCache)
//!      取调用链（未命中时解析并组合）→ 以 `(委托, 描述符, 参数)` 执行；
//!   3. [`interface!`](crate::interface) 为具体 trait 生成强类型代理、委托分发与 [`Interface`] 实现；
//! - **契约 (What)**：
//!   - 身份敏感操作（相等、哈希、字符串化）一律返回 `Unsupported`，不会转发给委托；
//!   - 手写描述每次 `create_dyn_proxy` 都产生新身份，不同描述之间绝不共享调用链；
//!   - `Proxy` 不实现 `PartialEq`、`Hash`、`Display` 与 `Debug`；
//!   - 委托的失败原样返回。

use std::{
    any::{Any, TypeId, type_name},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    chain::{Invocation, compile},
    config::ProxyConfig,
    descriptor::{IdentityOp, InterfaceBuilder, InterfaceDescriptor, MethodDescriptor},
    error::{InterceptError, Result},
    invoker::{CallResult, Target},
    registry::MarkerRegistry,
    resolver::resolve_interceptors,
    value::{Arguments, return_value},
};

/// 可被代理的接口。
///
/// 通常由 [`interface!`](crate::interface) 为 `dyn Trait` 生成实现。`describe` 须是确定的：
/// 同一个 [`Weaver`] 只构建一次描述符，之后该接口的全部代理都复用它。
pub trait Interface: Send + Sync + 'static {
    /// 实现该接口的强类型代理。
    type Proxy;

    /// 描述接口、方法、参数及其上的标记。
    fn describe() -> InterfaceBuilder;

    /// 将类型擦除的调用翻译为委托上的真实方法调用。
    fn dispatch(delegate: &Self, method: &MethodDescriptor, args: Arguments) -> CallResult;

    /// 以代理核心构造强类型代理。
    fn wrap(proxy: Proxy) -> Self::Proxy;
}

/// 以 [`Interface::dispatch`] 实现 [`Target`] 的委托包装。
struct Delegate<I: ?Sized>(Arc<I>);

impl<I: Interface + ?Sized> Target for Delegate<I> {
    fn type_name(&self) -> &'static str {
        type_name::<I>()
    }

    fn invoke(&self, method: &MethodDescriptor, args: Arguments) -> CallResult {
        I::dispatch(&self.0, method, args)
    }
}

/// 代理工厂。
///
/// 克隆体共享已构建的接口描述符。
#[derive(Clone)]
pub struct Weaver {
    registry: Arc<MarkerRegistry>,
    config: ProxyConfig,
    interfaces: Arc<DashMap<TypeId, Arc<InterfaceDescriptor>>>,
}

impl Weaver {
    /// 以默认配置创建。
    pub fn new(registry: Arc<MarkerRegistry>) -> Self {
        Self::with_config(registry, ProxyConfig::default())
    }

    pub fn with_config(registry: Arc<MarkerRegistry>, config: ProxyConfig) -> Self {
        Self {
            registry,
            config,
            interfaces: Arc::default(),
        }
    }

    pub fn registry(&self) -> &Arc<MarkerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> ProxyConfig {
        self.config
    }

    /// 为实现了 `I` 的委托创建强类型代理。
    ///
    /// # 契约（What）
    /// - 接口描述非法（空接口名、空或重复方法名、空名标记）时返回 `InvalidArgument`，
    ///   不创建任何代理；
    /// - 创建代理不会解析或组合调用链，首次调用各方法时才会发生。
    pub fn create_proxy<I>(&self, delegate: Arc<I>) -> Result<I::Proxy>
    where
        I: Interface + ?Sized,
    {
        let interface = self.interface::<I>()?;
        let proxy = self.proxy(interface, Arc::new(Delegate(delegate)));
        Ok(I::wrap(proxy))
    }

    /// 以手写的接口描述与 [`Target`] 创建类型擦除代理。
    ///
    /// 每次调用都会构建新的描述符；即使两份描述针对同一 Rust 类型，它们的调用链也各自解析。
    pub fn create_dyn_proxy(
        &self,
        interface: InterfaceBuilder,
        target: Arc<dyn Target>,
    ) -> Result<Proxy> {
        let interface = Arc::new(interface.build()?);
        Ok(self.proxy(interface, target))
    }

    fn interface<I>(&self) -> Result<Arc<InterfaceDescriptor>>
    where
        I: Interface + ?Sized,
    {
        if let Some(built) = self.interfaces.get(&TypeId::of::<I>()) {
            return Ok(Arc::clone(built.value()));
        }
        let built = Arc::new(I::describe().build()?);
        // 并发首建时以先写入者为准，保证同一接口只有一个身份。
        let entry = self.interfaces.entry(TypeId::of::<I>()).or_insert(built);
        Ok(Arc::clone(entry.value()))
    }

    fn proxy(&self, interface: Arc<InterfaceDescriptor>, target: Arc<dyn Target>) -> Proxy {
        tracing::debug!(
            target: "weave::proxy",
            interface = interface.name(),
            delegate = target.type_name(),
            methods = interface.methods().count(),
            "created interception proxy"
        );
        Proxy {
            interface,
            target,
            registry: Arc::clone(&self.registry),
            config: self.config,
        }
    }
}

/// 类型擦除的代理核心。
#[derive(Clone)]
pub struct Proxy {
    interface: Arc<InterfaceDescriptor>,
    target: Arc<dyn Target>,
    registry: Arc<MarkerRegistry>,
    config: ProxyConfig,
}

impl Proxy {
    /// 按方法名发起调用。
    pub fn call(&self, method: &str, args: Arguments) -> CallResult {
        let descriptor = self.method(method)?;
        self.run(descriptor, args)
    }

    /// 发起调用并将返回值还原为 `R`。
    pub fn call_as<R>(&self, method: &str, args: Arguments) -> Result<R>
    where
        R: Any + Send + Sync + Clone,
    {
        let descriptor = self.method(method)?;
        let value = self.run(descriptor, args)?;
        return_value(descriptor, value)
    }

    /// 被代理的接口描述。
    pub fn interface(&self) -> &InterfaceDescriptor {
        &self.interface
    }

    /// 代理不参与相等比较。
    pub fn equals(&self, _other: &Proxy) -> Result<bool> {
        Err(self.identity_unsupported(IdentityOp::Equals))
    }

    /// 代理不参与哈希。
    pub fn hash_code(&self) -> Result<u64> {
        Err(self.identity_unsupported(IdentityOp::Hash))
    }

    /// 代理不提供字符串化。
    pub fn to_string_repr(&self) -> Result<String> {
        Err(self.identity_unsupported(IdentityOp::ToString))
    }

    fn method(&self, name: &str) -> Result<&Arc<MethodDescriptor>> {
        let Some(descriptor) = self.interface.method(name) else {
            return Err(match IdentityOp::from_method_name(name) {
                Some(op) => self.identity_unsupported(op),
                None => InterceptError::UnknownMethod {
                    interface: self.interface.name().to_owned().into(),
                    method: name.to_owned().into(),
                },
            });
        };
        match descriptor.identity() {
            Some(op) => Err(self.identity_unsupported(op)),
            None => Ok(descriptor),
        }
    }

    fn run(&self, method: &MethodDescriptor, args: Arguments) -> CallResult {
        if !self.config.trace_calls {
            return self.invocation(method).proceed(&*self.target, method, args);
        }

        let span = tracing::debug_span!(
            target: "weave::proxy",
            "weave.call",
            method = %method.qualified_name(),
            delegate = self.target.type_name(),
        );
        let _entered = span.enter();
        self.invocation(method).proceed(&*self.target, method, args)
    }

    fn invocation(&self, method: &MethodDescriptor) -> Invocation {
        let compile_chain = || compile(&resolve_interceptors(&self.registry, method));
        if !self.config.cache_chains {
            return compile_chain();
        }
        // 修订号必须先于解析读取，组合期间发生的注册会让该条目在下一次调用时失效。
        let revision = self.registry.revision();
        self.registry
            .cache()
            .get_or_compile(method.key(), revision, compile_chain)
    }

    fn identity_unsupported(&self, op: IdentityOp) -> InterceptError {
        InterceptError::unsupported(format!("{}::{}", self.interface.name(), op.as_str()))
    }
}

/// 为 trait 生成可拦截的代理。
///
/// 语法：`trait 名 => 代理类型名 [类型标记]`，方法与参数之后可在方括号中附加标记。
/// 方法返回值自动包裹为 `Result<T, InterceptError>`；参数与返回值类型需满足
/// `Clone + Debug + Send + Sync + 'static`。
///
/// 保留的身份形状：单参数的 `eq`/`ne`/`equals`/`fmt` 与无参数的 `hash`/`hash_code`/`to_string`
/// 经代理调用时返回 `Unsupported`；同名但参数个数不同的方法（如 `hash(data)`）照常转发。
///
/// ```
/// use std::sync::Arc;
/// use weave_core::{MarkerRegistry, Weaver, declare_markers, interface};
///
/// declare_markers!(pub Secured, pub Traced);
///
/// interface! {
///     pub trait Greeter => GreeterProxy [Secured] {
///         fn greet(&self, name: String) -> String [Traced];
///     }
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self, name: String) -> weave_core::Result<String> {
///         Ok(format!("hello, {name}"))
///     }
/// }
///
/// let weaver = Weaver::new(Arc::new(MarkerRegistry::new()));
/// let greeter = weaver
///     .create_proxy::<dyn Greeter>(Arc::new(English))
///     .expect("合法接口");
/// assert_eq!(greeter.greet("ada".into()).expect("调用成功"), "hello, ada");
/// ```
#[macro_export]
macro_rules! interface {
    (
        $(#[$meta:meta])*
        $vis:vis trait $name:ident => $proxy:ident $([$($tmarker:path),* $(,)?])? {
            $(
                $(#[$mmeta:meta])*
                fn $method:ident(
                    &self
                    $(, $arg:ident : $ty:ty $([$($pmarker:path),* $(,)?])?)*
                    $(,)?
                ) -> $ret:ty $([$($mmarker:path),* $(,)?])?;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis trait $name: Send + Sync + 'static {
            $(
                $(#[$mmeta])*
                fn $method(&self $(, $arg: $ty)*) -> $crate::Result<$ret>;
            )*
        }

        /// 由 `interface!` 生成的拦截代理。
        #[derive(Clone)]
        $vis struct $proxy {
            inner: $crate::Proxy,
        }

        impl $proxy {
            /// 类型擦除的代理核心。
            #[allow(dead_code)]
            $vis fn as_proxy(&self) -> &$crate::Proxy {
                &self.inner
            }
        }

        impl $name for $proxy {
            $(
                fn $method(&self $(, $arg: $ty)*) -> $crate::Result<$ret> {
                    self.inner
                        .call_as::<$ret>(::core::stringify!($method), $crate::args![$($arg),*])
                }
            )*
        }

        impl $crate::Interface for dyn $name {
            type Proxy = $proxy;

            fn describe() -> $crate::InterfaceBuilder {
                $crate::InterfaceDescriptor::builder::<dyn $name>(::core::stringify!($name))
                    $($(.marked::<$tmarker>())*)?
                    $(
                        .method(
                            $crate::MethodSignature::new(::core::stringify!($method))
                                $($(.marked::<$mmarker>())*)?
                                $(
                                    .param(
                                        $crate::ParameterDescriptor::of::<$ty>(::core::stringify!($arg))
                                            $($(.marked::<$pmarker>())*)?
                                    )
                                )*
                                .returns::<$ret>()
                        )
                    )*
            }

            fn dispatch(
                delegate: &Self,
                method: &$crate::MethodDescriptor,
                args: $crate::Arguments,
            ) -> $crate::CallResult {
                let name = method.name();
                $(
                    if name == ::core::stringify!($method) {
                        #[allow(unused_mut, unused_variables)]
                        let mut reader = args.reader(method);
                        $(let $arg = reader.read::<$ty>()?;)*
                        return delegate.$method($($arg),*).map($crate::Value::new);
                    }
                )*
                ::core::result::Result::Err($crate::InterceptError::UnknownMethod {
                    interface: ::std::borrow::Cow::Owned(method.declaring_type().name().to_owned()),
                    method: ::std::borrow::Cow::Owned(name.to_owned()),
                })
            }

            fn wrap(proxy: $crate::Proxy) -> Self::Proxy {
                $proxy { inner: proxy }
            }
        }
    };
}
