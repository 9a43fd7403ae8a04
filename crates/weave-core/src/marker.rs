//! 标记（Marker）：附着在类型、方法、参数上的不透明标签，仅用作注册表查找键。
//!
//! # 教案式说明
//! - **意图 (Why)**：以显式、封闭的标签机制替代运行期注解发现；标签在接口描述构建时一次性
//!   附着到静态描述符上，调用期无需任何反射。
//! - **契约 (What)**：
//!   - 类型标记以 `TypeId` 判等，命名标记以名称判等，两类标记永不相等；
//!   - 标记不携带任何行为，全部行为由 [`MarkerRegistry`](crate::MarkerRegistry) 中登记的拦截器提供。

use std::{
    any::{TypeId, type_name},
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
};

/// 标记类型契约。
///
/// 通常借助 [`declare_markers!`](crate::declare_markers) 声明零尺寸结构体。
pub trait Marker: 'static {
    /// 返回该标记类型的身份。
    fn id() -> MarkerId
    where
        Self: Sized,
    {
        MarkerId::of::<Self>()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum MarkerKey {
    Type(TypeId),
    Named(Cow<'static, str>),
}

/// 标记身份：注册表与解析器使用的查找键。
///
/// # 契约说明（What）
/// - `PartialEq`/`Hash` 仅依据身份键计算，展示名不参与比较；
/// - `Display` 以 `@Name` 形式输出，贴近注解的阅读习惯。
#[derive(Clone, Debug)]
pub struct MarkerId {
    key: MarkerKey,
    name: Cow<'static, str>,
}

impl MarkerId {
    /// 以标记类型构造身份。
    pub fn of<M: Marker>() -> Self {
        Self {
            key: MarkerKey::Type(TypeId::of::<M>()),
            name: Cow::Borrowed(short_type_name(type_name::<M>())),
        }
    }

    /// 以名称构造身份，适用于由配置或脚本驱动的场景。
    ///
    /// 空名称在注册时会被拒绝（`InvalidArgument`）。
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        Self {
            key: MarkerKey::Named(name.clone()),
            name,
        }
    }

    /// 展示名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否为可注册的有效身份。
    pub fn is_valid(&self) -> bool {
        match &self.key {
            MarkerKey::Type(_) => true,
            MarkerKey::Named(name) => !name.trim().is_empty(),
        }
    }
}

impl PartialEq for MarkerId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for MarkerId {}

impl Hash for MarkerId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

/// 声明一组零尺寸标记类型。
///
/// ```
/// weave_core::declare_markers! {
///     /// 需要审计的类型。
///     pub Secured,
///     pub Traced,
/// }
/// ```
#[macro_export]
macro_rules! declare_markers {
    ($($(#[$meta:meta])* $vis:vis $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
            $vis struct $name;

            impl $crate::Marker for $name {}
        )*
    };
}
