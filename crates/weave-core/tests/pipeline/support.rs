//! 端到端测试夹具：内存仓库、记录型 Advice 与共享日志。

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use weave_core::{
    Advice, Arguments, InterceptError, MarkerRegistry, MethodDescriptor, Outcome, ProxyConfig,
    Result, Target, Weaver, declare_markers, interface,
};

declare_markers!(
    /// 类型级：安全审计。
    pub Secured,
    /// 方法级：调用追踪。
    pub Traced,
    /// 参数级：敏感数据。
    pub Sensitive,
);

interface! {
    /// 测试用仓库接口。
    pub trait Repo => RepoProxy [Secured] {
        fn get(&self, id: u64) -> String [Traced];
        fn put(&self, id: u64, value: String [Sensitive]) -> ();
        fn fail(&self, code: u32) -> ();
        fn count(&self) -> usize;
        fn equals(&self, other: u64) -> bool;
    }
}

/// 调用轨迹，跨 Advice 与委托共享。
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().expect("journal").push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("journal").clone()
    }

    pub fn clear(&self) {
        self.0.lock().expect("journal").clear();
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("repository failed with code {0}")]
pub struct RepoFailure(pub u32);

/// 内存仓库委托。
pub struct MemoryRepo {
    entries: Mutex<HashMap<u64, String>>,
    journal: Journal,
}

impl MemoryRepo {
    pub fn new(journal: &Journal) -> Self {
        Self {
            entries: Mutex::new(HashMap::from([(1, "ada".to_owned())])),
            journal: journal.clone(),
        }
    }
}

impl Repo for MemoryRepo {
    fn get(&self, id: u64) -> Result<String> {
        self.journal.push(format!("get({id})"));
        Ok(self
            .entries
            .lock()
            .expect("entries")
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn put(&self, id: u64, value: String) -> Result<()> {
        self.journal.push(format!("put({id}, {value})"));
        self.entries.lock().expect("entries").insert(id, value);
        Ok(())
    }

    fn fail(&self, code: u32) -> Result<()> {
        self.journal.push(format!("fail({code})"));
        Err(InterceptError::failure(RepoFailure(code)))
    }

    fn count(&self) -> Result<usize> {
        self.journal.push("count()");
        Ok(self.entries.lock().expect("entries").len())
    }

    fn equals(&self, other: u64) -> Result<bool> {
        self.journal.push(format!("equals({other})"));
        Ok(false)
    }
}

/// 将 `label.before` / `label.after` 写入轨迹的 Advice。
pub struct Tagged {
    label: &'static str,
    journal: Journal,
    fail_before: bool,
    fail_after: bool,
}

impl Tagged {
    pub fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            journal: journal.clone(),
            fail_before: false,
            fail_after: false,
        }
    }

    pub fn failing_before(mut self) -> Self {
        self.fail_before = true;
        self
    }

    pub fn failing_after(mut self) -> Self {
        self.fail_after = true;
        self
    }
}

impl Advice for Tagged {
    fn before(&self, _: &dyn Target, _: &MethodDescriptor, _: &Arguments) -> Result<()> {
        self.journal.push(format!("{}.before", self.label));
        if self.fail_before {
            return Err(InterceptError::message(format!("{} rejected the call", self.label)));
        }
        Ok(())
    }

    fn after(
        &self,
        _: &dyn Target,
        _: &MethodDescriptor,
        _: &Arguments,
        _: Outcome<'_>,
    ) -> Result<()> {
        self.journal.push(format!("{}.after", self.label));
        if self.fail_after {
            return Err(InterceptError::message(format!("{} failed after the call", self.label)));
        }
        Ok(())
    }
}

/// 一套相互隔离的测试环境。
pub struct Fixture {
    pub journal: Journal,
    pub weaver: Weaver,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(ProxyConfig::default())
    }

    pub fn with_config(config: ProxyConfig) -> Self {
        Self {
            journal: Journal::default(),
            weaver: Weaver::with_config(Arc::new(MarkerRegistry::new()), config),
        }
    }

    pub fn registry(&self) -> &MarkerRegistry {
        self.weaver.registry()
    }

    pub fn delegate(&self) -> Arc<MemoryRepo> {
        Arc::new(MemoryRepo::new(&self.journal))
    }

    pub fn repo(&self) -> RepoProxy {
        self.weaver
            .create_proxy::<dyn Repo>(self.delegate())
            .unwrap_or_else(|err| panic!("Repo 描述应当合法: {err}"))
    }
}
