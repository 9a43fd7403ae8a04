use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use weave_core::{
    Arguments, CallResult, Interceptor, InterfaceDescriptor, MethodDescriptor, MethodSignature,
    ProxyConfig, Target, Value, declare_markers, interceptor_fn,
};

use crate::support::{Fixture, Repo, Secured, Tagged, Traced};

declare_markers!(Hot);

fn counting(counter: &Arc<AtomicUsize>) -> impl Interceptor {
    let counter = Arc::clone(counter);
    interceptor_fn(move |target, method, args, next| {
        counter.fetch_add(1, Ordering::SeqCst);
        next.proceed(target, method, args)
    })
}

trait Shape {}

struct UnitSquare;

impl Target for UnitSquare {
    fn type_name(&self) -> &'static str {
        "UnitSquare"
    }

    fn invoke(&self, _: &MethodDescriptor, _: Arguments) -> CallResult {
        Ok(Value::new(1_u32))
    }
}

/// 命中缓存的调用与首次调用行为一致，且每个方法只组合一次。
#[test]
fn cached_chain_behaves_like_fresh_chain() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_advice_for::<Traced>(Tagged::new("Log", &fixture.journal))
        .expect("注册");

    let repo = fixture.repo();
    let first = repo.get(1).expect("首次调用");
    let first_trace = fixture.journal.entries();
    fixture.journal.clear();
    let second = repo.get(1).expect("命中缓存");

    assert_eq!(first, second);
    assert_eq!(first_trace, fixture.journal.entries());
    assert_eq!(fixture.registry().cache().len(), 1);

    repo.count().expect("调用成功");
    assert_eq!(fixture.registry().cache().len(), 2);
}

/// 首次调用之后的注册在下一次调用时可见。
#[test]
fn registration_after_first_call_is_seen_on_next_call() {
    let fixture = Fixture::new();
    let repo = fixture.repo();

    repo.get(1).expect("无拦截器");
    assert_eq!(fixture.journal.entries(), ["get(1)"]);
    assert_eq!(fixture.registry().cache().len(), 1);

    fixture
        .registry()
        .register_advice_for::<Secured>(Tagged::new("Audit", &fixture.journal))
        .expect("注册");
    assert!(fixture.registry().cache().is_empty());

    fixture.journal.clear();
    repo.get(1).expect("新链路");
    assert_eq!(fixture.journal.entries(), ["Audit.before", "get(1)", "Audit.after"]);
}

/// 同一 `Weaver` 创建的代理共享描述符，从而共享按方法缓存的调用链。
#[test]
fn proxies_share_compiled_chains() {
    let fixture = Fixture::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    fixture
        .registry()
        .register_for::<Secured>(interceptor_fn(move |target, method, args, next| {
            seen.fetch_add(1, Ordering::SeqCst);
            next.proceed(target, method, args)
        }))
        .expect("注册");

    let left = fixture.repo();
    let right = fixture.repo();
    left.get(1).expect("调用成功");
    right.get(1).expect("调用成功");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(fixture.registry().cache().len(), 1);
}

/// 关闭缓存后每次调用重新解析，语义保持不变。
#[test]
fn disabled_cache_resolves_every_call() {
    let fixture = Fixture::with_config(ProxyConfig {
        cache_chains: false,
        ..ProxyConfig::default()
    });
    fixture
        .registry()
        .register_advice_for::<Traced>(Tagged::new("Log", &fixture.journal))
        .expect("注册");

    let repo = fixture.repo();
    repo.get(1).expect("调用成功");
    repo.get(1).expect("调用成功");

    assert!(fixture.registry().cache().is_empty());
    assert_eq!(
        fixture.journal.entries(),
        ["Log.before", "get(1)", "Log.after", "Log.before", "get(1)", "Log.after"]
    );
}

/// 同一 Rust 类型的两份手写描述各自解析调用链，互不借用对方的拦截器。
#[test]
fn descriptors_of_the_same_type_do_not_share_chains() {
    let fixture = Fixture::new();
    let hits = Arc::new(AtomicUsize::new(0));
    fixture
        .registry()
        .register_for::<Hot>(counting(&hits))
        .expect("注册");

    let marked = fixture
        .weaver
        .create_dyn_proxy(
            InterfaceDescriptor::builder::<dyn Shape>("Marked")
                .method(MethodSignature::new("area").marked::<Hot>().returns::<u32>()),
            Arc::new(UnitSquare),
        )
        .expect("合法接口");
    let plain = fixture
        .weaver
        .create_dyn_proxy(
            InterfaceDescriptor::builder::<dyn Shape>("Plain")
                .method(MethodSignature::new("area").returns::<u32>()),
            Arc::new(UnitSquare),
        )
        .expect("合法接口");

    assert_eq!(marked.call_as::<u32>("area", Arguments::empty()).expect("调用成功"), 1);
    assert_eq!(plain.call_as::<u32>("area", Arguments::empty()).expect("调用成功"), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    plain.call("area", Arguments::empty()).expect("调用成功");
    marked.call("area", Arguments::empty()).expect("调用成功");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(fixture.registry().cache().len(), 2);
}

/// 修订号相同的两个注册表各自缓存，不会命中对方组合的调用链。
#[test]
fn registries_at_equal_revisions_keep_separate_chains() {
    let audited = Fixture::new();
    let quiet = Fixture::new();
    let hits = Arc::new(AtomicUsize::new(0));
    audited
        .registry()
        .register_for::<Secured>(counting(&hits))
        .expect("注册");
    quiet
        .registry()
        .register_for::<Hot>(counting(&hits))
        .expect("注册");
    assert_eq!(audited.registry().revision(), quiet.registry().revision());

    audited.repo().get(1).expect("调用成功");
    quiet.repo().get(1).expect("调用成功");
    quiet.repo().get(1).expect("命中缓存");

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(audited.registry().cache().len(), 1);
    assert_eq!(quiet.registry().cache().len(), 1);
}
