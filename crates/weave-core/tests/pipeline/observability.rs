use tracing_test::traced_test;
use weave_core::ProxyConfig;

use crate::support::{Fixture, Repo, Tagged, Traced};

/// 注册、代理创建与调用链组合都会留下调试事件。
#[traced_test]
#[test]
fn lifecycle_events_are_logged() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_advice_for::<Traced>(Tagged::new("Log", &fixture.journal))
        .expect("注册");
    let repo = fixture.repo();
    repo.get(1).expect("调用成功");

    assert!(logs_contain("registered interceptor"));
    assert!(logs_contain("created interception proxy"));
    assert!(logs_contain("compiled interceptor chain"));
    assert!(logs_contain("invoking delegate"));
}

/// 开启 `trace_calls` 后，调用在 `weave.call` span 内执行。
#[traced_test]
#[test]
fn traced_calls_enter_a_span() {
    let fixture = Fixture::with_config(ProxyConfig {
        trace_calls: true,
        ..ProxyConfig::default()
    });
    fixture.repo().count().expect("调用成功");

    assert!(logs_contain("weave.call"));
    assert!(logs_contain("Repo::count"));
}
