use std::error::Error as _;

use weave_core::{InterceptError, Value, interceptor_fn};

use crate::support::{Fixture, Repo, RepoFailure, Secured, Sensitive, Tagged, Traced};

/// 委托失败原样到达调用方，`after` 仍然执行。
#[test]
fn delegate_failure_passes_through_unchanged() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_advice_for::<Secured>(Tagged::new("Audit", &fixture.journal))
        .expect("注册");

    let err = fixture.repo().fail(7).expect_err("委托失败");
    assert!(matches!(err, InterceptError::Failure(_)));
    assert_eq!(err.downcast_failure::<RepoFailure>(), Some(&RepoFailure(7)));
    assert_eq!(err.to_string(), "repository failed with code 7");
    assert_eq!(
        fixture.journal.entries(),
        ["Audit.before", "fail(7)", "Audit.after"]
    );
}

/// 委托与 `after` 同时失败时两者都保留。
#[test]
fn after_failure_does_not_hide_delegate_failure() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_advice_for::<Secured>(Tagged::new("Audit", &fixture.journal).failing_after())
        .expect("注册");

    let err = fixture.repo().fail(3).expect_err("两处失败");
    assert_eq!(err.downcast_failure::<RepoFailure>(), Some(&RepoFailure(3)));
    match &err {
        InterceptError::AfterAdvice { primary, after } => {
            assert_eq!(primary.to_string(), "repository failed with code 3");
            assert_eq!(after.to_string(), "Audit failed after the call");
        }
        other => panic!("unexpected error: {other}"),
    }
    let source = err.source().expect("source 指向原始失败");
    assert_eq!(source.to_string(), "repository failed with code 3");
}

/// 调用成功但 `after` 失败时返回 `after` 的失败。
#[test]
fn after_failure_on_success_is_reported() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_advice_for::<Traced>(Tagged::new("Log", &fixture.journal).failing_after())
        .expect("注册");

    let err = fixture.repo().get(1).expect_err("after 失败");
    assert_eq!(err.to_string(), "Log failed after the call");
    assert_eq!(fixture.journal.entries(), ["Log.before", "get(1)", "Log.after"]);
}

/// `before` 失败时既不调用委托，也不执行 `after`。
#[test]
fn before_failure_skips_the_call() {
    let fixture = Fixture::new();
    let registry = fixture.registry();
    registry
        .register_advice_for::<Secured>(Tagged::new("Audit", &fixture.journal))
        .expect("注册 Audit");
    registry
        .register_advice_for::<Traced>(Tagged::new("Guard", &fixture.journal).failing_before())
        .expect("注册 Guard");

    let err = fixture.repo().get(1).expect_err("被拒绝");
    assert_eq!(err.to_string(), "Guard rejected the call");
    assert_eq!(
        fixture.journal.entries(),
        ["Audit.before", "Guard.before", "Audit.after"]
    );
}

/// 拦截器可以改写参数。
#[test]
fn interceptor_rewrites_arguments() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_for::<Sensitive>(interceptor_fn(|target, method, mut args, next| {
            let masked = args
                .get::<String>(method, 1)
                .map(|value| "*".repeat(value.len()))?;
            args.replace(1, masked)?;
            next.proceed(target, method, args)
        }))
        .expect("注册");

    let repo = fixture.repo();
    repo.put(5, "secret".to_owned()).expect("调用成功");
    assert_eq!(repo.get(5).expect("调用成功"), "******");
}

/// 拦截器可以替换结果。
#[test]
fn interceptor_replaces_result() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_for::<Traced>(interceptor_fn(|target, method, args, next| {
            let value = next.proceed(target, method, args)?;
            let upper = value
                .downcast_ref::<String>()
                .map(|name| name.to_uppercase())
                .unwrap_or_default();
            Ok(Value::new(upper))
        }))
        .expect("注册");

    assert_eq!(fixture.repo().get(1).expect("调用成功"), "ADA");
}

/// 拦截器可以短路调用，委托不会被触达。
#[test]
fn interceptor_short_circuits() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_for::<Traced>(interceptor_fn(|_, _, _, _| Ok(Value::new("cached".to_owned()))))
        .expect("注册");

    assert_eq!(fixture.repo().get(1).expect("调用成功"), "cached");
    assert!(fixture.journal.entries().is_empty());
}

/// 返回值类型与声明不符时报告 `TypeMismatch`。
#[test]
fn mismatched_result_is_reported() {
    let fixture = Fixture::new();
    fixture
        .registry()
        .register_for::<Traced>(interceptor_fn(|_, _, _, _| Ok(Value::new(42_u8))))
        .expect("注册");

    let err = fixture.repo().get(1).expect_err("类型不符");
    assert!(matches!(err, InterceptError::TypeMismatch { .. }));
    assert!(err.to_string().contains("Repo::get"));
}
