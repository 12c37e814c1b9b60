use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use sql_mapper::prelude::*;
use sql_mapper::test_utils::{Call, MockFactory};

fn uncached() -> TransactionManager<DefaultSession<MockFactory>> {
    TransactionManager::new(DefaultSession::new(MockFactory::new()), Arc::new(DefaultEngine::new()))
}

#[test]
fn default_session_opens_and_closes_per_transaction() -> Result<(), SqlMapperError> {
    let manager = uncached();
    manager.exec(|_| Ok(()))?;
    manager.exec(|_| Ok(()))?;

    let factory = manager.session().factory();
    assert_eq!(factory.created(), 2);
    assert_eq!(factory.closed().len(), 2);
    assert_eq!(manager.session().open_connections(), 0);
    assert_eq!(factory.log().commits(), 2);
    Ok(())
}

#[test]
fn release_failure_after_commit_is_reported() {
    let manager = uncached();
    manager.session().factory().fail_close("fd leak");
    let err = manager.exec(|_| Ok(())).unwrap_err();
    assert!(matches!(err, SqlMapperError::ExecutionError(ref msg) if msg == "fd leak"));
    assert_eq!(manager.session().factory().log().commits(), 1);
    assert_eq!(manager.session().factory().log().rollbacks(), 0);
    assert!(!manager.in_transaction());
}

#[test]
fn rollback_and_close_failures_keep_every_cause() {
    let manager = uncached();
    let factory = manager.session().factory();
    factory.fail_update("deadlock");
    factory.fail_rollback("broken pipe");
    factory.fail_close("socket closed");

    let err = manager
        .exec(|storage| {
            storage.update("update t set a = 1", &[])?;
            Ok(())
        })
        .unwrap_err();

    let messages: Vec<String> = std::iter::successors(Some(&err), |e| e.secondary())
        .map(|e| e.primary().to_string())
        .collect();
    assert_eq!(
        messages,
        vec![
            "SQL execution error: socket closed".to_string(),
            "SQL execution error: broken pipe".to_string(),
            "SQL execution error: deadlock".to_string(),
        ]
    );
    assert_eq!(factory.log().commits(), 0);
    assert_eq!(manager.session().open_connections(), 0);
}

#[test]
fn connection_failure_runs_no_work() {
    let manager = uncached();
    manager.session().factory().fail_create("refused");
    let mut ran = false;
    let err = manager
        .exec(|_| {
            ran = true;
            Ok(())
        })
        .unwrap_err();
    assert!(!ran);
    assert_eq!(err.to_string(), "SQL execution error: refused");
    assert!(manager.session().factory().log().calls().is_empty());
}

#[test]
fn panicking_work_is_rolled_back_and_unregistered() {
    let manager = uncached();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        manager.exec(|storage| {
            storage.update("update t set a = 1", &[])?;
            panic!("bug in caller");
        })
    }));
    assert!(outcome.is_err());
    assert!(!manager.in_transaction());

    let factory = manager.session().factory();
    assert_eq!(
        factory.log().calls(),
        vec![
            Call::AutoCommit(false),
            Call::Isolation(IsolationLevel::Serializable),
            Call::Update("update t set a = 1".into()),
            Call::Rollback,
        ]
    );
    assert_eq!(factory.closed().len(), 1);
    assert_eq!(manager.session().open_connections(), 0);
}
