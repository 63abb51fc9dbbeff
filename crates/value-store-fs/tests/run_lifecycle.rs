//! Load → evaluate → commit across simulated process restarts.

use tempfile::TempDir;
use value_store::{
    GetRateError, OnOverflow, ValueStore, collect_rates, get_average, get_rate,
};
use value_store_fs::{EvaluationRun, StateConfig, StateRepository, StoreScope};

/// A tiny check in the style of a kernel performance counter check: context
/// switches per second plus their 5 minute average.
fn check_kernel(store: &mut ValueStore, now: f64, ctxt: f64) -> value_store::Result<(f64, f64)> {
    let rate = get_rate(store, "ctxt", now, ctxt, OnOverflow::Zero)?;
    let average = get_average(store, "ctxt.avg", now, rate, 5.0)?;
    Ok((rate, average))
}

fn fresh_repository(temp: &TempDir) -> StateRepository {
    StateRepository::new(StateConfig::new(temp.path()))
}

#[test]
fn test_rates_survive_restarts() {
    let temp = TempDir::new().unwrap();
    let scope = StoreScope::for_check("host01", "kernel").unwrap();

    let samples = [(1000.0, 10_000.0), (1060.0, 16_000.0), (1120.0, 22_000.0)];
    let mut results = Vec::new();
    for (now, ctxt) in samples {
        // every run uses a fresh repository, like a new process
        let repo = fresh_repository(&temp);
        let mut run = EvaluationRun::begin_at(&repo, scope.clone(), now).unwrap();
        let now = run.now();
        results.push(check_kernel(run.store(), now, ctxt).unwrap());
        assert!(run.commit().unwrap());
    }

    assert_eq!(results[0], (0.0, 0.0));
    assert_eq!(results[1].0, 100.0);
    assert_eq!(results[2].0, 100.0);
    assert!(results[2].1 > results[1].1);
    assert!(results[2].1 < 100.0);
}

#[test]
fn test_wrapped_counter_only_fails_its_own_key() {
    let temp = TempDir::new().unwrap();
    let repo = fresh_repository(&temp);
    let scope = StoreScope::new("switch01", "if", Some("Gi0/1".to_string())).unwrap();

    let mut run = EvaluationRun::begin_at(&repo, scope.clone(), 0.0).unwrap();
    collect_rates(
        run.store(),
        0.0,
        [("in_octets", Some(4_000_000_000.0)), ("in_err", Some(3.0))],
        OnOverflow::Raise,
    );
    run.commit().unwrap();

    // device reboot: octets wrap, errors keep counting
    let mut run = EvaluationRun::begin_at(&repo, scope.clone(), 60.0).unwrap();
    let report = collect_rates(
        run.store(),
        60.0,
        [("in_octets", Some(600.0)), ("in_err", Some(63.0))],
        OnOverflow::Raise,
    );
    run.commit().unwrap();

    assert_eq!(report.rate("in_err"), Some(1.0));
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].1.as_get_rate().map(GetRateError::key),
        Some("in_octets")
    );

    // the wrapped sample became the baseline, so the next run is clean
    let mut run = EvaluationRun::begin_at(&repo, scope, 120.0).unwrap();
    let report = collect_rates(
        run.store(),
        120.0,
        [("in_octets", Some(6600.0)), ("in_err", Some(63.0))],
        OnOverflow::Raise,
    );
    assert!(!report.has_errors());
    assert_eq!(report.rate("in_octets"), Some(100.0));
    assert_eq!(report.rate("in_err"), Some(0.0));
}

#[test]
fn test_sub_item_keys_and_garbage_collection() {
    let temp = TempDir::new().unwrap();
    let repo = fresh_repository(&temp);
    let scope = StoreScope::for_check("backup01", "veeam_tapejobs").unwrap();

    let mut run = EvaluationRun::begin_at(&repo, scope.clone(), 500.0).unwrap();
    for job_id in ["5", "6"] {
        get_rate(
            run.store(),
            &format!("{job_id}.running_since"),
            500.0,
            1.0,
            OnOverflow::Zero,
        )
        .unwrap();
    }
    run.commit().unwrap();

    // job 6 vanished from the agent output
    let mut run = EvaluationRun::begin_at(&repo, scope.clone(), 560.0).unwrap();
    assert_eq!(run.store().remove_prefix("6."), 1);
    run.commit().unwrap();

    let store = repo.load(&scope).unwrap();
    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["5.running_since"]);

    // the object is no longer monitored at all
    assert_eq!(repo.objects().unwrap(), vec!["backup01"]);
    assert!(repo.remove_object("backup01").unwrap());
    assert!(repo.objects().unwrap().is_empty());
    assert!(repo.load(&scope).unwrap().is_empty());
}

#[test]
fn test_separate_scopes_do_not_share_state() {
    let temp = TempDir::new().unwrap();
    let repo = fresh_repository(&temp);
    let a = StoreScope::new("host01", "ps", Some("sshd".to_string())).unwrap();
    let b = StoreScope::new("host01", "ps", Some("nginx".to_string())).unwrap();

    let mut run = EvaluationRun::begin_at(&repo, a.clone(), 10.0).unwrap();
    get_rate(run.store(), "cpu", 10.0, 5.0, OnOverflow::Raise).unwrap();
    run.commit().unwrap();

    let mut run = EvaluationRun::begin_at(&repo, b, 20.0).unwrap();
    // cold start in the other scope
    assert_eq!(
        get_rate(run.store(), "cpu", 20.0, 500.0, OnOverflow::Raise).unwrap(),
        0.0
    );
    run.commit().unwrap();

    let mut run = EvaluationRun::begin_at(&repo, a, 30.0).unwrap();
    assert_eq!(
        get_rate(run.store(), "cpu", 30.0, 25.0, OnOverflow::Raise).unwrap(),
        1.0
    );
}

#[test]
fn test_extreme_average_does_not_discard_store() {
    let temp = TempDir::new().unwrap();
    let repo = fresh_repository(&temp);
    let scope = StoreScope::for_check("host01", "extremes").unwrap();

    let mut run = EvaluationRun::begin_at(&repo, scope.clone(), 0.0).unwrap();
    get_average(run.store(), "a", 0.0, 1e308, 1.0).unwrap();
    get_rate(run.store(), "b", 0.0, 1.0, OnOverflow::Raise).unwrap();
    run.commit().unwrap();

    let mut run = EvaluationRun::begin_at(&repo, scope.clone(), 600.0).unwrap();
    let average = get_average(run.store(), "a", 600.0, -1e308, 1.0).unwrap();
    assert!(average.is_finite());
    run.commit().unwrap();

    let loaded = repo.load(&scope).unwrap();
    assert!(loaded.contains_key("a"));
    assert!(loaded.contains_key("b"));
}
