use rig_state::{State, SubState};

#[test]
fn operations_are_scoped_under_the_prefix() {
    let mut state = State::new();
    state.set("outside", 0i64).expect("set");
    {
        let mut scoped = SubState::new(&mut state, "worker.3").expect("scope");
        scoped.set("progress", 40i64).expect("set");
        scoped.set("phase", "warmup").expect("set");
        assert_eq!(scoped.get("progress").expect("get").as_i64(), Some(40));
        assert!(scoped.contains("phase"));
        assert!(!scoped.contains("outside"));
        assert_eq!(
            scoped.keys(),
            vec!["progress".to_string(), "phase".to_string()]
        );
    }
    // The underlying state holds the fully qualified keys.
    assert_eq!(state.get("worker.3.progress").expect("get").as_i64(), Some(40));
    assert_eq!(state.get("outside").expect("get").as_i64(), Some(0));
}

#[test]
fn delete_and_get_or_set_delegate() {
    let mut state = State::new();
    let mut scoped = SubState::new(&mut state, "trial").expect("scope");
    scoped.set("keep", 1i64).expect("set");
    scoped.set("drop", 2i64).expect("set");
    scoped.delete("drop").expect("delete");
    assert!(!scoped.contains("drop"));
    assert_eq!(scoped.get_or_set("fresh", 3i64).expect("default").as_i64(), Some(3));
    assert_eq!(scoped.get_or_set("keep", 9i64).expect("existing").as_i64(), Some(1));
}

#[test]
fn malformed_prefixes_are_rejected() {
    let mut state = State::new();
    assert!(SubState::new(&mut state, "").is_err());
    assert!(SubState::new(&mut state, "bad/prefix").is_err());
    assert!(SubState::new(&mut state, "a..b").is_err());
}

#[test]
fn nested_scopes_compose() {
    let mut state = State::new();
    {
        let mut outer = SubState::new(&mut state, "sweep").expect("outer");
        outer.set("jobs.0.seed", 7i64).expect("set");
    }
    assert_eq!(state.get("sweep.jobs.0.seed").expect("get").as_i64(), Some(7));
}
