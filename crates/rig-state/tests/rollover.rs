use rig_state::State;
use tempfile::tempdir;

fn load_tag(path: &std::path::Path) -> String {
    let mut state = State::new();
    state.load(Some(path), false, true).expect("load");
    state
        .get("tag")
        .expect("tag")
        .as_str()
        .expect("text")
        .to_string()
}

#[test]
fn three_generations_rotate_into_numbered_slots() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("run.rig");

    let mut state = State::new();
    for tag in ["A", "B", "C"] {
        state.set("tag", tag).expect("set");
        state.save(&path, 2, 5).expect("save");
    }

    assert_eq!(load_tag(&path), "C");
    assert_eq!(load_tag(&dir.path().join("run.rig.1")), "B");
    assert_eq!(load_tag(&dir.path().join("run.rig.2")), "A");
    assert!(!dir.path().join("run.rig.3").exists());
}

#[test]
fn retention_drops_the_oldest_generation() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("run.rig");

    let mut state = State::new();
    for tag in ["A", "B", "C", "D"] {
        state.set("tag", tag).expect("set");
        state.save(&path, 2, 5).expect("save");
    }

    assert_eq!(load_tag(&path), "D");
    assert_eq!(load_tag(&dir.path().join("run.rig.1")), "C");
    assert_eq!(load_tag(&dir.path().join("run.rig.2")), "B");
    // "A" fell off the end of the retention window.
    assert!(!dir.path().join("run.rig.3").exists());
}

#[test]
fn no_rotation_without_a_retention_count() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("run.rig");

    let mut state = State::new();
    state.set("tag", "A").expect("set");
    state.save(&path, 0, 5).expect("save");
    state.set("tag", "B").expect("set");
    state.save(&path, 0, 5).expect("save");

    assert_eq!(load_tag(&path), "B");
    assert!(!dir.path().join("run.rig.1").exists());
}

#[test]
fn lazily_bound_rotation_copies_instead_of_moving() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("run.rig");

    let mut state = State::new();
    state.set("tag", "old").expect("set");
    state.set("keep", 1i64).expect("set");
    state.save(&path, 0, 5).expect("save");

    // Bind lazily to the same file being rotated: reads may still depend
    // on the original path.
    let mut state = State::new();
    state.load(Some(&path), true, true).expect("lazy load");
    state.set("tag", "new").expect("set");
    state.save(&path, 1, 5).expect("save with rotation");

    // The backup holds the previous generation...
    assert_eq!(load_tag(&dir.path().join("run.rig.1")), "old");
    // ...and the new target holds the merge of carried and fresh leaves.
    let mut reloaded = State::new();
    reloaded.load(Some(&path), false, true).expect("reload");
    assert_eq!(reloaded.get("tag").expect("tag").as_str(), Some("new"));
    assert_eq!(reloaded.get("keep").expect("keep").as_i64(), Some(1));
}
