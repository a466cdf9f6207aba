use rig_state::HierarchicalMapping;

#[test]
fn set_then_get_reads_back() {
    let mut mapping = HierarchicalMapping::new();
    mapping.set("a", 1).expect("set");
    mapping.set("section.b", 2).expect("set nested");
    mapping.set("section.deep.c", 3).expect("set deeper");
    assert_eq!(*mapping.get("a").expect("get"), 1);
    assert_eq!(*mapping.get("section.b").expect("get"), 2);
    assert_eq!(*mapping.get("section.deep.c").expect("get"), 3);
}

#[test]
fn overwrite_keeps_insertion_position() {
    let mut mapping = HierarchicalMapping::new();
    mapping.set("first", 1).expect("set");
    mapping.set("second", 2).expect("set");
    mapping.set("first", 10).expect("overwrite");
    assert_eq!(
        mapping.keys().collect::<Vec<_>>(),
        vec!["first".to_string(), "second".to_string()]
    );
    assert_eq!(*mapping.get("first").expect("get"), 10);
}

#[test]
fn keys_walk_depth_first_in_insertion_order() {
    let mut mapping = HierarchicalMapping::new();
    mapping.set("a.b", 1).expect("set");
    mapping.set("a.c", 2).expect("set");
    mapping.set("top", 3).expect("set");
    mapping.set("a.d.e", 4).expect("set");
    assert_eq!(
        mapping.keys().collect::<Vec<_>>(),
        vec![
            "a.b".to_string(),
            "a.c".to_string(),
            "a.d.e".to_string(),
            "top".to_string(),
        ]
    );
    // A fresh traversal starts over.
    assert_eq!(mapping.keys().count(), 4);
    assert_eq!(mapping.len(), 4);
}

#[test]
fn missing_lookups_name_the_first_absent_segment() {
    let mut mapping = HierarchicalMapping::new();
    mapping.set("a.b.c", 1).expect("set");
    let err = mapping.get("a.x.c").expect_err("missing section");
    assert!(err.is_not_found());
    assert_eq!(err.info().context.get("segment"), Some(&"x".to_string()));
    let err = mapping.get("a.b.z").expect_err("missing leaf");
    assert!(err.is_not_found());
}

#[test]
fn remove_drops_the_leaf() {
    let mut mapping = HierarchicalMapping::new();
    mapping.set("a.b", 1).expect("set");
    mapping.set("a.c", 2).expect("set");
    assert_eq!(mapping.remove("a.b").expect("remove"), 1);
    assert!(!mapping.contains("a.b"));
    assert!(mapping.contains("a.c"));
    assert!(mapping.remove("a.b").expect_err("gone").is_not_found());
}

#[test]
fn contains_never_errors() {
    let mut mapping = HierarchicalMapping::new();
    mapping.set("a.b", 1).expect("set");
    assert!(mapping.contains("a.b"));
    assert!(!mapping.contains("a"));
    assert!(!mapping.contains("a.b.c"));
    assert!(!mapping.contains("unrelated"));
}

#[test]
fn merge_gives_precedence_to_self() {
    let mut ours = HierarchicalMapping::new();
    ours.set("shared", 1).expect("set");
    ours.set("mine", 2).expect("set");
    let mut theirs = HierarchicalMapping::new();
    theirs.set("shared", 100).expect("set");
    theirs.set("extra.deep", 3).expect("set");
    ours.merge(&theirs).expect("merge");
    assert_eq!(*ours.get("shared").expect("get"), 1);
    assert_eq!(*ours.get("mine").expect("get"), 2);
    assert_eq!(*ours.get("extra.deep").expect("get"), 3);
}

#[test]
fn get_or_set_stores_the_default_once() {
    let mut mapping = HierarchicalMapping::new();
    assert_eq!(*mapping.get_or_set("counter", 5).expect("default"), 5);
    assert_eq!(*mapping.get_or_set("counter", 99).expect("existing"), 5);
}

#[test]
fn leaf_and_section_may_not_share_a_prefix() {
    let mut mapping = HierarchicalMapping::new();
    mapping.set("a.b", 1).expect("set");
    // A leaf where a section already lives.
    let err = mapping.set("a", 2).expect_err("section conflict");
    assert_eq!(err.info().code, "mapping.section_conflict");
    // A section path through an existing leaf.
    let err = mapping.set("a.b.c", 3).expect_err("leaf conflict");
    assert_eq!(err.info().code, "mapping.section_conflict");
    // The original entry is untouched.
    assert_eq!(*mapping.get("a.b").expect("get"), 1);
}

#[test]
fn malformed_keys_are_rejected_eagerly() {
    let mut mapping: HierarchicalMapping<i32> = HierarchicalMapping::new();
    for key in ["", ".", "a..b", ".a", "a.", "bad/segment", "a.b/c"] {
        let err = mapping.set(key, 1).expect_err("must reject");
        assert!(
            matches!(err, rig_core::RigError::MalformedKey(_)),
            "key {key:?} gave {err:?}"
        );
    }
    assert!(mapping.is_empty());
}

#[test]
fn len_matches_key_count_after_mutations() {
    let mut mapping = HierarchicalMapping::new();
    for (idx, key) in ["x.a", "x.b", "y", "z.deep.leaf"].iter().enumerate() {
        mapping.set(key, idx).expect("set");
    }
    assert_eq!(mapping.len(), mapping.keys().count());
    mapping.remove("x.b").expect("remove");
    assert_eq!(mapping.len(), 3);
    assert_eq!(mapping.len(), mapping.keys().count());
}
