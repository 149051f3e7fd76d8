use std::fs;

use tickbench_world::{
    Cell, CellPos, Error, Extent, FixtureRef, FixtureStore, GridWorld, MemoryFixtureStore,
    WorldSurface,
};

const LEVER: &str = r#"(
    size: (width: 3, height: 2, depth: 3),
    cells: [
        ((x: 1, y: 0, z: 1), Block("lever")),
        ((x: 2, y: 1, z: 2), Block("lamp")),
    ],
)"#;

#[test]
fn loads_nested_namespaces() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("demo/redstone")).unwrap();
    fs::write(dir.path().join("demo/redstone/lever.ron"), LEVER).unwrap();
    fs::write(dir.path().join("demo/notes.txt"), "ignored").unwrap();

    let store = MemoryFixtureStore::load_dir(dir.path()).unwrap();
    assert_eq!(store.len(), 1);

    let r: FixtureRef = "demo:redstone/lever".parse().unwrap();
    assert_eq!(store.resolve(&r).unwrap(), Extent::new(3, 2, 3));

    let mut world = GridWorld::new();
    store.materialize(&r, CellPos::new(5, 5, 5), &mut world).unwrap();
    assert!(world.get(CellPos::new(6, 5, 6)).is("lever"));
    assert!(world.get(CellPos::new(7, 6, 7)).is("lamp"));
    assert_eq!(world.get(CellPos::new(5, 5, 5)), Cell::Empty);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("demo")).unwrap();
    fs::write(dir.path().join("demo/broken.ron"), "(size: oops)").unwrap();

    let err = MemoryFixtureStore::load_dir(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
    assert!(!err.is_not_found());
}

#[test]
fn missing_root_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MemoryFixtureStore::load_dir(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, Error::Read { .. }), "{err}");
}
