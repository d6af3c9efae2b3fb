use dirtally_scan::{Directory, Root, ScanConfig, Scanner};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_bytes(path: &Path, len: usize) {
    fs::write(path, vec![b'x'; len]).unwrap();
}

fn scan(path: &Path) -> Root {
    Scanner::new(ScanConfig::new(path)).unwrap().scan().unwrap()
}

fn child<'a>(dir: &Directory<'a>, name: &str) -> Directory<'a> {
    dir.subdirectories()
        .find(|sub| sub.name() == name)
        .unwrap_or_else(|| panic!("no subdirectory {name}"))
}

/// R/D/{a: 100, b: 200, E/}
fn sample_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let d = temp.path().join("D");
    fs::create_dir_all(d.join("E")).unwrap();
    write_bytes(&d.join("a"), 100);
    write_bytes(&d.join("b"), 200);
    temp
}

fn assert_aggregated(dir: &Directory<'_>, root: &Root) {
    let files: u64 = dir.files().map(|(id, _)| root.size(id).unwrap()).sum();
    let subdirectories: u64 = dir.subdirectories().map(|sub| sub.size().unwrap()).sum();
    assert_eq!(dir.size().unwrap(), files + subdirectories);

    let nested_files: u64 = dir.subdirectories().map(|sub| sub.total_file_count()).sum();
    assert_eq!(dir.total_file_count(), dir.file_count() as u64 + nested_files);

    let nested_dirs: u64 = dir
        .subdirectories()
        .map(|sub| sub.total_subdirectory_count())
        .sum();
    assert_eq!(dir.total_subdirectory_count(), 1 + nested_dirs);

    for sub in dir.subdirectories() {
        assert_aggregated(&sub, root);
    }
}

#[test]
fn test_sample_tree_sizes_and_counts() {
    let temp = sample_tree();
    let root = scan(temp.path());
    let top = root.top_directory();
    let d = child(&top, "D");

    assert_eq!(d.size().unwrap(), 300);
    assert_eq!(d.file_count(), 2);
    assert_eq!(d.subdirectory_count(), 1);
    assert_eq!(d.total_file_count(), 2);
    assert_eq!(d.total_subdirectory_count(), 2);
    assert_eq!(top.size().unwrap(), 300);
    assert_eq!(child(&d, "E").size().unwrap(), 0);
}

#[test]
fn test_aggregation_holds_recursively() {
    let temp = sample_tree();
    fs::create_dir_all(temp.path().join("x/y/z")).unwrap();
    write_bytes(&temp.path().join("x/one"), 11);
    write_bytes(&temp.path().join("x/y/two"), 22);
    write_bytes(&temp.path().join("x/y/z/three"), 33);

    let root = scan(temp.path());
    assert_aggregated(&root.top_directory(), &root);
    assert_eq!(root.top_directory().size().unwrap(), 300 + 11 + 22 + 33);
}

#[test]
fn test_single_parentless_element() {
    let temp = sample_tree();
    let root = scan(temp.path());
    assert_eq!(root.orphans().collect::<Vec<_>>(), vec![root.top()]);

    for (id, _) in root.iter() {
        assert_eq!(root.root_of(id).unwrap(), root.top());
    }
}

#[test]
fn test_subdirectories_is_restartable() {
    let temp = sample_tree();
    fs::create_dir(temp.path().join("F")).unwrap();
    let root = scan(temp.path());
    let top = root.top_directory();

    let first: Vec<_> = top.subdirectories().map(|d| d.id()).collect();
    let second: Vec<_> = top.subdirectories().map(|d| d.id()).collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[cfg(unix)]
#[test]
fn test_hardlinks_in_one_directory() {
    let temp = TempDir::new().unwrap();
    write_bytes(&temp.path().join("x"), 64);
    fs::hard_link(temp.path().join("x"), temp.path().join("y")).unwrap();

    let root = scan(temp.path());
    let top = root.top_directory();

    assert_eq!(top.file_count(), 1);
    assert_eq!(top.hardlink_count(), 1);
    assert_eq!(top.total_hardlink_count(), 1);
    assert_eq!(top.size().unwrap(), 64);
    assert_eq!(root.registry().len(), 1);
}

#[cfg(unix)]
#[test]
fn test_hardlink_count_is_names_minus_one() {
    let temp = TempDir::new().unwrap();
    write_bytes(&temp.path().join("n0"), 10);
    for i in 1..5 {
        fs::hard_link(temp.path().join("n0"), temp.path().join(format!("n{i}"))).unwrap();
    }

    let root = scan(temp.path());
    let top = root.top_directory();
    assert_eq!(top.file_count(), 1);
    assert_eq!(top.hardlink_count(), 4);
    assert_eq!(top.size().unwrap(), 10);
}

#[cfg(unix)]
#[test]
fn test_hardlinks_across_directories() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("a")).unwrap();
    fs::create_dir(temp.path().join("b")).unwrap();
    write_bytes(&temp.path().join("a/data"), 500);
    fs::hard_link(temp.path().join("a/data"), temp.path().join("b/data")).unwrap();

    let root = scan(temp.path());
    let top = root.top_directory();

    // Listing order decides which directory owns the file
    assert_eq!(top.total_file_count(), 1);
    assert_eq!(top.total_hardlink_count(), 1);
    assert_eq!(top.size().unwrap(), 500);
    assert_eq!(top.hardlink_count(), 0);
}

#[cfg(unix)]
#[test]
fn test_symlinks_recorded_not_followed() {
    let temp = sample_tree();
    std::os::unix::fs::symlink(temp.path().join("D"), temp.path().join("to_d")).unwrap();
    std::os::unix::fs::symlink("nowhere", temp.path().join("dangling")).unwrap();

    let root = scan(temp.path());
    let top = root.top_directory();

    assert_eq!(top.symlink_count(), 2);
    assert_eq!(top.subdirectory_count(), 1);
    assert_eq!(top.total_file_count(), 2);
    assert_eq!(top.size().unwrap(), 300);

    let (link, element) = top.symlinks().find(|(_, e)| e.name() == "dangling").unwrap();
    assert_eq!(root.size(link).unwrap(), 0);
    assert!(matches!(
        element.kind(),
        dirtally_scan::ElementKind::Symlink { target: Some(t) } if t == Path::new("nowhere")
    ));
}

#[cfg(unix)]
#[test]
fn test_names_with_invalid_utf8_are_kept_apart() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    let first = temp.path().join(OsStr::from_bytes(b"a\xff"));
    let second = temp.path().join(OsStr::from_bytes(b"a\xfe"));
    if fs::write(&first, b"x").is_err() {
        // Filesystem only accepts UTF-8 names
        return;
    }
    write_bytes(&second, 2);
    fs::create_dir(temp.path().join(OsStr::from_bytes(b"d\xff"))).unwrap();
    fs::create_dir(temp.path().join(OsStr::from_bytes(b"d\xfe"))).unwrap();

    let root = scan(temp.path());
    let top = root.top_directory();

    assert_eq!(top.file_count(), 2);
    assert_eq!(top.subdirectory_count(), 2);
    assert_eq!(top.size().unwrap(), 3);
    assert!(root.warnings().is_empty());

    let names: Vec<_> = top.files().map(|(_, file)| file.file_name()).collect();
    assert!(names.contains(&first.file_name().unwrap()));
    assert!(names.contains(&second.file_name().unwrap()));
}

#[cfg(unix)]
#[test]
fn test_keep_going_substitutes_unreadable_directory() {
    use dirtally_scan::WarningKind;
    use std::os::unix::fs::PermissionsExt;

    let temp = sample_tree();
    let locked = temp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    write_bytes(&locked.join("secret"), 50);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits are not enforced for privileged users
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let strict = Scanner::new(ScanConfig::new(temp.path())).unwrap().scan();
    assert!(strict.is_err());

    let config = ScanConfig::builder()
        .root(temp.path())
        .keep_going(true)
        .build()
        .unwrap();
    let root = Scanner::new(config).unwrap().scan().unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let top = root.top_directory();
    let locked = child(&top, "locked");
    assert!(locked.is_unreadable());
    assert_eq!(locked.size().unwrap(), 0);
    assert_eq!(top.size().unwrap(), 300);
    assert_eq!(root.warnings().len(), 1);
    assert_eq!(root.warnings()[0].kind, WarningKind::ReadError);
}

#[test]
fn test_independent_roots_on_threads() {
    let temp = sample_tree();
    let path = temp.path().to_path_buf();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            std::thread::spawn(move || scan(&path))
        })
        .collect();

    for handle in handles {
        let root = handle.join().unwrap();
        assert_eq!(root.top_directory().total_file_count(), 2);
        assert_eq!(root.top_directory().total_hardlink_count(), 0);
    }
}

#[test]
fn test_export_snapshot() {
    let temp = sample_tree();
    let root = scan(temp.path());
    let tree = root.top_directory().to_tree().unwrap();

    assert_eq!(tree.value().size, Some(300));
    assert_eq!(tree.node_count(), 5);
    let d = &tree.children()[0];
    assert_eq!(d.label("files"), Some("2"));
    assert_eq!(d.label("subdirectories"), Some("1"));
    // Subdirectories come first
    assert_eq!(d.children()[0].value().name.as_str(), "E");
}

#[test]
fn test_convenience_scan() {
    let temp = sample_tree();
    let root = dirtally_scan::scan(temp.path()).unwrap();
    assert_eq!(root.top_directory().size().unwrap(), 300);
}
