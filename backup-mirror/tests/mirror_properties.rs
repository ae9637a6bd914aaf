//! End-to-end behaviour of a mirror run on scratch trees.

use backup_mirror::report::Category;
use backup_mirror::{sync, FailureKind, RelativeEntry, Report};
use filetime::{set_file_mtime, FileTime};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const T1: i64 = 1_600_000_000;
const T2: i64 = 1_700_000_000;

fn write_at(path: &Path, content: &[u8], unix_secs: i64) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0))
}

fn entries(paths: &[&str]) -> Vec<RelativeEntry> {
    paths.iter().map(RelativeEntry::new).collect()
}

fn sorted(list: &[RelativeEntry]) -> Vec<String> {
    let mut names: Vec<String> = list.iter().map(|e| e.to_string()).collect();
    names.sort();
    names
}

fn mirror(source: &Path, backup: &Path) -> anyhow::Result<Report> {
    Ok(sync::run(source, backup)?)
}

#[test]
fn scenario_a_new_file_into_empty_backup() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let parent = TempDir::new()?;
    let backup = parent.path().join("backup");
    write_at(&source.path().join("a.txt"), &[b'x'; 100], T1)?;

    let report = mirror(source.path(), &backup)?;

    assert_eq!(report.transferred(), entries(&["a.txt"]).as_slice());
    assert_eq!(report.total_bytes_added(), 100);
    assert!(report.created_directories().contains(&RelativeEntry::root()));
    assert_eq!(fs::read(backup.join("a.txt"))?, vec![b'x'; 100]);
    Ok(())
}

#[test]
fn scenario_a_existing_backup_root_is_not_created() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("a.txt"), &[b'x'; 100], T1)?;

    let report = mirror(source.path(), backup.path())?;

    assert!(report.created_directories().is_empty());
    assert_eq!(report.total_bytes_added(), 100);
    Ok(())
}

#[test]
fn scenario_b_stale_backup_is_updated() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("dir/b.txt"), b"the newer and longer body", T2)?;
    write_at(&backup.path().join("dir/b.txt"), b"old body", T1)?;

    let report = mirror(source.path(), backup.path())?;

    assert_eq!(report.updated(), entries(&["dir/b.txt"]).as_slice());
    assert_eq!(report.total_bytes_added(), 25 - 8);
    assert!(report.transferred().is_empty());

    let copied = fs::metadata(backup.path().join("dir/b.txt"))?;
    assert_eq!(
        FileTime::from_last_modification_time(&copied),
        FileTime::from_unix_time(T2, 0)
    );
    Ok(())
}

#[test]
fn scenario_c_equal_timestamps_are_skipped() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("c.txt"), b"source side", T1)?;
    write_at(&backup.path().join("c.txt"), b"backup", T1)?;

    let report = mirror(source.path(), backup.path())?;

    assert_eq!(report.skipped(), entries(&["c.txt"]).as_slice());
    assert_eq!(report.total_bytes_added(), 0);
    assert_eq!(fs::read(backup.path().join("c.txt"))?, b"backup");
    Ok(())
}

#[test]
fn scenario_d_uncreatable_directory_fails_its_files() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("locked/a.txt"), b"a", T1)?;
    write_at(&source.path().join("locked/sub/b.txt"), b"b", T1)?;
    write_at(&source.path().join("free.txt"), b"f", T1)?;
    fs::write(backup.path().join("locked"), b"a file blocking the directory")?;

    let report = mirror(source.path(), backup.path())?;

    for path in ["locked/a.txt", "locked/sub/b.txt"] {
        let entry = RelativeEntry::new(path);
        assert_eq!(report.category_of(&entry), Some(Category::Failed), "{path}");
    }
    assert!(report
        .failed()
        .iter()
        .all(|f| f.kind == FailureKind::DirectoryCreation));
    assert_eq!(report.transferred(), entries(&["free.txt"]).as_slice());
    Ok(())
}

#[test]
fn p1_classification() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("absent.txt"), b"1", T2)?;
    write_at(&source.path().join("older.txt"), b"2", T2)?;
    write_at(&backup.path().join("older.txt"), b"2", T1)?;
    write_at(&source.path().join("equal.txt"), b"3", T2)?;
    write_at(&backup.path().join("equal.txt"), b"3", T2)?;
    write_at(&source.path().join("newer.txt"), b"4", T1)?;
    write_at(&backup.path().join("newer.txt"), b"4 edited in backup", T2)?;

    let report = mirror(source.path(), backup.path())?;

    assert_eq!(sorted(report.transferred()), vec!["absent.txt"]);
    assert_eq!(sorted(report.updated()), vec!["older.txt"]);
    assert_eq!(sorted(report.skipped()), vec!["equal.txt", "newer.txt"]);
    assert_eq!(fs::read(backup.path().join("newer.txt"))?, b"4 edited in backup");
    Ok(())
}

#[test]
fn p2_second_run_is_idempotent() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("a.txt"), b"alpha", T1)?;
    write_at(&source.path().join("nested/deep/b.txt"), b"beta", T2)?;
    write_at(&source.path().join("nested/c.txt"), b"gamma", T2)?;
    fs::create_dir_all(source.path().join("empty/dir"))?;

    let first = mirror(source.path(), backup.path())?;
    assert_eq!(first.transferred().len(), 3);
    assert!(first.is_clean());

    let second = mirror(source.path(), backup.path())?;
    assert!(second.transferred().is_empty());
    assert!(second.updated().is_empty());
    assert!(second.created_directories().is_empty());
    assert_eq!(second.total_bytes_added(), 0);
    assert_eq!(
        sorted(second.skipped()),
        vec!["a.txt", "nested/c.txt", "nested/deep/b.txt"]
    );
    Ok(())
}

#[test]
fn p3_accounting_for_creates_and_updates() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("one.bin"), &[0; 300], T1)?;
    write_at(&source.path().join("two.bin"), &[0; 1200], T1)?;

    let created = mirror(source.path(), backup.path())?;
    assert_eq!(created.total_bytes_added(), 1500);
    assert_eq!(created.bytes_copied(), 1500);

    write_at(&source.path().join("one.bin"), &[1; 100], T2)?;
    write_at(&source.path().join("two.bin"), &[1; 1300], T2)?;

    let updated = mirror(source.path(), backup.path())?;
    assert_eq!(updated.updated().len(), 2);
    assert_eq!(updated.total_bytes_added(), (100 - 300) + (1300 - 1200));
    assert_eq!(updated.bytes_copied(), 1400);
    Ok(())
}

#[test]
fn p4_every_file_lands_in_exactly_one_list() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("x.txt"), b"x", T2)?;
    write_at(&source.path().join("d/y.txt"), b"y", T2)?;
    write_at(&backup.path().join("d/y.txt"), b"old", T1)?;
    write_at(&source.path().join("d/z.txt"), b"z", T1)?;
    write_at(&backup.path().join("d/z.txt"), b"z", T1)?;
    write_at(&source.path().join("blocked/w.txt"), b"w", T1)?;
    fs::write(backup.path().join("blocked"), b"")?;

    let report = mirror(source.path(), backup.path())?;

    let source_files = ["x.txt", "d/y.txt", "d/z.txt", "blocked/w.txt"];
    let mut seen = HashSet::new();
    for category in [
        Category::Transferred,
        Category::Updated,
        Category::Skipped,
        Category::Failed,
    ] {
        for entry in report.entries(category) {
            assert!(seen.insert(entry.to_string()), "{entry} listed twice");
        }
    }
    let mut expected: HashSet<String> = source_files.iter().map(|s| s.to_string()).collect();
    // The uncreatable directory is reported next to its files
    expected.insert("blocked".to_string());
    assert_eq!(seen, expected);
    Ok(())
}

#[test]
fn p5_source_only_directory_is_shadowed_once() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("photos/2024/a.jpg"), b"a", T1)?;
    write_at(&source.path().join("photos/b.jpg"), b"b", T1)?;

    let report = mirror(source.path(), backup.path())?;

    let created: Vec<String> = report.created_directories().iter().map(|e| e.to_string()).collect();
    assert_eq!(created, vec!["photos", "photos/2024"]);
    assert_eq!(sorted(report.transferred()), vec!["photos/2024/a.jpg", "photos/b.jpg"]);
    assert_eq!(
        report.tree(Category::CreatedDirectories).render(),
        "photos/\n  2024\n"
    );
    Ok(())
}

#[test]
#[cfg(unix)]
fn unreadable_source_directory_is_recorded_not_fatal() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("private/secret.txt"), b"s", T1)?;
    write_at(&source.path().join("public.txt"), b"p", T1)?;

    let private = source.path().join("private");
    fs::set_permissions(&private, fs::Permissions::from_mode(0o000))?;
    let bypassed = fs::read_dir(&private).is_ok();
    let result = mirror(source.path(), backup.path());
    fs::set_permissions(&private, fs::Permissions::from_mode(0o755))?;
    let report = result?;

    assert_eq!(report.transferred().first(), Some(&RelativeEntry::new("public.txt")));
    if !bypassed {
        let failure = &report.failed()[0];
        assert_eq!(failure.entry, RelativeEntry::new("private"));
        assert_eq!(failure.kind, FailureKind::Enumeration);
    }
    Ok(())
}

#[test]
#[cfg(unix)]
fn dangling_link_fails_alone() -> anyhow::Result<()> {
    use std::os::unix::fs::symlink;

    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    write_at(&source.path().join("a.txt"), b"a", T1)?;
    write_at(&source.path().join("sub/b.txt"), b"b", T1)?;
    symlink(source.path().join("nowhere"), source.path().join("dangling"))?;

    let report = mirror(source.path(), backup.path())?;

    let failed: Vec<(String, FailureKind)> = report
        .failed()
        .iter()
        .map(|f| (f.entry.to_string(), f.kind))
        .collect();
    assert_eq!(failed, vec![("dangling".to_string(), FailureKind::Enumeration)]);
    assert_eq!(sorted(report.transferred()), vec!["a.txt", "sub/b.txt"]);
    assert!(!backup.path().join("dangling").exists());
    Ok(())
}

#[test]
#[cfg(unix)]
fn linked_backup_directory_is_not_reported_created() -> anyhow::Result<()> {
    use std::os::unix::fs::symlink;

    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    let elsewhere = TempDir::new()?;
    write_at(&source.path().join("media/clip.mov"), b"m", T1)?;
    symlink(elsewhere.path(), backup.path().join("media"))?;

    let report = mirror(source.path(), backup.path())?;

    assert!(report.created_directories().is_empty());
    assert_eq!(report.transferred(), entries(&["media/clip.mov"]).as_slice());
    assert_eq!(fs::read(elsewhere.path().join("clip.mov"))?, b"m");
    Ok(())
}

#[test]
#[cfg(unix)]
fn unreadable_backup_directory_is_not_reported_created() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let source = TempDir::new()?;
    let backup = TempDir::new()?;
    fs::create_dir(source.path().join("x"))?;
    let sealed = backup.path().join("x");
    fs::create_dir(&sealed)?;
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000))?;

    let result = mirror(source.path(), backup.path());
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755))?;
    let report = result?;

    assert!(report.created_directories().is_empty());
    Ok(())
}
