use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::tempdir;
use treeskel_pipeline::{ChannelSink, MessageLog, ProgressMessage, Replicator, RunState};

fn utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
}

/// `a/x.txt` and `a/b/y.txt`, both with content.
fn sample_source(root: &Utf8Path) -> Utf8PathBuf {
    let src = root.join("src");
    fs::create_dir_all(src.join("a/b")).unwrap();
    fs::write(src.join("a/x.txt"), b"hello").unwrap();
    fs::write(src.join("a/b/y.txt"), b"world").unwrap();
    src
}

fn len(path: &Utf8Path) -> u64 {
    fs::metadata(path).unwrap().len()
}

#[test]
fn builds_the_documented_example() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = sample_source(&root);
    let dst = root.join("out");
    fs::create_dir(&dst).unwrap();

    let messages: Vec<ProgressMessage> = Replicator::run(&src, &dst).collect();

    assert!(dst.join("a").is_dir());
    assert!(dst.join("a/b").is_dir());
    assert_eq!(len(&dst.join("a/x.txt")), 0);
    assert_eq!(len(&dst.join("a/b/y.txt")), 0);
    // Source is untouched.
    assert_eq!(fs::read(src.join("a/x.txt")).unwrap(), b"hello");

    assert_eq!(
        messages,
        vec![
            ProgressMessage::Started {
                source: src.clone(),
                target: dst.clone(),
            },
            ProgressMessage::DirectoryCreated {
                path: dst.join("a")
            },
            ProgressMessage::FileCreated {
                path: dst.join("a/x.txt")
            },
            ProgressMessage::DirectoryCreated {
                path: dst.join("a/b")
            },
            ProgressMessage::FileCreated {
                path: dst.join("a/b/y.txt")
            },
            ProgressMessage::Completed,
        ]
    );
}

#[test]
fn missing_target_is_created_first() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = sample_source(&root);
    let dst = root.join("deep/nested/out");

    let mut replication = Replicator::run(&src, &dst);
    assert_eq!(replication.state(), RunState::Idle);
    assert!(!dst.exists(), "nothing happens before the first poll");

    assert!(matches!(
        replication.next(),
        Some(ProgressMessage::Started { .. })
    ));
    assert_eq!(replication.state(), RunState::Running);
    assert_eq!(
        replication.next(),
        Some(ProgressMessage::TargetCreated { path: dst.clone() })
    );

    let rest: Vec<_> = replication.by_ref().collect();
    assert_eq!(rest.last(), Some(&ProgressMessage::Completed));
    assert_eq!(replication.state(), RunState::Completed);
    assert_eq!(replication.stats().dirs_created, 3);
    assert_eq!(replication.stats().files_created, 2);
    assert_eq!(replication.stats().failures, 0);
    assert_eq!(replication.next(), None);
}

#[test]
fn mirrors_every_directory_including_empty_ones() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = root.join("src");
    for d in ["empty", "one/two/three", "one/sibling"] {
        fs::create_dir_all(src.join(d)).unwrap();
    }
    for f in ["top.bin", "one/two/three/leaf.rs", "one/sibling/.hidden"] {
        fs::write(src.join(f), vec![7u8; 4096]).unwrap();
    }
    let dst = root.join("out");

    let mut log = MessageLog::new();
    let report = Replicator::run(&src, &dst).drain_into(&mut log);
    assert!(report.is_completed());

    for d in ["empty", "one", "one/two", "one/two/three", "one/sibling"] {
        assert!(dst.join(d).is_dir(), "{d} should be a directory");
    }
    for f in ["top.bin", "one/two/three/leaf.rs", "one/sibling/.hidden"] {
        assert_eq!(len(&dst.join(f)), 0, "{f} should be an empty placeholder");
    }
    assert_eq!(report.stats.files_created, 3);
    // The target root plus five subdirectories.
    assert_eq!(report.stats.dirs_created, 6);
    assert_eq!(
        log.lines().last().map(String::as_str),
        Some("Directory structure copy process completed!")
    );
}

#[test]
fn aborts_on_first_existing_file_and_stops_there() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = sample_source(&root);
    let dst = root.join("out");
    fs::create_dir_all(dst.join("a")).unwrap();
    fs::write(dst.join("a/x.txt"), b"precious").unwrap();

    let mut log = MessageLog::new();
    let report = Replicator::run(&src, &dst).drain_into(&mut log);

    assert_eq!(report.state, RunState::AbortedOnConflict);
    assert_eq!(
        log.last(),
        Some(&ProgressMessage::Aborted {
            path: dst.join("a/x.txt")
        })
    );
    assert_eq!(
        log.lines().last().unwrap(),
        &format!(
            "File {} already exists. Operation aborted to avoid overwriting.",
            dst.join("a/x.txt")
        )
    );
    // Nothing after x.txt was processed and the file kept its content.
    assert!(!dst.join("a/b").exists());
    assert_eq!(fs::read(dst.join("a/x.txt")).unwrap(), b"precious");
}

#[test]
fn second_run_never_overwrites() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = sample_source(&root);
    let dst = root.join("out");

    let first = Replicator::run(&src, &dst).drain_into(&mut MessageLog::new());
    assert!(first.is_completed());

    let mut log = MessageLog::new();
    let second = Replicator::run(&src, &dst).drain_into(&mut log);
    assert_eq!(second.state, RunState::AbortedOnConflict);
    assert_eq!(second.stats.files_created, 0);
    assert!(log
        .messages
        .iter()
        .all(|m| !matches!(m, ProgressMessage::FileCreated { .. })));
    assert!(matches!(log.last(), Some(ProgressMessage::Aborted { .. })));
}

#[test]
fn creation_failures_are_reported_and_skipped() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = root.join("src");
    fs::create_dir_all(src.join("blocked/inner")).unwrap();
    fs::write(src.join("blocked/f.txt"), b"").unwrap();
    fs::create_dir_all(src.join("open")).unwrap();
    fs::write(src.join("open/g.txt"), b"").unwrap();

    // A plain file where the `blocked` directory should go.
    let dst = root.join("out");
    fs::create_dir(&dst).unwrap();
    fs::write(dst.join("blocked"), b"in the way").unwrap();

    let mut log = MessageLog::new();
    let report = Replicator::run(&src, &dst).drain_into(&mut log);

    assert!(report.is_completed(), "per-item failures are not fatal");
    assert_eq!(report.stats.failures, 2);
    assert!(log.messages.iter().any(|m| matches!(
        m,
        ProgressMessage::FileCreateFailed { path, .. } if *path == dst.join("blocked/f.txt")
    )));
    assert!(log.messages.iter().any(|m| matches!(
        m,
        ProgressMessage::DirectoryCreateFailed { path, .. } if *path == dst.join("blocked/inner")
    )));
    // The healthy branch is still mirrored.
    assert_eq!(len(&dst.join("open/g.txt")), 0);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_reported_not_entered() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = sample_source(&root);
    let outside = root.join("outside");
    fs::create_dir_all(outside.join("secret")).unwrap();
    fs::write(outside.join("secret/key.pem"), b"").unwrap();
    std::os::unix::fs::symlink(&outside, src.join("a/escape")).unwrap();
    // A loop back to the root must not recurse either.
    std::os::unix::fs::symlink(&src, src.join("a/b/loop")).unwrap();

    let dst = root.join("out");
    let mut log = MessageLog::new();
    let report = Replicator::run(&src, &dst).drain_into(&mut log);

    assert!(report.is_completed());
    assert_eq!(report.stats.symlinks_skipped, 2);
    assert!(log.messages.contains(&ProgressMessage::SymlinkSkipped {
        path: src.join("a/escape")
    }));
    assert!(!dst.join("a/escape").exists());
    assert!(!dst.join("a/b/loop").exists());
    assert!(log
        .lines()
        .iter()
        .all(|line| !line.contains("secret") && !line.contains("key.pem")));
}

#[cfg(unix)]
#[test]
fn links_to_files_become_placeholders() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = sample_source(&root);
    std::os::unix::fs::symlink(src.join("a/x.txt"), src.join("a/alias.txt")).unwrap();
    std::os::unix::fs::symlink(root.join("nowhere"), src.join("a/dangling")).unwrap();

    let dst = root.join("out");
    let report = Replicator::run(&src, &dst).drain_into(&mut MessageLog::new());

    assert!(report.is_completed());
    for name in ["a/alias.txt", "a/dangling"] {
        let meta = fs::symlink_metadata(dst.join(name)).unwrap();
        assert!(meta.file_type().is_file(), "{name} should be a regular file");
        assert_eq!(meta.len(), 0);
    }
}

#[test]
fn closures_and_channels_work_as_sinks() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = sample_source(&root);
    let first = root.join("out1");

    let mut lines = Vec::new();
    let mut sink = |m: &ProgressMessage| lines.push(m.to_string());
    Replicator::run(&src, &first).drain_into(&mut sink);
    assert_eq!(
        lines.first().unwrap(),
        &format!("Starting copy process from {src} to {first}")
    );
    assert_eq!(lines[1], format!("Created target directory: {first}"));

    let (tx, rx) = std::sync::mpsc::channel();
    let report = Replicator::run(&src, root.join("out2")).drain_into(&mut ChannelSink(tx));
    let received: Vec<ProgressMessage> = rx.try_iter().collect();
    assert!(report.is_completed());
    // Started, target, a, a/x.txt, a/b, a/b/y.txt, completion.
    assert_eq!(received.len(), 7);
    assert_eq!(received.last(), Some(&ProgressMessage::Completed));
}

#[test]
fn unreachable_target_root_is_reported_once() {
    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = sample_source(&root);
    fs::write(root.join("blocker"), b"a file, not a directory").unwrap();
    let dst = root.join("blocker/out");

    let mut log = MessageLog::new();
    let report = Replicator::run(&src, &dst).drain_into(&mut log);

    assert!(report.is_completed(), "per-item failures are not fatal");
    let root_failures = log
        .messages
        .iter()
        .filter(|m| matches!(m, ProgressMessage::DirectoryCreateFailed { path, .. } if *path == dst))
        .count();
    assert_eq!(root_failures, 1);
    // The target root, then a, a/x.txt, a/b and a/b/y.txt.
    assert_eq!(report.stats.failures, 5);
    assert_eq!(report.stats.dirs_created, 0);
}

#[cfg(unix)]
#[test]
fn non_utf8_directory_is_reported_and_not_entered() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let root = utf8(dir.path());
    let src = root.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("good.txt"), b"").unwrap();
    let bad = src.as_std_path().join(OsStr::from_bytes(b"bad\xff"));
    fs::create_dir(&bad).unwrap();
    fs::write(bad.join("inner.txt"), b"hidden").unwrap();

    let dst = root.join("out");
    let mut log = MessageLog::new();
    let report = Replicator::run(&src, &dst).drain_into(&mut log);

    let read_failures: Vec<_> = log
        .messages
        .iter()
        .filter(|m| matches!(m, ProgressMessage::ReadFailed { .. }))
        .collect();
    assert_eq!(read_failures.len(), 1);
    assert_eq!(report.stats.failures, 1);

    assert_eq!(len(&dst.join("good.txt")), 0);
    let mirrored: Vec<_> = fs::read_dir(&dst)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(mirrored, vec![OsStr::new("good.txt").to_os_string()]);

    assert!(report.is_completed());
    assert_eq!(log.last(), Some(&ProgressMessage::Completed));
}
