use std::fs;

use migrator_engine::{ensure_output_dir, ArtifactWriter, ExistingFilePolicy};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("downloads");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn writes_payload_under_suggested_name() {
    let temp = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(temp.path().join("out"));

    let path = writer.write("widget_migration.zip", &[0x50, 0x4B]).unwrap();
    assert_eq!(path.file_name().unwrap(), "widget_migration.zip");
    assert_eq!(fs::read(&path).unwrap(), vec![0x50, 0x4B]);
}

#[test]
fn replace_policy_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(temp.path().to_path_buf());

    let first = writer.write("widget_migration.zip", b"old").unwrap();
    let second = writer.write("widget_migration.zip", b"new").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"new");
}

#[test]
fn keep_both_policy_picks_numbered_name() {
    let temp = TempDir::new().unwrap();
    let writer =
        ArtifactWriter::new(temp.path().to_path_buf()).with_policy(ExistingFilePolicy::KeepBoth);

    let first = writer.write("widget_migration.zip", b"one").unwrap();
    let second = writer.write("widget_migration.zip", b"two").unwrap();

    assert_eq!(first.file_name().unwrap(), "widget_migration.zip");
    assert_eq!(second.file_name().unwrap(), "widget_migration (1).zip");
    assert_eq!(fs::read(&first).unwrap(), b"one");
    assert_eq!(fs::read(&second).unwrap(), b"two");
}

#[test]
fn keep_both_policy_skips_taken_names() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("widget_migration.zip"), b"kept").unwrap();
    fs::create_dir(temp.path().join("widget_migration (1).zip")).unwrap();
    let writer =
        ArtifactWriter::new(temp.path().to_path_buf()).with_policy(ExistingFilePolicy::KeepBoth);

    let path = writer.write("widget_migration.zip", b"fresh").unwrap();

    assert_eq!(path.file_name().unwrap(), "widget_migration (2).zip");
    assert_eq!(fs::read(&path).unwrap(), b"fresh");
    assert_eq!(fs::read(temp.path().join("widget_migration.zip")).unwrap(), b"kept");
    assert!(temp.path().join("widget_migration (1).zip").is_dir());
}

#[test]
fn failed_replace_leaves_existing_target_alone() {
    let temp = TempDir::new().unwrap();
    let occupied = temp.path().join("widget_migration.zip");
    fs::create_dir(&occupied).unwrap();
    fs::write(occupied.join("notes.txt"), b"keep me").unwrap();
    let writer = ArtifactWriter::new(temp.path().to_path_buf());

    assert!(writer.write("widget_migration.zip", b"new").is_err());

    assert_eq!(fs::read(occupied.join("notes.txt")).unwrap(), b"keep me");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn unsafe_suggested_name_is_sanitized() {
    let temp = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(temp.path().to_path_buf());

    let path = writer.write("w?x|y_migration.zip", b"PK").unwrap();
    assert_eq!(path.file_name().unwrap(), "w_x_y_migration.zip");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = ArtifactWriter::new(file_path.clone());
    let result = writer.write("widget_migration.zip", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("widget_migration.zip").exists());
}
