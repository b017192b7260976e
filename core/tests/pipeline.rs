use chrono::{DateTime, Local, TimeZone};
use code2md_core::config::INDEX_FILENAME;
use code2md_core::{AppError, Config, ProjectError, run_at, run_single};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn fixed_time() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
}

fn config_for(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.code_base_dir = root.join("Code");
    config.paths.markdown_base_dir = root.join("Markdown");
    config
}

fn write_file(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn read_doc(root: &Path, stem: &str) -> String {
    fs::read_to_string(root.join("Markdown").join(format!("{stem}.md"))).unwrap()
}

#[test]
fn converts_project_with_ignored_directory() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/Foo/a.c"), &[b'a'; 50]);
    write_file(&root.join("Code/Foo/b.h"), &[b'b'; 30]);
    write_file(&root.join("Code/Foo/ignored/tmp.o"), &[b'z'; 10_000]);

    let mut config = config_for(root);
    config.ignore.dirs.push("ignored/".to_string());
    config.output.max_file_size = 1024;

    let report = run_at(&config, fixed_time()).unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);

    let doc = read_doc(root, "Foo");
    assert!(doc.starts_with("# Foo\n"));
    assert!(doc.contains("- **Generated**: 2024-03-15 10:30:00"));
    assert!(doc.contains(&format!("```c\n{}\n```", "a".repeat(50))));
    assert!(doc.contains(&format!("```c\n{}\n```", "b".repeat(30))));
    assert!(doc.contains("| Source | 1 | 50 | 50 B |"));
    assert!(doc.contains("| Header | 1 | 30 | 30 B |"));
    assert!(doc.contains("| **Total** | **2** | **80** | **80 B** |"));
    assert!(!doc.contains("ignored/"));
    assert!(!doc.contains("tmp.o"));
    assert!(!doc.contains("zzzz"));
}

#[test]
fn oversized_file_is_counted_but_not_embedded() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/Big/main.c"), b"int main(void) { return 0; }\n");
    write_file(&root.join("Code/Big/table.c"), &vec![b'q'; 2_000_000]);

    let config = config_for(root);
    assert_eq!(config.output.max_file_size, 1_048_576);
    run_at(&config, fixed_time()).unwrap();

    let doc = read_doc(root, "Big");
    assert!(doc.contains("### `table.c`"));
    assert!(doc.contains("> Content omitted: file too large (2000000 bytes, limit 1048576)."));
    assert!(!doc.contains("qqqqqqqq"));
    assert!(doc.contains("| Source | 2 | 2000029 |"));
    assert!(doc.contains("int main(void) { return 0; }"));
}

#[test]
fn empty_project_fails_without_stopping_the_batch() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/Alpha/main.c"), b"int x;\n");
    fs::create_dir_all(root.join("Code/Beta")).unwrap();

    let report = run_at(&config_for(root), fixed_time()).unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    let failure = report.failures().next().unwrap();
    assert!(matches!(failure, ProjectError::Empty { .. }));
    assert_eq!(failure.project_name(), "Beta");

    assert!(root.join("Markdown/Alpha.md").exists());
    assert!(!root.join("Markdown/Beta.md").exists());
    let index = fs::read_to_string(root.join("Markdown").join(INDEX_FILENAME)).unwrap();
    assert!(index.contains("- **Projects**: 1"));
    assert!(index.contains("[Alpha](Alpha.md)"));
    assert!(!index.contains("Beta"));
}

#[test]
fn identical_inputs_give_identical_output() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/Proj/src/z.c"), b"void z(void);\n");
    write_file(&root.join("Code/Proj/src/A.c"), b"void a(void);\n");
    write_file(&root.join("Code/Proj/inc/a.h"), b"#pragma once\n");
    write_file(&root.join("Code/Proj/Makefile"), b"all:\n\tcc src/*.c\n");
    let config = config_for(root);

    run_at(&config, fixed_time()).unwrap();
    let first_doc = read_doc(root, "Proj");
    let first_index = fs::read_to_string(root.join("Markdown").join(INDEX_FILENAME)).unwrap();

    run_at(&config, fixed_time()).unwrap();
    assert_eq!(read_doc(root, "Proj"), first_doc);
    assert_eq!(
        fs::read_to_string(root.join("Markdown").join(INDEX_FILENAME)).unwrap(),
        first_index
    );

    // Directories first, then case-insensitive name order.
    let inc = first_doc.find("├── inc/").unwrap();
    let src = first_doc.find("├── src/").unwrap();
    let makefile = first_doc.find("└── Makefile").unwrap();
    assert!(inc < src && src < makefile);
    assert!(first_doc.find("### `src/A.c`").unwrap() < first_doc.find("### `src/z.c`").unwrap());
    assert!(first_doc.contains("| Project metadata | 1 |"));
}

#[test]
fn vcs_directories_never_appear() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/Repo/main.py"), b"print(1)\n");
    write_file(&root.join("Code/Repo/.git/config"), b"[core]\n");
    write_file(&root.join("Code/Repo/__pycache__/main.cpython-311.pyc"), b"\x00\x01");

    run_at(&config_for(root), fixed_time()).unwrap();
    let doc = read_doc(root, "Repo");
    assert!(!doc.contains(".git"));
    assert!(!doc.contains("__pycache__"));
    assert!(doc.contains("```python\nprint(1)\n```"));
}

#[test]
fn binary_file_gets_exactly_one_placeholder() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/Fw/main.c"), b"int main(void);\n");
    write_file(&root.join("Code/Fw/boot.c"), b"void boot(void);\n");
    write_file(&root.join("Code/Fw/firmware.hex"), &[0x3a, 0x00, 0xff, 0x00, 0x10]);

    let report = run_at(&config_for(root), fixed_time()).unwrap();
    assert_eq!(report.succeeded(), 1);
    let doc = read_doc(root, "Fw");
    assert_eq!(doc.matches("Content omitted").count(), 1);
    assert!(doc.contains("### `firmware.hex`"));
    assert!(doc.contains("int main(void);"));
    assert!(doc.contains("void boot(void);"));
}

#[test]
fn dated_wrappers_and_colliding_names() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/20240101/Motor_20240101/m.c"), b"int m;\n");
    write_file(&root.join("Code/20240201/Motor_20240201/m.c"), b"int n;\n");
    write_file(&root.join("Code/Pump/p.c"), b"int p;\n");

    let report = run_at(&config_for(root), fixed_time()).unwrap();
    assert_eq!(report.succeeded(), 3);
    let outputs: Vec<String> = report
        .documents()
        .map(|d| d.index_entry.relative_output_path.clone())
        .collect();
    assert_eq!(outputs, vec!["Motor.md", "Motor_2.md", "Pump.md"]);
    assert!(read_doc(root, "Motor").contains("int m;"));
    assert!(read_doc(root, "Motor_2").contains("int n;"));
}

#[test]
fn single_project_mode_leaves_index_alone() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/Alpha/a.c"), b"int a;\n");
    write_file(&root.join("Code/Beta/b.c"), b"int b;\n");
    let config = config_for(root);

    let report = run_single(&config, "beta").unwrap();
    assert_eq!(report.succeeded(), 1);
    assert!(report.index_path.is_none());
    assert!(root.join("Markdown/Beta.md").exists());
    assert!(!root.join("Markdown/Alpha.md").exists());
    assert!(!root.join("Markdown").join(INDEX_FILENAME).exists());

    let err = run_single(&config, "gamma").unwrap_err();
    assert!(matches!(err, AppError::ProjectNotFound { .. }));
}

#[test]
fn timestamp_lines_can_be_disabled() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write_file(&root.join("Code/Alpha/a.c"), b"int a;\n");
    let mut config = config_for(root);
    config.output.include_timestamp = false;

    run_at(&config, fixed_time()).unwrap();
    assert!(!read_doc(root, "Alpha").contains("**Generated**"));
    let index = fs::read_to_string(root.join("Markdown").join(INDEX_FILENAME)).unwrap();
    assert!(!index.contains("**Generated**"));
}
