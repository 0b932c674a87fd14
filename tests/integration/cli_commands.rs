//! CLI route table against real roots

use super::test_utils::with_xdg_env;
use std::fs;
use tempfile::TempDir;
use vellum::cli::{map_error, Commands, RunContext};

#[test]
fn test_sync_rm_flush() {
    let test_dir = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("n.md"), "hello").unwrap();

    with_xdg_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();

        let output = ctx.execute(&Commands::Sync { format: "json".into() }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["passes"][0]["outcomes"]["n.md"]["outcome"], "imported");
        assert_eq!(value["passes"][1]["outcomes"]["n.md"]["outcome"], "unchanged");

        let output = ctx
            .execute(&Commands::Rm {
                path: "n.md".to_string(),
            })
            .unwrap();
        assert!(output.contains("Tombstoned n.md"));

        let output = ctx.execute(&Commands::Flush { format: "text".into() }).unwrap();
        assert!(output.contains("deleted      n.md"));
        assert!(!root.path().join("n.md").exists());

        let output = ctx.execute(&Commands::Ledger { format: "text".into() }).unwrap();
        assert_eq!(output, "Ledger is empty");
    });
}

#[test]
fn test_rm_accepts_unnormalized_path() {
    let test_dir = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("notes")).unwrap();
    fs::write(root.path().join("notes/n.md"), "hello").unwrap();

    with_xdg_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();
        ctx.execute(&Commands::Scan { format: "text".into() }).unwrap();

        let output = ctx
            .execute(&Commands::Rm {
                path: "./notes//n.md".to_string(),
            })
            .unwrap();
        assert!(output.contains("Tombstoned notes/n.md;"));

        ctx.execute(&Commands::Flush { format: "text".into() }).unwrap();
        assert!(!root.path().join("notes/n.md").exists());
    });
}

#[test]
fn test_rm_unknown_path_reports_not_found() {
    let test_dir = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();

    with_xdg_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();
        let err = ctx
            .execute(&Commands::Rm {
                path: "ghost.md".to_string(),
            })
            .unwrap_err();
        assert_eq!(map_error(&err), "No entry for 'ghost.md' in the document");
    });
}

#[test]
fn test_export_then_merge_into_second_root() {
    let test_dir = TempDir::new().unwrap();
    let laptop = TempDir::new().unwrap();
    let desktop = TempDir::new().unwrap();
    let snapshot = test_dir.path().join("snapshot.json");
    fs::create_dir_all(laptop.path().join("notes")).unwrap();
    fs::write(laptop.path().join("notes/todo.md"), "- [ ] ship").unwrap();

    with_xdg_env(&test_dir, || {
        let source = RunContext::new(laptop.path().to_path_buf(), None).unwrap();
        source.execute(&Commands::Scan { format: "text".into() }).unwrap();
        let output = source
            .execute(&Commands::Export {
                out: snapshot.clone(),
            })
            .unwrap();
        assert!(output.starts_with("Exported 1 entries"));

        let target = RunContext::new(desktop.path().to_path_buf(), None).unwrap();
        let output = target
            .execute(&Commands::Merge {
                input: snapshot.clone(),
                no_flush: false,
                format: "json".into(),
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["merge"]["changed"][0], "notes/todo.md");
        assert_eq!(value["flush"]["outcomes"]["notes/todo.md"]["outcome"], "written");
        assert_eq!(
            fs::read_to_string(desktop.path().join("notes/todo.md")).unwrap(),
            "- [ ] ship"
        );
    });
}

#[test]
fn test_status_and_bad_format() {
    let test_dir = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();

    with_xdg_env(&test_dir, || {
        let ctx = RunContext::new(root.path().to_path_buf(), None).unwrap();
        let output = ctx.execute(&Commands::Status { format: "json".into() }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["tracked"], 0);
        assert_eq!(value["ledger_degraded"], false);

        assert!(ctx
            .execute(&Commands::Status { format: "yaml".into() })
            .is_err());
    });
}
