use pegasus_migrate::catalog::{builtin_plan, RuleCatalog, SubstitutionRule};
use pegasus_migrate::rewriter::{FileStatus, Migrator, PlanOutcome, RunMode};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn catalog(rules: &[(&str, &str)]) -> RuleCatalog {
    RuleCatalog::new(
        rules
            .iter()
            .map(|(pattern, replacement)| SubstitutionRule::new(pattern, *replacement).unwrap())
            .collect(),
    )
}

fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    PathBuf::from(rel)
}

/// Every file and backup under `root`, with contents, for byte-for-byte comparisons
fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut entries = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                entries.push((path.clone(), fs::read(&path).unwrap()));
            }
        }
    }
    entries.sort();
    entries
}

#[test]
fn test_world_import_example() {
    let temp = TempDir::new().unwrap();
    let file = write(
        temp.path(),
        "examples/0_template_app.py",
        "import carb\nfrom omni.isaac.core.world import World\n",
    );
    let rules = catalog(&[(
        r"from omni\.isaac\.core\.world import World",
        "from isaacsim.core.api.world import World",
    )]);

    let report = Migrator::new(temp.path()).migrate(&[file.clone()], &rules);

    assert_eq!(report.status_of(&file), Some(&FileStatus::Updated));
    assert_eq!(report.updated_count(), 1);
    assert_eq!(
        fs::read_to_string(temp.path().join(&file)).unwrap(),
        "import carb\nfrom isaacsim.core.api.world import World\n"
    );
    let backup = fs::read_to_string(temp.path().join("examples/0_template_app.py.bak")).unwrap();
    assert!(backup.contains("from omni.isaac.core.world import World"));
}

#[test]
fn test_second_run_is_unchanged() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "vehicle.py", "from omni.isaac.dynamic_control import _dynamic_control\n");
    let rules = catalog(&[(
        r"from omni\.isaac\.dynamic_control import",
        "from isaacsim.core.dynamic_control import",
    )]);
    let migrator = Migrator::new(temp.path());

    let first = migrator.migrate(&[file.clone()], &rules);
    let after_first = fs::read_to_string(temp.path().join(&file)).unwrap();
    let second = migrator.migrate(&[file.clone()], &rules);
    let after_second = fs::read_to_string(temp.path().join(&file)).unwrap();

    assert_eq!(first.status_of(&file), Some(&FileStatus::Updated));
    assert_eq!(second.status_of(&file), Some(&FileStatus::Unchanged));
    assert_eq!(after_first, after_second);
}

#[test]
fn test_backup_keeps_first_snapshot() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "multirotor.py", "v1: from omni.isaac.sensor import Camera\n");
    let rules = catalog(&[(r"from omni\.isaac\.sensor import Camera", "from isaacsim.sensors.camera import Camera")]);
    let migrator = Migrator::new(temp.path());

    migrator.migrate(&[file.clone()], &rules);

    // Someone edits the file between runs
    fs::write(temp.path().join(&file), "v2: from omni.isaac.sensor import Camera\n").unwrap();
    let second = migrator.migrate(&[file.clone()], &rules);

    assert_eq!(second.outcomes[0].backup, None);
    assert_eq!(
        fs::read_to_string(temp.path().join("multirotor.py.bak")).unwrap(),
        "v1: from omni.isaac.sensor import Camera\n"
    );
}

#[test]
fn test_missing_file_does_not_stop_the_run() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.py", "old\n");
    let b = write(temp.path(), "b.py", "nothing here\n");
    let missing = PathBuf::from("examples/9_people.py");
    let rules = catalog(&[("old", "new")]);

    let report = Migrator::new(temp.path()).migrate(&[a.clone(), missing.clone(), b.clone()], &rules);

    let statuses: Vec<&FileStatus> = report.outcomes.iter().map(|o| &o.status).collect();
    assert_eq!(
        statuses,
        vec![&FileStatus::Updated, &FileStatus::Missing, &FileStatus::Unchanged]
    );
    assert_eq!(report.outcomes[1].path, missing);
    assert!(!report.has_errors());
    assert_eq!(report.counts.missing, 1);
}

#[test]
fn test_rules_apply_in_order() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "order.txt", "A\n");

    let report = Migrator::new(temp.path())
        .backup(false)
        .migrate(&[file.clone()], &catalog(&[("A", "B"), ("B", "C")]));

    assert_eq!(report.status_of(&file), Some(&FileStatus::Updated));
    assert_eq!(fs::read_to_string(temp.path().join(&file)).unwrap(), "C\n");
}

#[test]
fn test_dry_run_leaves_tree_untouched() {
    let temp = TempDir::new().unwrap();
    let files = vec![
        write(temp.path(), "a.py", "from omni.isaac.core import World\n"),
        write(temp.path(), "b.py", "import numpy\n"),
        PathBuf::from("gone.py"),
    ];
    fs::write(temp.path().join("b.py.bak"), "older snapshot").unwrap();
    let rules = catalog(&[(r"from omni\.isaac\.core import World", "from isaacsim.core.api import World")]);

    let before = snapshot(temp.path());
    let preview = Migrator::new(temp.path()).mode(RunMode::DryRun).migrate(&files, &rules);
    assert_eq!(snapshot(temp.path()), before);

    let applied = Migrator::new(temp.path()).migrate(&files, &rules);
    let preview_statuses: Vec<_> = preview.outcomes.iter().map(|o| o.status.clone()).collect();
    let applied_statuses: Vec<_> = applied.outcomes.iter().map(|o| o.status.clone()).collect();
    assert_eq!(preview_statuses, applied_statuses);
}

#[test]
fn test_no_backup_writes_only_the_target() {
    let temp = TempDir::new().unwrap();
    let file = write(temp.path(), "person.py", "from omni.isaac.core.objects import VisualCuboid\n");
    let rules = catalog(&[(r"from omni\.isaac\.core\.objects import", "from isaacsim.core.api.objects import")]);

    let report = Migrator::new(temp.path()).backup(false).migrate(&[file.clone()], &rules);

    assert_eq!(report.status_of(&file), Some(&FileStatus::Updated));
    assert!(!temp.path().join("person.py.bak").exists());
}

#[cfg(unix)]
#[test]
fn test_unwritable_file_is_reported_and_left_alone() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let locked = write(temp.path(), "locked.py", "old\n");
    let open = write(temp.path(), "open.py", "old\n");
    let locked_path = temp.path().join(&locked);
    fs::set_permissions(&locked_path, fs::Permissions::from_mode(0o444)).unwrap();

    // Root ignores permission bits; nothing to observe in that case
    if fs::OpenOptions::new().write(true).open(&locked_path).is_ok() {
        return;
    }

    let report = Migrator::new(temp.path())
        .backup(false)
        .migrate(&[locked.clone(), open.clone()], &catalog(&[("old", "new")]));

    match report.status_of(&locked) {
        Some(FileStatus::Error { reason }) => assert!(reason.contains("Failed to write file")),
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(report.status_of(&open), Some(&FileStatus::Updated));
    assert_eq!(fs::read_to_string(&locked_path).unwrap(), "old\n");
    assert!(report.has_errors());
}

#[test]
fn test_two_plans_use_separate_backups() {
    let temp = TempDir::new().unwrap();
    let vehicle = "extensions/pegasus.simulator/pegasus/simulator/logic/vehicles/vehicle.py";
    let original = "from omni.isaac.dynamic_control import _dynamic_control\n";
    write(temp.path(), vehicle, original);

    let migrator = Migrator::new(temp.path());
    let fix = migrator.run_plan(&builtin_plan("ardupilot").unwrap().unwrap()).unwrap();
    let general = migrator.run_plan(&builtin_plan("general").unwrap().unwrap()).unwrap();

    assert_eq!(fix.counts.updated, 1);
    assert_eq!(fix.counts.missing, 1);
    assert_eq!(general.sections[0].report.status_of(vehicle), Some(&FileStatus::Unchanged));

    let vehicle_path = temp.path().join(vehicle);
    let first_backup = fs::read_to_string(format!("{}.ardupilot_backup", vehicle_path.display())).unwrap();
    let second_backup = fs::read_to_string(format!("{}.bak", vehicle_path.display())).unwrap();
    assert_eq!(first_backup, original);
    assert_eq!(second_backup, "from isaacsim.core.dynamic_control import _dynamic_control\n");
}

#[test]
fn test_run_with_only_missing_files_succeeds() {
    let temp = TempDir::new().unwrap();

    let run = Migrator::new(temp.path()).run_plans(&["general".to_string()], &BTreeMap::new());

    match &run.plans[..] {
        [PlanOutcome::Completed(report)] => {
            let listed = builtin_plan("general").unwrap().unwrap().file_count();
            assert_eq!(report.counts.missing, listed);
            assert_eq!(report.counts.updated + report.counts.unchanged + report.counts.error, 0);
        }
        other => panic!("expected one completed plan, got {:?}", other),
    }
    assert!(run.is_success());
}

#[test]
fn test_run_with_file_error_fails() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "ok.py", "old\n");
    fs::create_dir(temp.path().join("not_a_file.py")).unwrap();

    let plan_path = temp.path().join("custom.toml");
    fs::write(
        &plan_path,
        r#"
        name = "custom"

        [[sections]]
        label = "Python files"
        files = ["ok.py", "not_a_file.py"]

        [[sections.rules]]
        pattern = "old"
        replacement = "new"
        "#,
    )
    .unwrap();
    let mut named = BTreeMap::new();
    named.insert("custom".to_string(), plan_path);

    let run = Migrator::new(temp.path()).backup(false).run_plans(&["custom".to_string()], &named);

    let PlanOutcome::Completed(report) = &run.plans[0] else {
        panic!("expected completed plan, got {:?}", run.plans[0]);
    };
    let section = &report.sections[0].report;
    assert_eq!(section.status_of("ok.py"), Some(&FileStatus::Updated));
    assert!(matches!(section.status_of("not_a_file.py"), Some(FileStatus::Error { .. })));
    assert!(!run.is_success());
}

#[test]
fn test_missing_required_dir_fails_and_later_plans_still_run() {
    let temp = TempDir::new().unwrap();

    let run = Migrator::new(temp.path())
        .mode(RunMode::DryRun)
        .run_plans(&["ardupilot".to_string(), "general".to_string()], &BTreeMap::new());

    assert_eq!(run.plans.len(), 2);
    match &run.plans[0] {
        PlanOutcome::Failed { plan, error } => {
            assert_eq!(plan, "ardupilot");
            assert!(error.contains("pegasus.simulator"));
        }
        other => panic!("expected failed plan, got {:?}", other),
    }
    assert!(matches!(run.plans[1], PlanOutcome::Completed(_)));
    assert!(!run.is_success());
}

#[test]
fn test_unknown_plan_fails_the_run() {
    let temp = TempDir::new().unwrap();

    let run = Migrator::new(temp.path()).run_plans(&["isaac-5".to_string()], &BTreeMap::new());

    assert!(matches!(&run.plans[0], PlanOutcome::Failed { plan, .. } if plan == "isaac-5"));
    assert!(!run.is_success());
}
