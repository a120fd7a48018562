use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use ers_core::backups::{BackupStore, parse_backup_timestamp};
use ers_core::config::{Config, TIMESTAMPED_DIR};
use ers_core::guard::listing_mentions_game;
use ers_core::slots::{SlotStore, strip_slot_prefix};
use ers_core::{SwapError, matches_config_file, matches_save_bundle};

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn write(p: &Path, data: &[u8]) -> PathBuf {
    fs::write(p, data).unwrap();
    p.to_path_buf()
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut v: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    v.sort();
    v
}

#[test]
fn matcher_accepts_save_and_companion_only() {
    assert!(matches_save_bundle("ER0000.sl2"));
    assert!(matches_save_bundle("ER0000.sl2.bak"));
    assert!(matches_save_bundle("ER0000_old.sl2"));
    assert!(!matches_save_bundle("ER0000.co2"));
    assert!(!matches_save_bundle("ER0000.bak"));
    assert!(!matches_save_bundle("A_ER0000.sl2"));
    assert!(!matches_save_bundle("steam_autocloud.vdf"));
    assert!(matches_config_file("steam_autocloud.vdf"));
    assert!(!matches_config_file("ER0000.sl2"));
}

#[test]
fn retention_keeps_three_most_recent() {
    let d = tempfile::tempdir().unwrap();
    let active = d.path().join("active");
    fs::create_dir_all(&active).unwrap();
    write(&active.join("ER0000.sl2"), b"save");
    let store = BackupStore::new(d.path().join("backups"));

    let times = [
        "2024-01-01 10:00:00",
        "2024-01-01 10:00:05",
        "2024-01-02 09:00:00",
        "2024-01-03 08:30:00",
        "2024-01-04 00:00:00",
    ];
    for (i, t) in times.iter().enumerate() {
        store.create_backup_at("A", &active, ts(t)).unwrap();
        store.prune("A").unwrap();
        let kept = store.list_backups("A").unwrap();
        assert_eq!(kept.len(), (i + 1).min(3));
    }
    let kept: Vec<String> = store.list_backups("A").unwrap().into_iter().map(|b| b.file_name).collect();
    assert_eq!(
        kept,
        vec![
            "A_2024-01-02_09-00-00_ER0000.sl2",
            "A_2024-01-03_08-30-00_ER0000.sl2",
            "A_2024-01-04_00-00-00_ER0000.sl2",
        ]
    );
}

#[test]
fn custom_retention_cap() {
    let d = tempfile::tempdir().unwrap();
    let active = d.path().join("active");
    fs::create_dir_all(&active).unwrap();
    write(&active.join("ER0000.sl2"), b"save");
    let store = BackupStore::new(d.path().join("backups")).with_keep(1);
    store.create_backup_at("A", &active, ts("2024-01-01 00:00:00")).unwrap();
    store.create_backup_at("A", &active, ts("2024-01-01 00:00:01")).unwrap();
    assert_eq!(store.prune("A").unwrap(), vec!["A_2024-01-01_00-00-00_ER0000.sl2".to_string()]);
}

#[test]
fn process_listing_match_is_case_insensitive() {
    assert!(listing_mentions_game("\"eldenring.exe\",\"1234\",\"Console\""));
    assert!(listing_mentions_game("systemd\nEASYANTICHEAT_EOS.EXE\n"));
    assert!(!listing_mentions_game("bash\nsteam\n"));
}

#[test]
fn process_listing_matches_truncated_and_full_command_lines() {
    assert!(listing_mentions_game("systemd\nstart_protected\n"));
    assert!(listing_mentions_game("  EasyAntiCheat_E\n"));
    assert!(listing_mentions_game(
        "Z:\\games\\ELDEN RING\\Game\\start_protected_game.exe --launch\n"
    ));
    assert!(!listing_mentions_game("start_protected_thing --x\n"));
}

#[test]
fn prune_ignores_other_slots_and_unparseable_names() {
    let d = tempfile::tempdir().unwrap();
    let dir = d.path().join("backups");
    fs::create_dir_all(&dir).unwrap();
    for n in [
        "A_2024-01-01_00-00-00_ER0000.sl2",
        "A_2024-01-02_00-00-00_ER0000.sl2",
        "A_2024-01-03_00-00-00_ER0000.sl2",
        "A_2024-01-04_00-00-00_ER0000.sl2",
        "A_notatime_ER0000.sl2",
        "A_B_2023-01-01_00-00-00_ER0000.sl2",
        "AB_2023-01-01_00-00-00_ER0000.sl2",
    ] {
        write(&dir.join(n), b"x");
    }
    let store = BackupStore::new(&dir);
    let removed = store.prune("A").unwrap();
    assert_eq!(removed, vec!["A_2024-01-01_00-00-00_ER0000.sl2".to_string()]);
    let left = names_in(&dir);
    assert!(left.contains(&"A_notatime_ER0000.sl2".to_string()));
    assert!(left.contains(&"A_B_2023-01-01_00-00-00_ER0000.sl2".to_string()));
    assert!(left.contains(&"AB_2023-01-01_00-00-00_ER0000.sl2".to_string()));
    assert_eq!(store.list_backups("A_B").unwrap().len(), 1);
}

#[test]
fn backup_copies_and_leaves_source() {
    let d = tempfile::tempdir().unwrap();
    let active = d.path().join("active");
    fs::create_dir_all(&active).unwrap();
    write(&active.join("ER0000.sl2"), b"save");
    write(&active.join("ER0000.sl2.bak"), b"bak");
    write(&active.join("steam_autocloud.vdf"), b"cfg");
    let store = BackupStore::new(d.path().join("backups"));
    let written = store.create_backup_at("Main", &active, ts("2024-05-06 07:08:09")).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(
        names_in(store.dir()),
        vec!["Main_2024-05-06_07-08-09_ER0000.sl2", "Main_2024-05-06_07-08-09_ER0000.sl2.bak"]
    );
    assert_eq!(fs::read(active.join("ER0000.sl2")).unwrap(), b"save");
    assert_eq!(
        parse_backup_timestamp("Main", "Main_2024-05-06_07-08-09_ER0000.sl2"),
        Some(ts("2024-05-06 07:08:09"))
    );
    assert_eq!(parse_backup_timestamp("Mai", "Main_2024-05-06_07-08-09_ER0000.sl2"), None);
}

#[test]
fn create_slot_is_idempotent() {
    let d = tempfile::tempdir().unwrap();
    let store = SlotStore::new(d.path());
    store.create_slot("Knight").unwrap();
    store.create_slot("Knight").unwrap();
    assert_eq!(store.list_slots().unwrap(), vec!["Knight".to_string()]);
}

#[test]
fn bundle_write_then_read_recovers_names() {
    let d = tempfile::tempdir().unwrap();
    let src = d.path().join("src");
    fs::create_dir_all(&src).unwrap();
    let files = vec![
        write(&src.join("ER0000.sl2"), b"one"),
        write(&src.join("ER0000.sl2.bak"), b"two"),
    ];
    let store = SlotStore::new(d.path().join("archive"));
    store.write_bundle_into_slot("Mage_Run", &files).unwrap();
    assert_eq!(
        names_in(&store.slot_dir("Mage_Run")),
        vec!["Mage_Run_ER0000.sl2", "Mage_Run_ER0000.sl2.bak"]
    );
    let mut back: Vec<String> = store
        .read_bundle_from_slot("Mage_Run")
        .unwrap()
        .into_iter()
        .map(|f| f.original_name)
        .collect();
    back.sort();
    assert_eq!(back, vec!["ER0000.sl2", "ER0000.sl2.bak"]);
}

#[test]
fn already_prefixed_source_is_not_prefixed_twice() {
    let d = tempfile::tempdir().unwrap();
    let src = write(&d.path().join("B_ER0000.sl2"), b"b");
    let store = SlotStore::new(d.path().join("archive"));
    store.write_bundle_into_slot("B", &[src]).unwrap();
    assert_eq!(names_in(&store.slot_dir("B")), vec!["B_ER0000.sl2"]);
}

#[test]
fn strip_prefix_falls_back_to_first_token() {
    assert_eq!(strip_slot_prefix("A_B", "A_B_ER0000.sl2"), "ER0000.sl2");
    assert_eq!(strip_slot_prefix("New", "Old_ER0000.sl2"), "ER0000.sl2");
    assert_eq!(strip_slot_prefix("X", "ER0000.sl2"), "ER0000.sl2");
}

#[test]
fn rename_reprefixes_every_member() {
    let d = tempfile::tempdir().unwrap();
    let store = SlotStore::new(d.path());
    let dir = store.create_slot("Foo").unwrap();
    write(&dir.join("Foo_ER0000.sl2"), b"1");
    write(&dir.join("Foo_ER0000.sl2.bak"), b"2");
    store.rename_slot("Foo", "Baz").unwrap();
    assert!(!store.exists("Foo"));
    assert_eq!(names_in(&store.slot_dir("Baz")), vec!["Baz_ER0000.sl2", "Baz_ER0000.sl2.bak"]);
    assert_eq!(fs::read(store.slot_dir("Baz").join("Baz_ER0000.sl2")).unwrap(), b"1");
}

#[test]
fn rename_rejects_case_insensitive_collision() {
    let d = tempfile::tempdir().unwrap();
    let store = SlotStore::new(d.path());
    let foo = store.create_slot("Foo").unwrap();
    write(&foo.join("Foo_ER0000.sl2"), b"1");
    store.create_slot("Bar").unwrap();
    let err = store.rename_slot("Foo", "bar").unwrap_err();
    assert!(matches!(err, SwapError::NameCollision { ref existing, .. } if existing == "Bar"));
    assert_eq!(names_in(&foo), vec!["Foo_ER0000.sl2"]);
}

#[test]
fn rename_to_longer_name_sharing_prefix() {
    let d = tempfile::tempdir().unwrap();
    let store = SlotStore::new(d.path());
    let dir = store.create_slot("A").unwrap();
    write(&dir.join("A_ER0000.sl2"), b"1");
    store.rename_slot("A", "A_x").unwrap();
    assert_eq!(names_in(&store.slot_dir("A_x")), vec!["A_x_ER0000.sl2"]);
    // nothing left to repair
    store.repair_prefixes("A_x", "A").unwrap();
    assert_eq!(names_in(&store.slot_dir("A_x")), vec!["A_x_ER0000.sl2"]);
}

#[test]
fn repair_finishes_mixed_prefixes() {
    let d = tempfile::tempdir().unwrap();
    let store = SlotStore::new(d.path());
    let dir = store.create_slot("New").unwrap();
    write(&dir.join("New_ER0000.sl2"), b"1");
    write(&dir.join("Old_ER0000.sl2.bak"), b"2");
    store.repair_prefixes("New", "Old").unwrap();
    assert_eq!(names_in(&dir), vec!["New_ER0000.sl2", "New_ER0000.sl2.bak"]);
}

#[test]
fn rename_rejects_blank_and_path_names() {
    let d = tempfile::tempdir().unwrap();
    let store = SlotStore::new(d.path());
    store.create_slot("Foo").unwrap();
    assert!(matches!(store.rename_slot("Foo", "  "), Err(SwapError::InvalidName(_))));
    assert!(matches!(store.rename_slot("Foo", "../x"), Err(SwapError::InvalidName(_))));
    assert!(matches!(store.rename_slot("Nope", "Other"), Err(SwapError::SlotNotFound(_))));
}

#[test]
fn config_defaults_and_roundtrip() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("cfg").join("config.json");
    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.current_slot(), "Default_Save");
    assert!(matches!(cfg.save_dir(), Err(SwapError::ConfigurationMissing(_))));

    let mut cfg = cfg;
    cfg.set_save_location(d.path());
    cfg.set_backup_location(&d.path().join("bk"));
    cfg.last_used_save = Some("Run".into());
    cfg.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, cfg);
    assert!(loaded.swap_directory.ends_with("Saves"));
    assert!(loaded.timestamp_backup_location.ends_with(TIMESTAMPED_DIR));

    // partial files written by older versions
    fs::write(&path, r#"{"save_location": "", "setup_complete": true}"#).unwrap();
    let partial = Config::load(&path).unwrap();
    assert!(partial.setup_complete);
    assert_eq!(partial.last_used_save, None);
}
