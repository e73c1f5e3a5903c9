use chrono::NaiveDate;
use rostermap_core::{
    read_roster, read_roster_from_reader, Document, ListTemplate, MapTemplate, Orientation,
    ReconcileOptions, ReconcileService, Roster, RosterRow,
};
use std::fs;
use std::path::Path;

const ROSTER_CSV: &str = "\
rapid,number,address,phone,names,occupancy
101,12,Beach Rd,\"555 0101, 555 0102\",\"Ann Lee, Bob Lee\",Permanent
102,14,Beach Rd,,Cat Wu,Holidays
,16,Beach Rd,,Nobody Home,Vacant
103,18,Beach Rd,555 0103,,Bogus
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn roster() -> Roster {
    read_roster_from_reader(ROSTER_CSV.as_bytes()).unwrap()
}

fn roster_of(keys: &[&str]) -> Roster {
    Roster {
        rows: keys.iter().map(|key| RosterRow::new(*key)).collect(),
        skipped: Vec::new(),
    }
}

fn load_map(path: &Path) -> Document<MapTemplate> {
    Document::load(path, MapTemplate).unwrap()
}

#[test]
fn first_session_creates_every_keyed_row_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.svg");
    let service = ReconcileService::new(MapTemplate, ReconcileOptions::default());

    let report = service.run_on(&path, &roster(), today()).unwrap();
    assert_eq!(report.created, vec!["101", "102", "103"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, 4);
    assert_eq!(report.skipped[0].names.as_deref(), Some("Nobody Home"));

    let doc = load_map(&path);
    assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["101", "102", "103"]);
}

#[test]
fn repeated_session_leaves_entries_layer_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.svg");
    let service = ReconcileService::new(MapTemplate, ReconcileOptions::default());

    service.run_on(&path, &roster(), today()).unwrap();
    let first_file = fs::read_to_string(&path).unwrap();
    let first_entries = load_map(&path).entries_to_string();

    let report = service.run_on(&path, &roster(), today()).unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.updated.len(), 3);
    assert!(report.pruned.is_empty());

    assert_eq!(load_map(&path).entries_to_string(), first_entries);
    assert_eq!(fs::read_to_string(&path).unwrap(), first_file);
    assert_eq!(
        fs::read_to_string(dir.path().join("map.bak")).unwrap(),
        first_file
    );
}

#[test]
fn saved_fields_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.svg");
    let service = ReconcileService::new(MapTemplate, ReconcileOptions::default());
    service.run_on(&path, &roster(), today()).unwrap();

    let doc = load_map(&path);
    assert_eq!(doc.entry_text("101", "textRAPID"), Some("101"));
    assert_eq!(doc.entry_text("101", "textNumber"), Some("12"));
    assert_eq!(doc.entry_text("101", "textDetails"), Some("Ann Lee"));
    assert_eq!(doc.occupancy_href("101"), Some("#house_symbol"));
    assert_eq!(doc.occupancy_href("102"), Some("#bach_in_sun_symbol"));

    let details = doc.get("101").unwrap().node();
    let text = doc
        .tree()
        .find_child(details, "svg:text", &[("inkscape:label", "textDetails")])
        .unwrap();
    assert_eq!(
        doc.tree().itertext(text),
        vec!["Ann Lee", "Bob Lee", "555 0101", "555 0102"]
    );
}

#[test]
fn bogus_occupancy_renders_like_absent_occupancy() {
    let mut doc = Document::new("map.svg", Orientation::Portrait, MapTemplate).unwrap();
    doc.merge(RosterRow {
        occupancy: Some("Bogus".to_string()),
        ..RosterRow::new("1")
    })
    .unwrap();
    doc.merge(RosterRow::new("2")).unwrap();

    assert_eq!(doc.occupancy_href("1"), doc.occupancy_href("2"));
    assert_eq!(doc.occupancy_href("1"), Some("#question_mark_symbol"));
}

#[test]
fn pruning_drops_only_keys_missing_from_roster() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.svg");
    let service = ReconcileService::new(ListTemplate, ReconcileOptions::default());
    service.run_on(&path, &roster_of(&["A", "B", "C"]), today()).unwrap();

    let report = service.run_on(&path, &roster_of(&["A", "C"]), today()).unwrap();
    assert_eq!(report.pruned, vec!["B"]);

    let doc = Document::load(&path, ListTemplate).unwrap();
    assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["A", "C"]);
    assert!(!doc.entries_to_string().contains("inkscape:label=\"B\""));
}

#[test]
fn no_deletes_keeps_stale_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.svg");
    let options = ReconcileOptions {
        prune_stale: false,
        ..ReconcileOptions::default()
    };
    let service = ReconcileService::new(ListTemplate, options);
    service.run_on(&path, &roster_of(&["A", "B"]), today()).unwrap();
    let report = service.run_on(&path, &roster_of(&["A"]), today()).unwrap();
    assert!(report.pruned.is_empty());

    let doc = Document::load(&path, ListTemplate).unwrap();
    assert_eq!(doc.len(), 2);
}

#[test]
fn backups_never_overwrite_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.svg");
    let service = ReconcileService::new(MapTemplate, ReconcileOptions::default());

    let mut written = Vec::new();
    for keys in [&["A"][..], &["A", "B"][..], &["B"][..], &["C"][..]] {
        let report = service.run_on(&path, &roster_of(keys), today()).unwrap();
        written.push((report.backup_path, fs::read_to_string(&path).unwrap()));
    }

    assert!(written[0].0.is_none());
    assert_eq!(written[1].0.as_deref(), Some(dir.path().join("map.bak").as_path()));
    assert_eq!(written[2].0.as_deref(), Some(dir.path().join("map-1.bak").as_path()));
    assert_eq!(written[3].0.as_deref(), Some(dir.path().join("map-2.bak").as_path()));

    assert_eq!(fs::read_to_string(dir.path().join("map.bak")).unwrap(), written[0].1);
    assert_eq!(fs::read_to_string(dir.path().join("map-1.bak")).unwrap(), written[1].1);
    assert_eq!(fs::read_to_string(dir.path().join("map-2.bak")).unwrap(), written[2].1);
}

#[test]
fn disabled_backup_replaces_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.svg");
    let options = ReconcileOptions {
        backup: false,
        ..ReconcileOptions::default()
    };
    let service = ReconcileService::new(MapTemplate, options);
    service.run_on(&path, &roster_of(&["A"]), today()).unwrap();
    service.run_on(&path, &roster_of(&["B"]), today()).unwrap();

    assert!(!dir.path().join("map.bak").exists());
    assert_eq!(load_map(&path).keys().collect::<Vec<_>>(), vec!["B"]);
}

#[test]
fn landscape_option_only_applies_to_new_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.svg");
    let options = ReconcileOptions {
        orientation: Orientation::Landscape,
        ..ReconcileOptions::default()
    };
    ReconcileService::new(MapTemplate, options)
        .run_on(&path, &roster_of(&["A"]), today())
        .unwrap();
    ReconcileService::new(MapTemplate, ReconcileOptions::default())
        .run_on(&path, &roster_of(&["A"]), today())
        .unwrap();

    let doc = load_map(&path);
    assert_eq!(doc.tree().attribute(doc.tree().root(), "width"), Some("297mm"));
}

#[test]
fn roster_file_drives_list_session() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("addresses.csv");
    fs::write(&csv_path, ROSTER_CSV).unwrap();
    let path = dir.path().join("list.svg");

    let roster = read_roster(&csv_path).unwrap();
    let service = ReconcileService::new(ListTemplate, ReconcileOptions::default());
    let report = service.run_on(&path, &roster, today()).unwrap();
    assert_eq!(report.created.len(), 3);

    let doc = Document::load(&path, ListTemplate).unwrap();
    assert_eq!(doc.entry_text("101", "textNames"), Some("Ann Lee, Bob Lee"));
    assert_eq!(doc.entry_text("101", "textPhone"), Some("555 0101, 555 0102"));
    assert_eq!(doc.entry_text("102", "textPhone"), None);
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("Last updated:  1 June 2025"));
}
