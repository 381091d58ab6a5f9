use charsheet_core::config::Config;
use charsheet_core::memory::{InMemoryDocument, Operation};
use charsheet_core::migration::{self, MigrationConfig, TopologyState};
use charsheet_core::range::Column;
use charsheet_core::{MigrationError, SheetError};

fn config() -> MigrationConfig {
    MigrationConfig::from(&Config::new("doc"))
}

/// Legacy layout: names in A, values in C, blocks starting at rows 2 and 8.
fn legacy_sheet(doc: &InMemoryDocument, title: &str) {
    doc.add_sheet(title);
    doc.set_column(title, Column::A, 1, &["Name", "Str", "Dex"]);
    doc.set_column(title, Column::C, 1, &["Hero", "3", "5"]);
    doc.set_cell(title, Column::A, 8, "Swim");
    doc.set_cell(title, Column::C, 8, "2");
    doc.set_cell(title, Column::A, 9, "Lore");
}

fn template(doc: &InMemoryDocument) {
    doc.add_sheet("Blanko");
    doc.set_column(
        "Blanko",
        Column::A,
        1,
        &["Name", "Str", "Dex", "", "Swim", "Fly", "Lore"],
    );
    doc.set_cell("Blanko", Column::D, 1, "XP");
}

fn fresh_doc() -> InMemoryDocument {
    let doc = InMemoryDocument::new("doc");
    legacy_sheet(&doc, "Hero");
    template(&doc);
    doc
}

fn assert_migrated(doc: &InMemoryDocument) {
    assert_eq!(doc.cell("Hero", Column::D, 1).as_deref(), Some("XP"));
    assert_eq!(doc.cell("Hero", Column::D, 2).as_deref(), Some("3"));
    assert_eq!(doc.cell("Hero", Column::D, 3).as_deref(), Some("5"));
    assert_eq!(doc.cell("Hero", Column::D, 4), None);
    assert_eq!(doc.cell("Hero", Column::D, 5).as_deref(), Some("2"));
    assert_eq!(doc.cell("Hero", Column::D, 6), None);
    assert_eq!(doc.cell("Hero", Column::D, 7).as_deref(), Some("0"));
    assert_eq!(doc.cell("Hero", Column::A, 6).as_deref(), Some("Fly"));
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[test]
fn fresh_migration_archives_and_replaces() {
    let doc = fresh_doc();
    let legacy = doc.cells("Hero").unwrap();
    let template_cells = doc.cells("Blanko").unwrap();

    let report = migration::migrate(&doc, &config(), "Hero").unwrap();

    assert_eq!(report.state, TopologyState::Fresh);
    assert_eq!(report.source_sheet, "Hero");
    assert_eq!(report.archive_sheet, "Hero_old");
    assert_eq!(report.abilities, 4);
    assert_eq!(report.ranges_written, 3);
    assert_eq!(report.cells_written, 4);

    assert_eq!(doc.titles(), vec!["Hero_old", "Hero", "Blanko"]);
    assert_eq!(doc.cells("Hero_old").unwrap(), legacy);
    assert_eq!(doc.cells("Blanko").unwrap(), template_cells);
    assert_eq!(doc.properties("Hero").unwrap().sheet_id, report.sheet_id);
    assert_migrated(&doc);

    assert_eq!(doc.calls(Operation::BatchWrite), 1);
    assert_eq!(doc.calls(Operation::BatchUpdate), 2);
}

#[test]
fn resume_migrates_from_archive() {
    let doc = InMemoryDocument::new("doc");
    legacy_sheet(&doc, "Hero_old");
    template(&doc);
    let legacy = doc.cells("Hero_old").unwrap();

    let report = migration::migrate(&doc, &config(), "Hero").unwrap();

    assert_eq!(report.state, TopologyState::Resume);
    assert_eq!(report.source_sheet, "Hero_old");
    assert_eq!(doc.titles(), vec!["Hero_old", "Hero", "Blanko"]);
    assert_eq!(doc.cells("Hero_old").unwrap(), legacy);
    assert_migrated(&doc);
}

#[test]
fn no_matching_keys_skips_the_write() {
    let doc = InMemoryDocument::new("doc");
    doc.add_sheet("Hero");
    doc.set_cell("Hero", Column::A, 2, "Str");
    doc.add_sheet("Blanko");
    doc.set_cell("Blanko", Column::A, 2, "Dex");

    let report = migration::migrate(&doc, &config(), "Hero").unwrap();
    assert_eq!(report.ranges_written, 0);
    assert_eq!(doc.calls(Operation::BatchWrite), 0);
    assert_eq!(doc.titles(), vec!["Hero_old", "Hero", "Blanko"]);
}

// ---------------------------------------------------------------------------
// Topology conflicts
// ---------------------------------------------------------------------------

#[test]
fn already_migrated_is_rejected_without_changes() {
    let doc = fresh_doc();
    doc.add_sheet("Hero_old");
    let before = doc.titles();

    let err = migration::migrate(&doc, &config(), "Hero").unwrap_err();
    assert!(matches!(err, MigrationError::AlreadyMigrated { .. }));
    assert!(err.is_user_error());
    assert_eq!(doc.titles(), before);
    assert_eq!(doc.calls(Operation::BatchUpdate), 0);
}

#[test]
fn missing_character_is_rejected() {
    let doc = fresh_doc();
    let err = migration::migrate(&doc, &config(), "Nobody").unwrap_err();
    assert!(matches!(err, MigrationError::NoSourceSheet { ref name, .. } if name == "Nobody"));
    assert_eq!(doc.titles(), vec!["Hero", "Blanko"]);
}

#[test]
fn config_without_legacy_blocks_is_rejected_before_any_change() {
    let doc = fresh_doc();
    let mut cfg = config();
    cfg.layout.legacy_blocks.clear();

    let err = migration::migrate(&doc, &cfg, "Hero").unwrap_err();
    assert!(matches!(err, MigrationError::InvalidConfig(_)));
    assert!(!err.document_mutated());
    assert_eq!(doc.titles(), vec!["Hero", "Blanko"]);
    assert_eq!(doc.calls(Operation::ListSheets), 0);
    assert_eq!(doc.calls(Operation::BatchUpdate), 0);

    migration::migrate(&doc, &config(), "Hero").unwrap();
    assert_migrated(&doc);
}

#[test]
fn value_column_on_key_column_is_rejected() {
    let doc = fresh_doc();
    let mut cfg = config();
    cfg.layout.value_column = Column::A;

    let err = migration::migrate(&doc, &cfg, "Hero").unwrap_err();
    match err {
        MigrationError::InvalidConfig(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("both A"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(doc.titles(), vec!["Hero", "Blanko"]);
    assert_eq!(doc.cell("Hero", Column::A, 2).as_deref(), Some("Str"));
    assert_eq!(doc.calls(Operation::BatchWrite), 0);
}

#[test]
fn second_run_after_success_is_a_conflict() {
    let doc = fresh_doc();
    migration::migrate(&doc, &config(), "Hero").unwrap();
    let err = migration::migrate(&doc, &config(), "Hero").unwrap_err();
    assert!(matches!(err, MigrationError::AlreadyMigrated { .. }));
}

#[test]
fn sheet_list_failure_is_metadata_unavailable() {
    let doc = fresh_doc();
    doc.fail_next(Operation::ListSheets, 1);
    let err = migration::migrate(&doc, &config(), "Hero").unwrap_err();
    assert!(matches!(err, MigrationError::MetadataUnavailable(_)));
    assert!(!err.document_mutated());
}

// ---------------------------------------------------------------------------
// Failures and recovery
// ---------------------------------------------------------------------------

#[test]
fn bad_legacy_value_fails_before_any_mutation() {
    let doc = fresh_doc();
    doc.set_cell("Hero", Column::C, 3, "lots");

    let err = migration::migrate(&doc, &config(), "Hero").unwrap_err();
    match &err {
        MigrationError::ExtractionFailed { sheet, source } => {
            assert_eq!(sheet, "Hero");
            assert!(matches!(source, SheetError::InvalidValue { key, .. } if key == "Dex"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!err.document_mutated());
    assert_eq!(doc.titles(), vec!["Hero", "Blanko"]);
    assert_eq!(doc.calls(Operation::BatchUpdate), 0);
}

#[test]
fn missing_template_fails_staging() {
    let doc = InMemoryDocument::new("doc");
    legacy_sheet(&doc, "Hero");

    let err = migration::migrate(&doc, &config(), "Hero").unwrap_err();
    match &err {
        MigrationError::StagingFailed { sheet, source } => {
            assert_eq!(sheet, "Hero_new");
            assert!(matches!(source, SheetError::SheetNotFound(t) if t == "Blanko"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(doc.titles(), vec!["Hero"]);
}

#[test]
fn rerun_after_write_failure_recreates_staging() {
    let doc = fresh_doc();
    doc.fail_next(Operation::BatchWrite, 1);

    let err = migration::migrate(&doc, &config(), "Hero").unwrap_err();
    assert!(matches!(err, MigrationError::WriteFailed { .. }));
    assert!(err.document_mutated());
    assert_eq!(doc.titles(), vec!["Hero", "Hero_new", "Blanko"]);

    let report = migration::migrate(&doc, &config(), "Hero").unwrap();
    assert_eq!(report.state, TopologyState::Fresh);
    assert_eq!(doc.titles(), vec!["Hero_old", "Hero", "Blanko"]);
    assert_migrated(&doc);
}

#[test]
fn rerun_after_commit_failure_completes() {
    let doc = fresh_doc();
    let legacy = doc.cells("Hero").unwrap();
    // staging batch succeeds, the promoting batch fails
    doc.fail_after(Operation::BatchUpdate, 1, 1);

    let err = migration::migrate(&doc, &config(), "Hero").unwrap_err();
    assert!(matches!(err, MigrationError::CommitFailed { ref sheet, .. } if sheet == "Hero_new"));
    assert_eq!(doc.titles(), vec!["Hero", "Hero_new", "Blanko"]);
    assert_eq!(doc.cell("Hero_new", Column::D, 2).as_deref(), Some("3"));

    migration::migrate(&doc, &config(), "Hero").unwrap();
    assert_eq!(doc.titles(), vec!["Hero_old", "Hero", "Blanko"]);
    assert_eq!(doc.cells("Hero_old").unwrap(), legacy);
    assert_migrated(&doc);
}

#[test]
fn inspect_does_not_mutate() {
    let doc = fresh_doc();
    doc.add_sheet("Hero_new");
    let topology = migration::inspect(&doc, &config(), "Hero").unwrap();
    assert_eq!(topology.state, TopologyState::Fresh);
    assert_eq!(topology.stale_staging.unwrap().title, "Hero_new");
    assert_eq!(doc.calls(Operation::BatchUpdate), 0);
}
