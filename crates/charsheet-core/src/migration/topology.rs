//! Classification of a document's sheets for one character.

use crate::document::SheetProperties;
use crate::error::MigrationError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

pub const OLD_SUFFIX: &str = "_old";
pub const NEW_SUFFIX: &str = "_new";

/// The three sheet titles a migration revolves around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationTitles {
    pub current: String,
    pub old: String,
    pub staging: String,
}

impl MigrationTitles {
    pub fn for_character(name: &str) -> Self {
        Self {
            current: name.to_string(),
            old: format!("{name}{OLD_SUFFIX}"),
            staging: format!("{name}{NEW_SUFFIX}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyState {
    /// Only the live sheet exists; it becomes the archive on commit.
    Fresh,
    /// Only the archive exists, left behind by an earlier partial run.
    Resume,
}

impl TopologyState {
    pub fn as_str(self) -> &'static str {
        match self {
            TopologyState::Fresh => "fresh",
            TopologyState::Resume => "resume",
        }
    }
}

impl fmt::Display for TopologyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of which relevant sheets existed at one point in time.
///
/// Never patched after a remote mutation; take a new snapshot instead.
#[derive(Debug, Clone)]
pub struct SheetTopology {
    pub titles: MigrationTitles,
    pub current_exists: bool,
    pub old_exists: bool,
    pub new_exists: bool,
    pub sheet_properties: HashMap<String, SheetProperties>,
}

impl SheetTopology {
    pub fn snapshot(name: &str, sheets: &[SheetProperties]) -> Self {
        let titles = MigrationTitles::for_character(name);
        let sheet_properties: HashMap<String, SheetProperties> = sheets
            .iter()
            .map(|s| (s.title.clone(), s.clone()))
            .collect();
        Self {
            current_exists: sheet_properties.contains_key(&titles.current),
            old_exists: sheet_properties.contains_key(&titles.old),
            new_exists: sheet_properties.contains_key(&titles.staging),
            titles,
            sheet_properties,
        }
    }

    pub fn properties(&self, title: &str) -> Option<&SheetProperties> {
        self.sheet_properties.get(title)
    }

    pub fn classify(&self) -> Result<TopologyState, MigrationError> {
        match (self.current_exists, self.old_exists) {
            (false, false) => Err(MigrationError::NoSourceSheet {
                name: self.titles.current.clone(),
                old: self.titles.old.clone(),
            }),
            (true, true) => Err(MigrationError::AlreadyMigrated {
                name: self.titles.current.clone(),
                old: self.titles.old.clone(),
            }),
            (false, true) => Ok(TopologyState::Resume),
            (true, false) => Ok(TopologyState::Fresh),
        }
    }
}

/// A successfully classified document, ready to migrate.
#[derive(Debug, Clone)]
pub struct Topology {
    pub state: TopologyState,
    /// The sheet legacy values are extracted from.
    pub source: SheetProperties,
    /// A leftover staging sheet from an earlier run, if any.
    pub stale_staging: Option<SheetProperties>,
    pub snapshot: SheetTopology,
}

impl Topology {
    pub fn titles(&self) -> &MigrationTitles {
        &self.snapshot.titles
    }
}

pub fn resolve(name: &str, sheets: &[SheetProperties]) -> Result<Topology, MigrationError> {
    let snapshot = SheetTopology::snapshot(name, sheets);
    let state = snapshot.classify()?;
    let source_title = match state {
        TopologyState::Fresh => &snapshot.titles.current,
        TopologyState::Resume => &snapshot.titles.old,
    };
    let source = snapshot
        .properties(source_title)
        .cloned()
        .ok_or_else(|| MigrationError::NoSourceSheet {
            name: snapshot.titles.current.clone(),
            old: snapshot.titles.old.clone(),
        })?;
    let stale_staging = snapshot.properties(&snapshot.titles.staging).cloned();
    Ok(Topology {
        state,
        source,
        stale_staging,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheets(titles: &[&str]) -> Vec<SheetProperties> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| SheetProperties {
                sheet_id: 100 + i as i64,
                title: t.to_string(),
                index: i as u32,
            })
            .collect()
    }

    #[test]
    fn decision_table() {
        let cases: &[(&[&str], Option<TopologyState>)] = &[
            (&["Blanko"], None),
            (&["Blanko", "Hero_new"], None),
            (&["Blanko", "Hero", "Hero_old"], None),
            (&["Blanko", "Hero", "Hero_old", "Hero_new"], None),
            (&["Blanko", "Hero_old"], Some(TopologyState::Resume)),
            (&["Blanko", "Hero_old", "Hero_new"], Some(TopologyState::Resume)),
            (&["Blanko", "Hero"], Some(TopologyState::Fresh)),
            (&["Blanko", "Hero", "Hero_new"], Some(TopologyState::Fresh)),
        ];
        for (titles, expected) in cases {
            let got = resolve("Hero", &sheets(titles)).ok().map(|t| t.state);
            assert_eq!(got, *expected, "titles {titles:?}");
        }
    }

    #[test]
    fn missing_sources_is_no_source_sheet() {
        let err = resolve("Hero", &sheets(&["Blanko", "Hero_new"])).unwrap_err();
        assert!(matches!(err, MigrationError::NoSourceSheet { .. }));
    }

    #[test]
    fn both_sources_is_already_migrated() {
        let err = resolve("Hero", &sheets(&["Hero", "Hero_old"])).unwrap_err();
        assert!(matches!(err, MigrationError::AlreadyMigrated { .. }));
    }

    #[test]
    fn fresh_extracts_from_current() {
        let topo = resolve("Hero", &sheets(&["Blanko", "Hero"])).unwrap();
        assert_eq!(topo.source.title, "Hero");
        assert_eq!(topo.source.index, 1);
        assert!(topo.stale_staging.is_none());
    }

    #[test]
    fn resume_extracts_from_old_and_sees_stale_staging() {
        let topo = resolve("Hero", &sheets(&["Blanko", "Hero_old", "Hero_new"])).unwrap();
        assert_eq!(topo.state, TopologyState::Resume);
        assert_eq!(topo.source.title, "Hero_old");
        assert_eq!(topo.stale_staging.unwrap().sheet_id, 102);
    }

    #[test]
    fn other_characters_are_ignored() {
        let topo = resolve("Hero", &sheets(&["Hero", "Heroine_old", "Hero_old_new"])).unwrap();
        assert_eq!(topo.state, TopologyState::Fresh);
        assert!(!topo.snapshot.old_exists);
        assert!(!topo.snapshot.new_exists);
    }
}
