//! # Severity Levels
//!
//! The router knows exactly nine severities: the five conventional ones
//! (debug, info, warning, error, critical) and four test-reporting levels
//! (step, substep, pass, fail) interleaved between them by rank.
//!
//! | level    | rank | colour     |
//! |----------|------|------------|
//! | debug    | 10   | cyan       |
//! | info     | 20   | white      |
//! | step     | 21   | white      |
//! | substep  | 22   | light grey |
//! | pass     | 23   | green      |
//! | warning  | 30   | yellow     |
//! | fail     | 31   | red        |
//! | error    | 40   | red        |
//! | critical | 50   | red        |
//!
//! Ranks drive threshold filtering and must be unique, so the `LevelRegistry`
//! validates the table once and then serves both name→level and rank→name
//! lookups without recomputing anything per call.

use crate::error::{LoggerError, Result};
use colored::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

/// Light grey used for substeps (xterm-256 grey 250).
const LIGHT_GREY: Color = Color::TrueColor {
    r: 188,
    g: 188,
    b: 188,
};

/// The closed set of message severities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Step,
    Substep,
    Pass,
    Fail,
}

impl Severity {
    /// Every severity, in registration order.
    pub const ALL: [Severity; 9] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Step,
        Severity::Substep,
        Severity::Pass,
        Severity::Fail,
    ];

    /// Lower-case registry name.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
            Severity::Step => "step",
            Severity::Substep => "substep",
            Severity::Pass => "pass",
            Severity::Fail => "fail",
        }
    }

    /// Upper-case name rendered into records.
    pub fn display_name(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Step => "STEP",
            Severity::Substep => "SUBSTEP",
            Severity::Pass => "PASS",
            Severity::Fail => "FAIL",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Severity::Debug => 10,
            Severity::Info => 20,
            Severity::Warning => 30,
            Severity::Error => 40,
            Severity::Critical => 50,
            Severity::Step => 21,
            Severity::Substep => 22,
            Severity::Pass => 23,
            Severity::Fail => 31,
        }
    }

    /// Terminal colour for the level.
    pub fn color(self) -> Color {
        match self {
            Severity::Debug => Color::Cyan,
            Severity::Info | Severity::Step => Color::White,
            Severity::Warning => Color::Yellow,
            Severity::Error | Severity::Critical | Severity::Fail => Color::Red,
            Severity::Substep => LIGHT_GREY,
            Severity::Pass => Color::Green,
        }
    }

    pub fn spec(self) -> LevelSpec {
        LevelSpec {
            name: self.name(),
            display: self.display_name(),
            rank: self.rank(),
            color: self.color(),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Severity::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LoggerError::UnknownLevel(s.to_string()))
    }
}

/// A registry entry: everything the formatter needs to know about a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelSpec {
    pub name: &'static str,
    pub display: &'static str,
    pub rank: u8,
    pub color: Color,
}

/// Bijective name↔rank table.
#[derive(Debug, Default)]
pub struct LevelRegistry {
    by_rank: BTreeMap<u8, LevelSpec>,
}

impl LevelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry holding the nine built-in severities.
    pub fn standard() -> Result<Self> {
        let mut registry = Self::new();
        for level in Severity::ALL {
            registry.register(level.spec())?;
        }
        Ok(registry)
    }

    /// Process-wide registry, validated on first use.
    pub fn global() -> &'static LevelRegistry {
        static REGISTRY: OnceLock<LevelRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            LevelRegistry::standard()
                .unwrap_or_else(|e| panic!("built-in level table is not a bijection: {e}"))
        })
    }

    /// Register a level.
    ///
    /// Registering the same name at the same rank again is a no-op. A second
    /// name at an already-owned rank fails with `DuplicateRank`. Registering a
    /// known name at a new rank moves it.
    pub fn register(&mut self, spec: LevelSpec) -> Result<()> {
        if let Some(existing) = self.by_rank.get(&spec.rank) {
            if existing.name == spec.name {
                return Ok(());
            }
            return Err(LoggerError::DuplicateRank {
                rank: spec.rank,
                existing: existing.name.to_string(),
                attempted: spec.name.to_string(),
            });
        }

        self.by_rank.retain(|_, known| known.name != spec.name);
        self.by_rank.insert(spec.rank, spec);
        Ok(())
    }

    /// Look a level up by name, ignoring ASCII case.
    pub fn lookup(&self, name: &str) -> Result<&LevelSpec> {
        let name = name.trim();
        self.by_rank
            .values()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| LoggerError::UnknownLevel(name.to_string()))
    }

    /// Name of the level owning exactly `rank`, if any.
    pub fn rank_to_name(&self, rank: u8) -> Option<&'static str> {
        self.by_rank.get(&rank).map(|spec| spec.name)
    }

    pub fn spec_for_rank(&self, rank: u8) -> Option<&LevelSpec> {
        self.by_rank.get(&rank)
    }

    /// Registered names, ordered by rank.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_rank.values().map(|spec| spec.name)
    }

    pub fn len(&self) -> usize {
        self.by_rank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_rank.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_is_bijective() {
        let registry = LevelRegistry::standard().unwrap();
        assert_eq!(registry.len(), 9);

        for level in Severity::ALL {
            let spec = registry.lookup(level.name()).unwrap();
            assert_eq!(registry.rank_to_name(spec.rank), Some(level.name()));
        }
    }

    #[test]
    fn test_conventional_ordering_is_kept() {
        let ranks: Vec<u8> = [
            Severity::Debug,
            Severity::Info,
            Severity::Warning,
            Severity::Error,
            Severity::Critical,
        ]
        .iter()
        .map(|l| l.rank())
        .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));

        assert!(Severity::Info.rank() < Severity::Step.rank());
        assert!(Severity::Step.rank() < Severity::Substep.rank());
        assert!(Severity::Substep.rank() < Severity::Pass.rank());
        assert!(Severity::Pass.rank() < Severity::Warning.rank());
        assert!(Severity::Warning.rank() < Severity::Fail.rank());
    }

    #[test]
    fn test_reregistration_is_noop() {
        let mut registry = LevelRegistry::standard().unwrap();
        registry.register(Severity::Step.spec()).unwrap();
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_duplicate_rank_is_rejected() {
        let mut registry = LevelRegistry::standard().unwrap();
        let err = registry
            .register(LevelSpec {
                name: "milestone",
                display: "MILESTONE",
                rank: 21,
                color: Color::Blue,
            })
            .unwrap_err();

        match err {
            LoggerError::DuplicateRank {
                rank,
                existing,
                attempted,
            } => {
                assert_eq!(rank, 21);
                assert_eq!(existing, "step");
                assert_eq!(attempted, "milestone");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.rank_to_name(21), Some("step"));
    }

    #[test]
    fn test_rank_to_name_unmapped() {
        let registry = LevelRegistry::global();
        assert_eq!(registry.rank_to_name(0), None);
        assert_eq!(registry.rank_to_name(25), None);
        assert_eq!(registry.rank_to_name(31), Some("fail"));
    }

    #[test]
    fn test_lookup_unknown_level() {
        let registry = LevelRegistry::global();
        assert!(matches!(
            registry.lookup("verbose"),
            Err(LoggerError::UnknownLevel(name)) if name == "verbose"
        ));
        assert_eq!(registry.lookup("WARNING").unwrap().rank, 30);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("Substep".parse::<Severity>().unwrap(), Severity::Substep);
        assert!("passed".parse::<Severity>().is_err());
    }
}
