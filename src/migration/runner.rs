//! Plan and apply migrations
//!
//! A run reads the current version, diffs it against the requested
//! [`Target`] into a [`Plan`], and applies the plan one migration at a time.
//! Every step runs in its own transaction together with the version update,
//! so a failure rolls back only the failing step and leaves all earlier steps
//! committed.

use std::fmt;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::database::VersionStore;
use crate::error::{BoxError, Error, Result};
use crate::migration::catalog::MigrationCatalog;
use crate::migration::unit::Migration;
use crate::migration::version::{Version, ZERO_VERSION};

/// Keyword selecting the newest migration
pub const LATEST_TARGET: &str = "latest";

/// Version a run should end at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Newest migration in the catalog
    Latest,
    /// Pre-migration state
    Zero,
    /// An explicit version, which must exist in the catalog
    Version(Version),
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case(LATEST_TARGET) {
            Target::Latest
        } else if value == ZERO_VERSION {
            Target::Zero
        } else {
            // unknown strings are kept so planning can report them
            let version =
                Version::parse(value).unwrap_or_else(|| Version::from_stored(value.to_string()));
            Target::Version(version)
        }
    }
}

impl From<Version> for Target {
    fn from(version: Version) -> Self {
        if version.is_zero() {
            Target::Zero
        } else {
            Target::Version(version)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Latest => f.write_str(LATEST_TARGET),
            Target::Zero => f.write_str(ZERO_VERSION),
            Target::Version(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

/// One migration of a plan and the version recorded once it commits
#[derive(Debug, Clone)]
pub struct PlanStep<'a> {
    pub migration: &'a Migration,
    pub record_version: Version,
}

/// Ordered migrations to run for one invocation
#[derive(Debug, Clone)]
pub struct Plan<'a> {
    current: Version,
    direction: Option<Direction>,
    steps: Vec<PlanStep<'a>>,
}

impl<'a> Plan<'a> {
    fn new(current: &Version, direction: Direction, steps: Vec<PlanStep<'a>>) -> Self {
        Self {
            current: current.clone(),
            direction: if steps.is_empty() {
                None
            } else {
                Some(direction)
            },
            steps,
        }
    }

    fn empty(current: &Version) -> Self {
        Self {
            current: current.clone(),
            direction: None,
            steps: Vec::new(),
        }
    }

    /// Version the database is at before the plan runs
    pub fn current(&self) -> &Version {
        &self.current
    }

    /// `None` for an empty plan
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn steps(&self) -> &[PlanStep<'a>] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Version the database will be at if every step succeeds
    pub fn final_version(&self) -> &Version {
        self.steps
            .last()
            .map(|s| &s.record_version)
            .unwrap_or(&self.current)
    }
}

/// Compute the plan taking a database from `current` to `target`
///
/// Fails with [`Error::VersionMismatch`] when an explicit target is not in
/// the catalog.
pub fn plan<'a>(
    current: &Version,
    target: &Target,
    catalog: &'a MigrationCatalog,
) -> Result<Plan<'a>> {
    check_target(target, catalog)?;

    let forward = match target {
        Target::Latest => true,
        Target::Zero => false,
        Target::Version(v) if v == current => return Ok(Plan::empty(current)),
        Target::Version(v) => v > current,
    };

    if forward {
        let steps = catalog
            .iter()
            .filter(|m| m.version() > current)
            .filter(|m| match target {
                Target::Version(v) => m.version() <= v,
                _ => true,
            })
            .map(|m| PlanStep {
                migration: m,
                record_version: m.version().clone(),
            })
            .collect();
        Ok(Plan::new(current, Direction::Forward, steps))
    } else {
        let floor = match target {
            Target::Version(v) => v.clone(),
            _ => Version::zero(),
        };
        let steps = catalog
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, m)| m.version() <= current && *m.version() > floor)
            .map(|(i, m)| PlanStep {
                migration: m,
                record_version: catalog.predecessor(i),
            })
            .collect();
        Ok(Plan::new(current, Direction::Backward, steps))
    }
}

/// Reject explicit targets that are not in the catalog
///
/// The zero sentinel is always reachable, even when wrapped in
/// [`Target::Version`].
pub fn check_target(target: &Target, catalog: &MigrationCatalog) -> Result<()> {
    match target {
        Target::Version(v) if !v.is_zero() && !catalog.contains(v) => Err(Error::VersionMismatch {
            target: v.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub direction: Option<Direction>,
    pub from_version: Version,
    pub to_version: Version,
    pub applied: Vec<Version>,
}

impl MigrationReport {
    /// Report for a run that changed nothing
    pub fn unchanged(version: &Version) -> Self {
        Self {
            direction: None,
            from_version: version.clone(),
            to_version: version.clone(),
            applied: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Applies plans computed from a catalog
pub struct MigrationRunner<'a> {
    catalog: &'a MigrationCatalog,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(catalog: &'a MigrationCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a MigrationCatalog {
        self.catalog
    }

    pub fn check_target(&self, target: &Target) -> Result<()> {
        check_target(target, self.catalog)
    }

    /// Plan against this runner's catalog
    pub fn plan(&self, current: &Version, target: &Target) -> Result<Plan<'a>> {
        plan(current, target, self.catalog)
    }

    /// Read the current version, plan, and execute
    pub fn run(&self, conn: &Connection, target: &Target) -> Result<MigrationReport> {
        check_target(target, self.catalog)?;
        let current = VersionStore::new(conn).get_version()?;
        let plan = self.plan(&current, target)?;
        self.execute(conn, &plan)
    }

    /// Execute a plan step by step
    ///
    /// Stops at the first failing step. The returned [`Error::Execution`]
    /// carries the last committed version; steps before the failure stay
    /// committed.
    pub fn execute(&self, conn: &Connection, plan: &Plan<'_>) -> Result<MigrationReport> {
        let direction = match plan.direction() {
            Some(d) => d,
            None => {
                info!("database already at version {}", plan.current());
                return Ok(MigrationReport::unchanged(plan.current()));
            }
        };

        let mut last_committed = plan.current().clone();
        let mut applied = Vec::with_capacity(plan.steps().len());

        for step in plan.steps() {
            let migration = step.migration;
            match direction {
                Direction::Forward => info!("upgrading to {}", migration),
                Direction::Backward => info!("downgrading {}", migration),
            }

            if let Err(source) = apply_step(conn, step, direction) {
                warn!(
                    "migration {} failed and was rolled back, database remains at version {}",
                    migration, last_committed
                );
                return Err(Error::Execution {
                    version: migration.version().clone(),
                    migration: migration.to_string(),
                    last_committed,
                    source,
                });
            }

            last_committed = step.record_version.clone();
            applied.push(migration.version().clone());
        }

        info!(
            "migrated {} migrations {} from {} to {}",
            applied.len(),
            direction,
            plan.current(),
            last_committed
        );

        Ok(MigrationReport {
            direction: Some(direction),
            from_version: plan.current().clone(),
            to_version: last_committed,
            applied,
        })
    }
}

/// Run one step and its version update in a single transaction
///
/// Dropping the transaction on an early return rolls it back.
fn apply_step(
    conn: &Connection,
    step: &PlanStep<'_>,
    direction: Direction,
) -> std::result::Result<(), BoxError> {
    let tx = conn.unchecked_transaction()?;
    match direction {
        Direction::Forward => step.migration.upgrade(&tx)?,
        Direction::Backward => step.migration.downgrade(&tx)?,
    }
    VersionStore::new(&tx).set_version(&step.record_version)?;
    tx.commit()?;
    Ok(())
}
