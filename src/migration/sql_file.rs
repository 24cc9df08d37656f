//! Migration file format
//!
//! A migration file is plain SQL split into two sections by marker lines:
//!
//! ```sql
//! -- Migration Name: create users
//! -- Migration Version: 20200101000000
//!
//! -- upgrade
//! CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
//!
//! -- downgrade
//! DROP TABLE users;
//! ```
//!
//! Anything before the first marker is a header and is ignored. A section
//! may be empty, in which case the operation is a no-op.

use crate::error::ValidationIssue;

pub const UPGRADE_SECTION: &str = "upgrade";
pub const DOWNGRADE_SECTION: &str = "downgrade";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Upgrade,
    Downgrade,
}

/// The two SQL sections of a migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSections {
    pub upgrade: String,
    pub downgrade: String,
}

/// Split migration file content into its upgrade and downgrade sections
pub fn parse_sections(content: &str) -> Result<SqlSections, ValidationIssue> {
    let mut current = Section::Header;
    let mut upgrade: Option<Vec<&str>> = None;
    let mut downgrade: Option<Vec<&str>> = None;

    for line in content.lines() {
        match section_marker(line) {
            Some(Section::Upgrade) => {
                if upgrade.is_some() {
                    return Err(ValidationIssue::DuplicateOperation(UPGRADE_SECTION));
                }
                upgrade = Some(Vec::new());
                current = Section::Upgrade;
            }
            Some(Section::Downgrade) => {
                if downgrade.is_some() {
                    return Err(ValidationIssue::DuplicateOperation(DOWNGRADE_SECTION));
                }
                downgrade = Some(Vec::new());
                current = Section::Downgrade;
            }
            _ => match current {
                Section::Header => {}
                Section::Upgrade => upgrade.get_or_insert_with(Vec::new).push(line),
                Section::Downgrade => downgrade.get_or_insert_with(Vec::new).push(line),
            },
        }
    }

    match (upgrade, downgrade) {
        (Some(up), Some(down)) => Ok(SqlSections {
            upgrade: up.join("\n").trim().to_string(),
            downgrade: down.join("\n").trim().to_string(),
        }),
        (up, down) => {
            let mut missing = Vec::new();
            if up.is_none() {
                missing.push(UPGRADE_SECTION);
            }
            if down.is_none() {
                missing.push(DOWNGRADE_SECTION);
            }
            Err(ValidationIssue::MissingOperations(missing))
        }
    }
}

fn section_marker(line: &str) -> Option<Section> {
    let comment = line.trim().strip_prefix("--")?;
    let label = comment.trim().trim_end_matches(':');
    if label.eq_ignore_ascii_case(UPGRADE_SECTION) {
        Some(Section::Upgrade)
    } else if label.eq_ignore_ascii_case(DOWNGRADE_SECTION) {
        Some(Section::Downgrade)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let content = r#"-- Migration Name: create users
-- Migration Version: 20200101000000

-- upgrade
CREATE TABLE users (id INTEGER PRIMARY KEY);
CREATE INDEX idx_users_id ON users(id);

-- downgrade
DROP TABLE users;
"#;
        let sections = parse_sections(content).unwrap();
        assert_eq!(
            sections.upgrade,
            "CREATE TABLE users (id INTEGER PRIMARY KEY);\nCREATE INDEX idx_users_id ON users(id);"
        );
        assert_eq!(sections.downgrade, "DROP TABLE users;");
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let content = "--UPGRADE:\nSELECT 1;\n  -- Downgrade\nSELECT 2;";
        let sections = parse_sections(content).unwrap();
        assert_eq!(sections.upgrade, "SELECT 1;");
        assert_eq!(sections.downgrade, "SELECT 2;");
    }

    #[test]
    fn test_empty_sections_are_allowed() {
        let sections = parse_sections("-- upgrade\n-- downgrade\n").unwrap();
        assert!(sections.upgrade.is_empty());
        assert!(sections.downgrade.is_empty());
    }

    #[test]
    fn test_missing_sections() {
        assert_eq!(
            parse_sections("CREATE TABLE t (id INTEGER);"),
            Err(ValidationIssue::MissingOperations(vec![
                UPGRADE_SECTION,
                DOWNGRADE_SECTION
            ]))
        );
        assert_eq!(
            parse_sections("-- upgrade\nCREATE TABLE t (id INTEGER);"),
            Err(ValidationIssue::MissingOperations(vec![DOWNGRADE_SECTION]))
        );
    }

    #[test]
    fn test_duplicate_section() {
        assert_eq!(
            parse_sections("-- upgrade\n-- downgrade\n-- upgrade\n"),
            Err(ValidationIssue::DuplicateOperation(UPGRADE_SECTION))
        );
    }
}
