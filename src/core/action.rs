//! User interactions, parsed from `--action` arguments or interactive input.
//!
//! ```text
//! reset
//! inconsistencies
//! filter:<kind>[:<key>=<value>[;<key>=<value>...]]
//! select:<table>:<row>
//! ```

use crate::domain::model::Payload;
use crate::utils::error::{DashboardError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Tables whose rows can be selected to narrow the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableId {
    Status,
    TopRisk,
    Explorer,
    Municipalities,
    Codede,
    Entities,
}

impl TableId {
    pub const ALL: [TableId; 6] = [
        TableId::Status,
        TableId::TopRisk,
        TableId::Explorer,
        TableId::Municipalities,
        TableId::Codede,
        TableId::Entities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableId::Status => "status",
            TableId::TopRisk => "top-risk",
            TableId::Explorer => "explorer",
            TableId::Municipalities => "municipalities",
            TableId::Codede => "codede",
            TableId::Entities => "entities",
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        TableId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DashboardError::InvalidAction {
                input: s.to_string(),
                reason: format!(
                    "unknown table, expected one of: {}",
                    TableId::ALL.map(|t| t.as_str()).join(", ")
                ),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Reset,
    /// The kind stays textual so an unknown tag reaches the filter
    /// controller and fails there.
    Filter {
        kind: String,
        payload: Payload,
    },
    Select {
        table: TableId,
        row: usize,
    },
    ShowInconsistencies,
}

fn invalid(input: &str, reason: impl Into<String>) -> DashboardError {
    DashboardError::InvalidAction {
        input: input.to_string(),
        reason: reason.into(),
    }
}

fn parse_payload(input: &str, raw: &str) -> Result<Payload> {
    let mut payload = Payload::new();
    for pair in raw.split(';').filter(|p| !p.trim().is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| invalid(input, format!("expected key=value, got '{}'", pair)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid(input, "payload key cannot be empty"));
        }
        if payload.insert(key.to_string(), value.to_string()).is_some() {
            return Err(invalid(input, format!("payload key '{}' given twice", key)));
        }
    }
    Ok(payload)
}

impl FromStr for Action {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        let mut parts = input.splitn(3, ':');
        let verb = parts.next().unwrap_or("");

        match verb {
            "reset" | "inconsistencies" if parts.next().is_some() => {
                Err(invalid(input, format!("'{}' takes no arguments", verb)))
            }
            "reset" => Ok(Action::Reset),
            "inconsistencies" => Ok(Action::ShowInconsistencies),
            "filter" => {
                let kind = parts
                    .next()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| invalid(input, "missing filter kind"))?;
                let payload = parse_payload(input, parts.next().unwrap_or(""))?;
                Ok(Action::Filter {
                    kind: kind.to_string(),
                    payload,
                })
            }
            "select" => {
                let table: TableId = parts
                    .next()
                    .ok_or_else(|| invalid(input, "missing table"))?
                    .trim()
                    .parse()?;
                let raw_row = parts.next().ok_or_else(|| invalid(input, "missing row"))?;
                let row = raw_row
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| invalid(input, format!("row must be a number, got '{}'", raw_row)))?;
                Ok(Action::Select { table, row })
            }
            "" => Err(invalid(input, "empty action")),
            other => Err(invalid(input, format!("unknown action '{}'", other))),
        }
    }
}
