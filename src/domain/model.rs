use crate::utils::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One audited project from the SNIP extract.
///
/// Every optional field distinguishes "no value" from zero; numeric cells
/// that were empty, unparseable or non-finite in the extract are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPoint {
    pub snip_id: i64,
    pub name: Option<String>,
    pub department: Option<String>,
    pub municipality: Option<String>,
    pub executing_entity: Option<String>,
    pub audit_status: Option<String>,
    pub last_reported_status: Option<String>,
    pub budgetary_moment: Option<String>,
    pub current_budget: Option<f64>,
    pub executed_total: Option<f64>,
    pub unexecuted_budget: Option<f64>,
    pub execution_ratio: Option<f64>,
    pub fiscal_risk: Option<f64>,
    pub months_since_last_execution: Option<f64>,
    pub zero_run_max: Option<f64>,
    pub execution_slope_12m: Option<f64>,
    pub financial_reversals: Option<f64>,
    pub inconsistency_flag: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ProjectPoint {
    pub fn new(snip_id: i64) -> Self {
        Self {
            snip_id,
            name: None,
            department: None,
            municipality: None,
            executing_entity: None,
            audit_status: None,
            last_reported_status: None,
            budgetary_moment: None,
            current_budget: None,
            executed_total: None,
            unexecuted_budget: None,
            execution_ratio: None,
            fiscal_risk: None,
            months_since_last_execution: None,
            zero_run_max: None,
            execution_slope_12m: None,
            financial_reversals: None,
            inconsistency_flag: None,
            latitude: None,
            longitude: None,
        }
    }

    /// `(latitude, longitude)` when both are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn is_inconsistent(&self) -> bool {
        self.inconsistency_flag.unwrap_or(false)
    }
}

/// Key/value payload accompanying a filter kind.
pub type Payload = BTreeMap<String, String>;

/// Tag of a [`FilterState`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    All,
    Snip,
    Municipality,
    Department,
    Entity,
    Status,
    Inconsistency,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::All => "all",
            FilterKind::Snip => "snip",
            FilterKind::Municipality => "municipality",
            FilterKind::Department => "department",
            FilterKind::Entity => "entity",
            FilterKind::Status => "status",
            FilterKind::Inconsistency => "inconsistency",
        }
    }

    /// Payload keys the kind needs, no more and no less.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            FilterKind::All | FilterKind::Inconsistency => &[],
            FilterKind::Snip => &["snip_id"],
            FilterKind::Municipality => &["department", "municipality"],
            FilterKind::Department => &["department"],
            FilterKind::Entity => &["entity_name"],
            FilterKind::Status => &["status"],
        }
    }
}

impl FromStr for FilterKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        // Upper-case tags are the ones older dashboard sessions stored.
        match s {
            "all" | "ALL" => Ok(FilterKind::All),
            "snip" | "SNIP" => Ok(FilterKind::Snip),
            "municipality" | "MUNICIPIO" => Ok(FilterKind::Municipality),
            "department" | "CODEDE" => Ok(FilterKind::Department),
            "entity" | "ENTIDAD" => Ok(FilterKind::Entity),
            "status" | "ESTADO" => Ok(FilterKind::Status),
            "inconsistency" | "FLAG_INCONSISTENCIA" => Ok(FilterKind::Inconsistency),
            other => Err(DashboardError::InvalidFilterKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the map is currently restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterState {
    #[default]
    All,
    BySnip {
        snip_id: i64,
    },
    ByMunicipality {
        department: String,
        municipality: String,
    },
    ByDepartment {
        department: String,
    },
    ByExecutingEntity {
        entity_name: String,
    },
    ByAuditStatus {
        status: String,
    },
    ByInconsistencyFlag,
}

impl FilterState {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterState::All => FilterKind::All,
            FilterState::BySnip { .. } => FilterKind::Snip,
            FilterState::ByMunicipality { .. } => FilterKind::Municipality,
            FilterState::ByDepartment { .. } => FilterKind::Department,
            FilterState::ByExecutingEntity { .. } => FilterKind::Entity,
            FilterState::ByAuditStatus { .. } => FilterKind::Status,
            FilterState::ByInconsistencyFlag => FilterKind::Inconsistency,
        }
    }

    /// Builds a state from a kind and its payload.
    ///
    /// The payload must carry exactly the fields [`FilterKind::required_fields`]
    /// lists for `kind`.
    pub fn from_kind(kind: FilterKind, payload: &Payload) -> Result<Self> {
        let required = kind.required_fields();
        if let Some(extra) = payload.keys().find(|k| !required.contains(&k.as_str())) {
            return Err(DashboardError::UnexpectedPayloadField {
                kind: kind.to_string(),
                field: extra.clone(),
            });
        }

        let field = |name: &str| -> Result<String> {
            payload
                .get(name)
                .cloned()
                .ok_or_else(|| DashboardError::MissingPayloadField {
                    kind: kind.to_string(),
                    field: name.to_string(),
                })
        };

        let state = match kind {
            FilterKind::All => FilterState::All,
            FilterKind::Snip => {
                let raw = field("snip_id")?;
                let snip_id =
                    raw.trim()
                        .parse::<i64>()
                        .map_err(|e| DashboardError::InvalidPayloadValue {
                            field: "snip_id".to_string(),
                            value: raw.clone(),
                            reason: e.to_string(),
                        })?;
                FilterState::BySnip { snip_id }
            }
            FilterKind::Municipality => FilterState::ByMunicipality {
                department: field("department")?,
                municipality: field("municipality")?,
            },
            FilterKind::Department => FilterState::ByDepartment {
                department: field("department")?,
            },
            FilterKind::Entity => FilterState::ByExecutingEntity {
                entity_name: field("entity_name")?,
            },
            FilterKind::Status => FilterState::ByAuditStatus {
                status: field("status")?,
            },
            FilterKind::Inconsistency => FilterState::ByInconsistencyFlag,
        };

        Ok(state)
    }

    /// Whether a located point passes this filter. Coordinates are not
    /// checked here.
    pub fn matches(&self, point: &ProjectPoint) -> bool {
        match self {
            FilterState::All => true,
            FilterState::BySnip { snip_id } => point.snip_id == *snip_id,
            FilterState::ByMunicipality {
                department,
                municipality,
            } => {
                point.department.as_deref() == Some(department.as_str())
                    && point.municipality.as_deref() == Some(municipality.as_str())
            }
            FilterState::ByDepartment { department } => {
                point.department.as_deref() == Some(department.as_str())
            }
            FilterState::ByExecutingEntity { entity_name } => {
                point.executing_entity.as_deref() == Some(entity_name.as_str())
            }
            FilterState::ByAuditStatus { status } => {
                point.audit_status.as_deref() == Some(status.as_str())
            }
            FilterState::ByInconsistencyFlag => point.is_inconsistent(),
        }
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterState::All => write!(f, "all points"),
            FilterState::BySnip { snip_id } => write!(f, "SNIP {}", snip_id),
            FilterState::ByMunicipality {
                department,
                municipality,
            } => write!(f, "municipality {} / {}", department, municipality),
            FilterState::ByDepartment { department } => write!(f, "department {}", department),
            FilterState::ByExecutingEntity { entity_name } => {
                write!(f, "executing entity {}", entity_name)
            }
            FilterState::ByAuditStatus { status } => write!(f, "audit status {}", status),
            FilterState::ByInconsistencyFlag => write!(f, "status/moment inconsistencies"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(pairs: &[(&str, &str)]) -> Payload {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_kind_parsing_accepts_legacy_tags() {
        assert_eq!("CODEDE".parse::<FilterKind>().unwrap(), FilterKind::Department);
        assert_eq!("department".parse::<FilterKind>().unwrap(), FilterKind::Department);
        assert_eq!(
            "FLAG_INCONSISTENCIA".parse::<FilterKind>().unwrap(),
            FilterKind::Inconsistency
        );
    }

    #[test]
    fn test_kind_parsing_rejects_typos() {
        let err = "departmnet".parse::<FilterKind>().unwrap_err();
        assert!(matches!(err, DashboardError::InvalidFilterKind { kind } if kind == "departmnet"));
        assert!("Department".parse::<FilterKind>().is_err());
    }

    #[test]
    fn test_from_kind_municipality_needs_both_fields() {
        let err = FilterState::from_kind(
            FilterKind::Municipality,
            &payload(&[("department", "Guatemala")]),
        )
        .unwrap_err();
        assert!(
            matches!(err, DashboardError::MissingPayloadField { field, .. } if field == "municipality")
        );

        let state = FilterState::from_kind(
            FilterKind::Municipality,
            &payload(&[("department", "Guatemala"), ("municipality", "Mixco")]),
        )
        .unwrap();
        assert_eq!(
            state,
            FilterState::ByMunicipality {
                department: "Guatemala".to_string(),
                municipality: "Mixco".to_string(),
            }
        );
    }

    #[test]
    fn test_from_kind_rejects_extra_fields() {
        let err = FilterState::from_kind(FilterKind::All, &payload(&[("department", "X")]))
            .unwrap_err();
        assert!(matches!(err, DashboardError::UnexpectedPayloadField { .. }));
    }

    #[test]
    fn test_from_kind_snip_must_be_integer() {
        let err =
            FilterState::from_kind(FilterKind::Snip, &payload(&[("snip_id", "12a")])).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidPayloadValue { .. }));

        let state =
            FilterState::from_kind(FilterKind::Snip, &payload(&[("snip_id", " 12345 ")])).unwrap();
        assert_eq!(state, FilterState::BySnip { snip_id: 12345 });
    }

    #[test]
    fn test_matches_is_case_sensitive() {
        let mut point = ProjectPoint::new(1);
        point.executing_entity = Some("Municipalidad de Mixco".to_string());

        let exact = FilterState::ByExecutingEntity {
            entity_name: "Municipalidad de Mixco".to_string(),
        };
        let shouting = FilterState::ByExecutingEntity {
            entity_name: "MUNICIPALIDAD DE MIXCO".to_string(),
        };
        assert!(exact.matches(&point));
        assert!(!shouting.matches(&point));
    }

    #[test]
    fn test_kind_round_trips_through_state() {
        let state = FilterState::ByAuditStatus {
            status: "Finalizado".to_string(),
        };
        assert_eq!(state.kind(), FilterKind::Status);
        assert_eq!(FilterState::default(), FilterState::All);
    }
}
