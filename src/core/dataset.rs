use crate::domain::frame::Frame;
use crate::domain::model::ProjectPoint;
use crate::domain::ports::Storage;
use crate::utils::error::{DashboardError, Result};
use serde::Deserialize;

pub const PROJECT_REQUIRED_COLUMNS: &[&str] = &[
    "snip",
    "nombre_de_proyecto",
    "departamento",
    "municipio",
    "entidad_ejecutora",
    "estado_auditoria",
    "momento_presupuestario",
    "presupuesto_actual_vigente",
    "ejecutado_total_calc",
];

pub const AGGREGATE_NUMERIC_COLUMNS: &[&str] = &[
    "presupuesto_vigente",
    "ejecutado_total",
    "no_ejecutado",
    "ratio_ejec_agg",
    "score_concentracion_baja_ejec",
    "n_inconsistencia_estado_momento",
    "presupuesto_inconsistencia_estado_momento",
];

/// Grouping keys matched against project text fields; never read as numbers.
pub const AGGREGATE_KEY_COLUMNS: &[&str] = &["departamento", "municipio", "entidad_ejecutora"];

pub const SCORE_COLUMN: &str = "score_concentracion_baja_ejec";

/// The five extracts produced by the upstream audit process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    Projects,
    Municipalities,
    Codede,
    Entities,
    BudgetInconsistencies,
}

impl Extract {
    pub fn suffix(&self) -> &'static str {
        match self {
            Extract::Projects => "snip",
            Extract::Municipalities => "municipios",
            Extract::Codede => "codede",
            Extract::Entities => "entidades",
            Extract::BudgetInconsistencies => "budget_inconsistencias",
        }
    }

    pub fn file_name(&self, prefix: &str) -> String {
        format!("{}_{}.csv", prefix, self.suffix())
    }

    fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Extract::Projects => PROJECT_REQUIRED_COLUMNS,
            Extract::Municipalities => &["departamento", "municipio", SCORE_COLUMN],
            Extract::Codede => &["departamento", SCORE_COLUMN],
            Extract::Entities => &["entidad_ejecutora", SCORE_COLUMN],
            Extract::BudgetInconsistencies => &[],
        }
    }
}

/// Everything the dashboard reads, loaded once and never modified.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub projects: Vec<ProjectPoint>,
    pub municipalities: Frame,
    pub codede: Frame,
    pub entities: Frame,
    pub budget_inconsistencies: Frame,
}

impl Dataset {
    pub async fn load<S: Storage>(storage: &S, prefix: &str) -> Result<Self> {
        let file_name = Extract::Projects.file_name(prefix);
        let data = storage.read_file(&file_name).await?;
        let projects = parse_projects(&file_name, &data)?;
        tracing::info!("📥 Loaded {} projects from {}", projects.len(), file_name);

        Ok(Self {
            projects,
            municipalities: load_frame(storage, prefix, Extract::Municipalities).await?,
            codede: load_frame(storage, prefix, Extract::Codede).await?,
            entities: load_frame(storage, prefix, Extract::Entities).await?,
            budget_inconsistencies: load_frame(storage, prefix, Extract::BudgetInconsistencies)
                .await?,
        })
    }

    pub fn located_projects(&self) -> usize {
        self.projects
            .iter()
            .filter(|p| p.coordinates().is_some())
            .count()
    }
}

async fn load_frame<S: Storage>(storage: &S, prefix: &str, extract: Extract) -> Result<Frame> {
    let file_name = extract.file_name(prefix);
    let data = storage.read_file(&file_name).await?;
    let frame = Frame::from_csv(
        &file_name,
        &data,
        extract.required_columns(),
        AGGREGATE_NUMERIC_COLUMNS,
        AGGREGATE_KEY_COLUMNS,
    )?;
    tracing::info!("📥 Loaded {} rows from {}", frame.len(), file_name);
    Ok(frame)
}

/// Raw project row as written by the extraction process.
#[derive(Debug, Deserialize)]
struct ProjectRow {
    snip: Option<String>,
    nombre_de_proyecto: Option<String>,
    departamento: Option<String>,
    municipio: Option<String>,
    entidad_ejecutora: Option<String>,
    estado_auditoria: Option<String>,
    #[serde(default)]
    estado_reportado_ult: Option<String>,
    momento_presupuestario: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    presupuesto_actual_vigente: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    ejecutado_total_calc: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    no_ejecutado_vigente: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    ratio_ejec_real: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    riesgo_fiscal: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    months_since_last_exec: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    zero_run_max: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    slope_exec_12m: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    reversiones_fin: Option<f64>,
    #[serde(default)]
    flag_inconsistencia_estado_momento: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    latitud: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    longitud: Option<f64>,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn parse_snip(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Some(id);
    }
    // Integer ids come back as floats when the extract had gaps.
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64)
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    let trimmed = raw?.trim();
    match trimmed {
        "" => None,
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        other => other
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() == 1.0),
    }
}

pub fn parse_projects(dataset: &str, data: &[u8]) -> Result<Vec<ProjectPoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data);
    let headers = reader.headers()?.clone();
    for field in PROJECT_REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *field) {
            return Err(DashboardError::MissingField {
                dataset: dataset.to_string(),
                field: field.to_string(),
            });
        }
    }

    let mut projects = Vec::new();
    for (idx, row) in reader.deserialize::<ProjectRow>().enumerate() {
        let row = row?;
        let snip_id = row
            .snip
            .as_deref()
            .and_then(parse_snip)
            .ok_or_else(|| DashboardError::MissingValue {
                dataset: dataset.to_string(),
                field: "snip".to_string(),
                row: idx + 1,
            })?;

        projects.push(ProjectPoint {
            snip_id,
            name: row.nombre_de_proyecto,
            department: row.departamento,
            municipality: row.municipio,
            executing_entity: row.entidad_ejecutora,
            audit_status: row.estado_auditoria,
            last_reported_status: row.estado_reportado_ult,
            budgetary_moment: row.momento_presupuestario,
            current_budget: finite(row.presupuesto_actual_vigente),
            executed_total: finite(row.ejecutado_total_calc),
            unexecuted_budget: finite(row.no_ejecutado_vigente),
            execution_ratio: finite(row.ratio_ejec_real),
            fiscal_risk: finite(row.riesgo_fiscal),
            months_since_last_execution: finite(row.months_since_last_exec),
            zero_run_max: finite(row.zero_run_max),
            execution_slope_12m: finite(row.slope_exec_12m),
            financial_reversals: finite(row.reversiones_fin),
            inconsistency_flag: parse_flag(row.flag_inconsistencia_estado_momento.as_deref()),
            latitude: finite(row.latitud),
            longitude: finite(row.longitud),
        });
    }

    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "snip,nombre_de_proyecto,departamento,municipio,entidad_ejecutora,estado_auditoria,momento_presupuestario,presupuesto_actual_vigente,ejecutado_total_calc,flag_inconsistencia_estado_momento,latitud,longitud";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_parse_projects_reads_typed_fields() {
        let data = csv_with(&[
            "101,Escuela,Guatemala,Mixco,FODES,Finalizado,Ejecución,1000.5,250,1,14.63,-90.6",
            "102.0,Puente,Petén,Flores,CIV,En ejecución,Ejecución,abc,,,,",
        ]);
        let projects = parse_projects("snip.csv", data.as_bytes()).unwrap();

        assert_eq!(projects.len(), 2);
        let first = &projects[0];
        assert_eq!(first.snip_id, 101);
        assert_eq!(first.department.as_deref(), Some("Guatemala"));
        assert_eq!(first.current_budget, Some(1000.5));
        assert_eq!(first.inconsistency_flag, Some(true));
        assert_eq!(first.coordinates(), Some((14.63, -90.6)));

        let second = &projects[1];
        assert_eq!(second.snip_id, 102);
        assert_eq!(second.current_budget, None);
        assert_eq!(second.executed_total, None);
        assert_eq!(second.inconsistency_flag, None);
        assert_eq!(second.coordinates(), None);
    }

    #[test]
    fn test_parse_projects_missing_required_column() {
        let data = "snip,departamento\n1,Guatemala\n";
        let err = parse_projects("snip.csv", data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingField { field, .. } if field == "nombre_de_proyecto"
        ));
    }

    #[test]
    fn test_parse_projects_empty_snip_is_fatal() {
        let data = csv_with(&[
            "101,Escuela,Guatemala,Mixco,FODES,Finalizado,Ejecución,1,1,0,14.6,-90.5",
            ",Sin id,Guatemala,Mixco,FODES,Finalizado,Ejecución,1,1,0,14.6,-90.5",
        ]);
        let err = parse_projects("snip.csv", data.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::MissingValue { row: 2, .. }));
    }

    #[test]
    fn test_parse_projects_optional_columns_absent() {
        let data = "snip,nombre_de_proyecto,departamento,municipio,entidad_ejecutora,estado_auditoria,momento_presupuestario,presupuesto_actual_vigente,ejecutado_total_calc\n\
7,Camino,Quiché,Nebaj,CIV,Finalizado,Cierre,10,5\n";
        let projects = parse_projects("snip.csv", data.as_bytes()).unwrap();
        assert_eq!(projects[0].latitude, None);
        assert_eq!(projects[0].fiscal_risk, None);
        assert!(!projects[0].is_inconsistent());
    }

    #[test]
    fn test_parse_projects_padded_headers_still_bind() {
        let data = "snip, nombre_de_proyecto,departamento,municipio,entidad_ejecutora,estado_auditoria,momento_presupuestario, presupuesto_actual_vigente ,ejecutado_total_calc\n\
7,Camino,Quiché,Nebaj,CIV,Finalizado,Cierre,1000,5\n";
        let projects = parse_projects("snip.csv", data.as_bytes()).unwrap();
        assert_eq!(projects[0].current_budget, Some(1000.0));
        assert_eq!(projects[0].name.as_deref(), Some("Camino"));
    }

    #[test]
    fn test_parse_flag_variants() {
        assert_eq!(parse_flag(Some("1")), Some(true));
        assert_eq!(parse_flag(Some("1.0")), Some(true));
        assert_eq!(parse_flag(Some("0")), Some(false));
        assert_eq!(parse_flag(Some("True")), Some(true));
        assert_eq!(parse_flag(Some("")), None);
        assert_eq!(parse_flag(Some("nan")), None);
        assert_eq!(parse_flag(None), None);
    }

    #[test]
    fn test_extract_file_names() {
        assert_eq!(
            Extract::BudgetInconsistencies.file_name("snip_2025Q4"),
            "snip_2025Q4_budget_inconsistencias.csv"
        );
        assert_eq!(Extract::Projects.file_name("x"), "x_snip.csv");
    }
}
