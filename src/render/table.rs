//! Display tables: every cell is already formatted for output.

use crate::core::aggregate::StatusGroup;
use crate::domain::frame::{Cell, ColumnType, Frame};
use crate::domain::model::ProjectPoint;
use crate::utils::format::{fmt_float, fmt_int, fmt_money, fmt_pct, MISSING};
use serde::Serialize;

pub const MONEY_COLUMNS_AGGREGATE: &[&str] = &[
    "presupuesto_vigente",
    "ejecutado_total",
    "no_ejecutado",
    "presupuesto_inconsistencia_estado_momento",
];
pub const RATIO_COLUMNS_AGGREGATE: &[&str] = &["ratio_ejec_agg"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    /// Name used by `select:<table>:<row>`, when rows are selectable.
    pub selectable_as: Option<&'static str>,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Project attributes that can appear as a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectColumn {
    Snip,
    Name,
    Department,
    Municipality,
    Entity,
    AuditStatus,
    LastReportedStatus,
    BudgetaryMoment,
    InconsistencyFlag,
    CurrentBudget,
    ExecutedTotal,
    ExecutionRatio,
    Unexecuted,
    MonthsSinceLastExecution,
    ZeroRunMax,
    ExecutionSlope,
    Reversals,
}

pub const TOP_RISK_COLUMNS: &[ProjectColumn] = &[
    ProjectColumn::Snip,
    ProjectColumn::Name,
    ProjectColumn::Department,
    ProjectColumn::Municipality,
    ProjectColumn::Entity,
    ProjectColumn::AuditStatus,
    ProjectColumn::BudgetaryMoment,
    ProjectColumn::InconsistencyFlag,
    ProjectColumn::CurrentBudget,
    ProjectColumn::ExecutedTotal,
    ProjectColumn::ExecutionRatio,
    ProjectColumn::Unexecuted,
];

pub const EXPLORER_COLUMNS: &[ProjectColumn] = &[
    ProjectColumn::Snip,
    ProjectColumn::Name,
    ProjectColumn::Department,
    ProjectColumn::Municipality,
    ProjectColumn::Entity,
    ProjectColumn::AuditStatus,
    ProjectColumn::LastReportedStatus,
    ProjectColumn::BudgetaryMoment,
    ProjectColumn::CurrentBudget,
    ProjectColumn::ExecutedTotal,
    ProjectColumn::ExecutionRatio,
    ProjectColumn::Unexecuted,
    ProjectColumn::MonthsSinceLastExecution,
    ProjectColumn::ZeroRunMax,
    ProjectColumn::ExecutionSlope,
    ProjectColumn::Reversals,
    ProjectColumn::InconsistencyFlag,
];

pub const INCONSISTENCY_COLUMNS: &[ProjectColumn] = &[
    ProjectColumn::Snip,
    ProjectColumn::Name,
    ProjectColumn::Department,
    ProjectColumn::Municipality,
    ProjectColumn::Entity,
    ProjectColumn::BudgetaryMoment,
    ProjectColumn::CurrentBudget,
    ProjectColumn::ExecutionRatio,
];

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING.to_string())
}

impl ProjectColumn {
    /// Header as named in the extract.
    pub fn header(&self) -> &'static str {
        match self {
            ProjectColumn::Snip => "snip",
            ProjectColumn::Name => "nombre_de_proyecto",
            ProjectColumn::Department => "departamento",
            ProjectColumn::Municipality => "municipio",
            ProjectColumn::Entity => "entidad_ejecutora",
            ProjectColumn::AuditStatus => "estado_auditoria",
            ProjectColumn::LastReportedStatus => "estado_reportado_ult",
            ProjectColumn::BudgetaryMoment => "momento_presupuestario",
            ProjectColumn::InconsistencyFlag => "flag_inconsistencia_estado_momento",
            ProjectColumn::CurrentBudget => "presupuesto_actual_vigente",
            ProjectColumn::ExecutedTotal => "ejecutado_total_calc",
            ProjectColumn::ExecutionRatio => "ratio_ejec_real",
            ProjectColumn::Unexecuted => "no_ejecutado_vigente",
            ProjectColumn::MonthsSinceLastExecution => "months_since_last_exec",
            ProjectColumn::ZeroRunMax => "zero_run_max",
            ProjectColumn::ExecutionSlope => "slope_exec_12m",
            ProjectColumn::Reversals => "reversiones_fin",
        }
    }

    pub fn render(&self, p: &ProjectPoint) -> String {
        match self {
            ProjectColumn::Snip => p.snip_id.to_string(),
            ProjectColumn::Name => text(&p.name),
            ProjectColumn::Department => text(&p.department),
            ProjectColumn::Municipality => text(&p.municipality),
            ProjectColumn::Entity => text(&p.executing_entity),
            ProjectColumn::AuditStatus => text(&p.audit_status),
            ProjectColumn::LastReportedStatus => text(&p.last_reported_status),
            ProjectColumn::BudgetaryMoment => text(&p.budgetary_moment),
            ProjectColumn::InconsistencyFlag => match p.inconsistency_flag {
                Some(true) => "1".to_string(),
                Some(false) => "0".to_string(),
                None => MISSING.to_string(),
            },
            ProjectColumn::CurrentBudget => fmt_money(p.current_budget, 2),
            ProjectColumn::ExecutedTotal => fmt_money(p.executed_total, 2),
            ProjectColumn::ExecutionRatio => fmt_pct(p.execution_ratio, 1),
            ProjectColumn::Unexecuted => fmt_money(p.unexecuted_budget, 2),
            ProjectColumn::MonthsSinceLastExecution => fmt_float(p.months_since_last_execution, 2),
            ProjectColumn::ZeroRunMax => fmt_float(p.zero_run_max, 2),
            ProjectColumn::ExecutionSlope => fmt_float(p.execution_slope_12m, 2),
            ProjectColumn::Reversals => fmt_float(p.financial_reversals, 2),
        }
    }
}

pub fn project_table(
    selectable_as: Option<&'static str>,
    title: &str,
    columns: &[ProjectColumn],
    projects: &[&ProjectPoint],
) -> TableView {
    TableView {
        selectable_as,
        title: title.to_string(),
        columns: columns.iter().map(|c| c.header().to_string()).collect(),
        rows: projects
            .iter()
            .map(|p| columns.iter().map(|c| c.render(p)).collect())
            .collect(),
    }
}

pub fn status_table(title: &str, groups: &[StatusGroup]) -> TableView {
    let columns = [
        "estado_auditoria",
        "proyectos",
        "presupuesto",
        "ejecutado",
        "no_ejecutado",
        "inconsistencias",
        "ratio_ejec",
    ];
    TableView {
        selectable_as: Some("status"),
        title: title.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: groups
            .iter()
            .map(|g| {
                vec![
                    text(&g.status),
                    fmt_int(Some(g.projects as f64)),
                    fmt_money(Some(g.budget), 2),
                    fmt_money(Some(g.executed), 2),
                    fmt_money(Some(g.unexecuted), 2),
                    fmt_int(Some(g.inconsistencies as f64)),
                    fmt_pct(g.execution_ratio, 1),
                ]
            })
            .collect(),
    }
}

/// Formats a whole frame: money and ratio columns by name, other numeric
/// columns by their inferred type. The `snip` column is left as written.
pub fn frame_table(
    selectable_as: Option<&'static str>,
    title: &str,
    frame: &Frame,
    money_columns: &[&str],
    ratio_columns: &[&str],
) -> TableView {
    let formatters: Vec<fn(&Cell) -> String> = frame
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| -> fn(&Cell) -> String {
            if column == "snip" {
                raw_cell
            } else if money_columns.contains(&column.as_str()) {
                |c: &Cell| fmt_money(c.as_number(), 2)
            } else if ratio_columns.contains(&column.as_str()) {
                |c: &Cell| fmt_pct(c.as_number(), 1)
            } else {
                match frame.column_type(idx) {
                    ColumnType::Integer => |c: &Cell| fmt_int(c.as_number()),
                    ColumnType::Float => |c: &Cell| fmt_float(c.as_number(), 2),
                    ColumnType::Text => raw_cell,
                }
            }
        })
        .collect();

    TableView {
        selectable_as,
        title: title.to_string(),
        columns: frame.columns().to_vec(),
        rows: frame
            .rows()
            .iter()
            .map(|row| row.iter().zip(&formatters).map(|(cell, f)| f(cell)).collect())
            .collect(),
    }
}

fn raw_cell(cell: &Cell) -> String {
    match cell {
        Cell::Missing => MISSING.to_string(),
        Cell::Number(v) if v.fract() == 0.0 => format!("{:.0}", v),
        Cell::Number(v) => v.to_string(),
        Cell::Text(s) => s.clone(),
    }
}
