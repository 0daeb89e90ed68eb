use crate::core::action::{Action, TableId};
use crate::core::aggregate::{
    inconsistency_sample, inconsistency_summary, kpis, risk_order, status_breakdown,
    InconsistencySummary, Kpis, StatusGroup, EXPLORER_ROWS, INCONSISTENCY_SAMPLE_ROWS,
    TOP_RISK_ROWS,
};
use crate::core::dataset::{Dataset, SCORE_COLUMN};
use crate::core::filter::{select_points, FilterSession, Redraw};
use crate::domain::frame::Frame;
use crate::domain::model::{FilterState, Payload, ProjectPoint};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::render::map::MapView;
use crate::render::table::{
    frame_table, project_table, status_table, TableView, EXPLORER_COLUMNS, INCONSISTENCY_COLUMNS,
    MONEY_COLUMNS_AGGREGATE, RATIO_COLUMNS_AGGREGATE, TOP_RISK_COLUMNS,
};
use crate::utils::error::{DashboardError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

const MAP_TITLE: &str = "Project map (narrowed by table selections)";

/// Dataset plus every ordering the tables display, computed once.
#[derive(Debug)]
struct Board {
    dataset: Dataset,
    kpis: Kpis,
    status: Vec<StatusGroup>,
    /// Indices into `dataset.projects`, highest fiscal risk first.
    risk_order: Vec<usize>,
    municipalities: Frame,
    codede: Frame,
    entities: Frame,
    inconsistencies: InconsistencySummary,
}

impl Board {
    fn prepare(dataset: Dataset) -> Self {
        Self {
            risk_order: risk_order(&dataset.projects),
            kpis: kpis(&dataset.projects),
            status: status_breakdown(&dataset.projects),
            municipalities: dataset.municipalities.sorted_desc(SCORE_COLUMN),
            codede: dataset.codede.sorted_desc(SCORE_COLUMN),
            entities: dataset.entities.sorted_desc(SCORE_COLUMN),
            inconsistencies: inconsistency_summary(&dataset.projects),
            dataset,
        }
    }

    fn ranked(&self, limit: usize) -> Vec<&ProjectPoint> {
        self.risk_order
            .iter()
            .take(limit)
            .map(|&idx| &self.dataset.projects[idx])
            .collect()
    }
}

/// Loads the extracts once and hands out independent user sessions.
#[derive(Debug, Clone)]
pub struct DashboardEngine {
    board: Arc<Board>,
}

impl DashboardEngine {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            board: Arc::new(Board::prepare(dataset)),
        }
    }

    pub async fn load<S: Storage, C: ConfigProvider>(storage: &S, config: &C) -> Result<Self> {
        tracing::info!(
            "Loading extracts '{}_*.csv' from {}",
            config.dataset_prefix(),
            config.data_dir()
        );
        let dataset = Dataset::load(storage, config.dataset_prefix()).await?;
        tracing::info!(
            "🗺️ {} of {} projects have coordinates",
            dataset.located_projects(),
            dataset.projects.len()
        );
        Ok(Self::new(dataset))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.board.dataset
    }

    /// A fresh session starting with no map filter.
    pub fn session(&self) -> Session {
        Session {
            board: Arc::clone(&self.board),
            filter: FilterSession::new(),
        }
    }
}

/// Everything one redraw shows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    pub filter: FilterState,
    pub kpis: Kpis,
    pub map: MapView,
    pub tables: Vec<TableView>,
    pub inconsistencies: InconsistencySummary,
    pub inconsistency_sample: TableView,
    pub budget_inconsistencies: TableView,
}

/// One user's view of the dashboard. The dataset is shared; the filter is
/// owned by the session and never visible to other sessions.
#[derive(Debug, Clone)]
pub struct Session {
    board: Arc<Board>,
    filter: FilterSession,
}

/// CODEDE councils map one-to-one to departments in these extracts.
fn codede_filter(department: String) -> FilterState {
    FilterState::ByDepartment { department }
}

impl Session {
    pub fn filter(&self) -> &FilterState {
        self.filter.state()
    }

    pub fn set_filter(&mut self, kind: &str, payload: &Payload) -> Result<Redraw> {
        self.filter.set_filter(kind, payload)
    }

    pub fn reset(&mut self) -> Redraw {
        self.filter.reset()
    }

    pub fn apply(&mut self, action: &Action) -> Result<Redraw> {
        let redraw = match action {
            Action::Reset => self.reset(),
            Action::Filter { kind, payload } => self.set_filter(kind, payload)?,
            Action::Select { table, row } => self.select_row(*table, *row)?,
            Action::ShowInconsistencies => self.filter.set(FilterState::ByInconsistencyFlag),
        };
        tracing::debug!("Applied {:?}: {:?}", action, redraw);
        Ok(redraw)
    }

    /// Narrows the map to what a row of `table` stands for.
    pub fn select_row(&mut self, table: TableId, row: usize) -> Result<Redraw> {
        let next = self.row_filter(table, row)?;
        Ok(self.filter.set(next))
    }

    /// The filter a row selection would produce, without applying it.
    pub fn row_filter(&self, table: TableId, row: usize) -> Result<FilterState> {
        let board = &self.board;
        let out_of_range = |len: usize| DashboardError::RowOutOfRange {
            table: table.to_string(),
            row,
            len,
        };

        match table {
            TableId::Status => {
                let group = board
                    .status
                    .get(row)
                    .ok_or_else(|| out_of_range(board.status.len()))?;
                let status = group.status.clone().ok_or_else(|| DashboardError::MissingValue {
                    dataset: table.to_string(),
                    field: "estado_auditoria".to_string(),
                    row,
                })?;
                Ok(FilterState::ByAuditStatus { status })
            }
            TableId::TopRisk | TableId::Explorer => {
                let limit = if table == TableId::TopRisk {
                    TOP_RISK_ROWS
                } else {
                    EXPLORER_ROWS
                };
                let shown = board.risk_order.len().min(limit);
                if row >= shown {
                    return Err(out_of_range(shown));
                }
                let project = &board.dataset.projects[board.risk_order[row]];
                Ok(FilterState::BySnip {
                    snip_id: project.snip_id,
                })
            }
            TableId::Municipalities => {
                let frame = &board.municipalities;
                if row >= frame.len() {
                    return Err(out_of_range(frame.len()));
                }
                Ok(FilterState::ByMunicipality {
                    department: frame_key(frame, row, "departamento")?,
                    municipality: frame_key(frame, row, "municipio")?,
                })
            }
            TableId::Codede => {
                let frame = &board.codede;
                if row >= frame.len() {
                    return Err(out_of_range(frame.len()));
                }
                Ok(codede_filter(frame_key(frame, row, "departamento")?))
            }
            TableId::Entities => {
                let frame = &board.entities;
                if row >= frame.len() {
                    return Err(out_of_range(frame.len()));
                }
                Ok(FilterState::ByExecutingEntity {
                    entity_name: frame_key(frame, row, "entidad_ejecutora")?,
                })
            }
        }
    }

    /// Located points that pass the current filter, in extract order.
    pub fn visible_points(&self) -> Vec<&ProjectPoint> {
        select_points(&self.board.dataset.projects, self.filter.state())
    }

    pub fn map(&self) -> MapView {
        MapView::build(MAP_TITLE, &self.visible_points())
    }

    /// Writes the current map layer as GeoJSON and returns the marker count.
    pub async fn export_map<S: Storage>(&self, storage: &S, path: &str) -> Result<usize> {
        let map = self.map();
        storage
            .write_file(path, map.to_geojson().to_string().as_bytes())
            .await?;
        tracing::info!("💾 Exported {} markers to {}", map.shown_points(), path);
        Ok(map.shown_points())
    }

    /// Rebuilds the whole dashboard for the current filter.
    pub fn view(&self) -> DashboardView {
        let board = &self.board;
        let projects = &board.dataset.projects;

        let tables = vec![
            status_table(
                "Audit status: counts and money (select to filter the map by status)",
                &board.status,
            ),
            project_table(
                Some(TableId::TopRisk.as_str()),
                "Top 30 SNIP by fiscal risk (select to show that SNIP)",
                TOP_RISK_COLUMNS,
                &board.ranked(TOP_RISK_ROWS),
            ),
            project_table(
                Some(TableId::Explorer.as_str()),
                "SNIP explorer (select to show that SNIP)",
                EXPLORER_COLUMNS,
                &board.ranked(EXPLORER_ROWS),
            ),
            frame_table(
                Some(TableId::Municipalities.as_str()),
                "Municipalities: concentration of low execution (select to show the municipality)",
                &board.municipalities,
                MONEY_COLUMNS_AGGREGATE,
                RATIO_COLUMNS_AGGREGATE,
            ),
            frame_table(
                Some(TableId::Codede.as_str()),
                "CODEDE (department): concentration of low execution (select to show the department)",
                &board.codede,
                MONEY_COLUMNS_AGGREGATE,
                RATIO_COLUMNS_AGGREGATE,
            ),
            frame_table(
                Some(TableId::Entities.as_str()),
                "Executing entities: concentration of low execution (select to show the entity)",
                &board.entities,
                MONEY_COLUMNS_AGGREGATE,
                RATIO_COLUMNS_AGGREGATE,
            ),
        ];

        DashboardView {
            generated_at: Utc::now(),
            filter: self.filter.state().clone(),
            kpis: board.kpis.clone(),
            map: self.map(),
            tables,
            inconsistencies: board.inconsistencies.clone(),
            inconsistency_sample: project_table(
                None,
                "Inconsistency: finished audit vs active budgetary moment",
                INCONSISTENCY_COLUMNS,
                &inconsistency_sample(projects, INCONSISTENCY_SAMPLE_ROWS),
            ),
            budget_inconsistencies: frame_table(
                None,
                "Budget inconsistencies",
                &board.dataset.budget_inconsistencies,
                MONEY_COLUMNS_AGGREGATE,
                RATIO_COLUMNS_AGGREGATE,
            ),
        }
    }
}

fn frame_key(frame: &Frame, row: usize, column: &str) -> Result<String> {
    frame.key(row, column).ok_or_else(|| DashboardError::MissingValue {
        dataset: frame.name().to_string(),
        field: column.to_string(),
        row,
    })
}
