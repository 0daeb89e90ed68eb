#![allow(dead_code)]

use snip_dashboard::core::ConfigProvider;
use snip_dashboard::{DashboardEngine, LocalStorage};
use std::path::Path;
use tempfile::TempDir;

pub const PREFIX: &str = "snip_test";

/// Five projects: 104 has no coordinates, 103 has no inconsistency flag and
/// 105 has no audit status.
pub const PROJECTS_CSV: &str = "\
snip,nombre_de_proyecto,departamento,municipio,entidad_ejecutora,estado_auditoria,estado_reportado_ult,momento_presupuestario,presupuesto_actual_vigente,ejecutado_total_calc,no_ejecutado_vigente,ratio_ejec_real,riesgo_fiscal,flag_inconsistencia_estado_momento,latitud,longitud
101,Escuela Oficial Rural Mixta,Guatemala,Mixco,FODES,Finalizado,Finalizado,Ejecución,1000,900,100,0.9,0.2,1,14.63,-90.60
102,Puente vehicular,Guatemala,Villa Nueva,CIV,En ejecución,En ejecución,Ejecución,5000,1000,4000,0.2,0.9,0,14.52,-90.58
103,Carretera a Melchor,Petén,Flores,CIV,En ejecución,En ejecución,Ejecución,8000,0,8000,0,0.95,,16.92,-89.89
104,Ampliación escuela,Guatemala,Mixco,FODES,Finalizado,Finalizado,Ejecución,200,200,0,1,0.1,1,,
105,Mercado municipal,Petén,San Benito,Municipalidad de San Benito,,Suspendido,Ejecución,300,30,270,0.1,0.5,0,16.91,-89.90
";

pub const MUNICIPALITIES_CSV: &str = "\
departamento,municipio,n_proyectos,presupuesto_vigente,ejecutado_total,no_ejecutado,ratio_ejec_agg,score_concentracion_baja_ejec
Guatemala,Mixco,2,1200,1100,100,0.9167,0.1
Guatemala,Villa Nueva,1,5000,1000,4000,0.2,0.6
Petén,Flores,1,8000,0,8000,0,0.9
Petén,San Benito,1,300,30,270,0.1,
";

pub const CODEDE_CSV: &str = "\
departamento,n_proyectos,presupuesto_vigente,ejecutado_total,no_ejecutado,ratio_ejec_agg,score_concentracion_baja_ejec
Guatemala,3,6200,2100,4100,0.3387,0.4
Petén,2,8300,30,8270,0.0036,0.8
";

pub const ENTITIES_CSV: &str = "\
entidad_ejecutora,n_proyectos,presupuesto_vigente,ejecutado_total,no_ejecutado,ratio_ejec_agg,score_concentracion_baja_ejec
FODES,2,1200,1100,100,0.9167,0.05
CIV,2,13000,1000,12000,0.0769,0.7
Municipalidad de San Benito,1,300,30,270,0.1,0.3
";

pub const BUDGET_CSV: &str = "\
snip,estado_auditoria,momento_presupuestario,presupuesto_inconsistencia_estado_momento
101,Finalizado,Ejecución,1000
104,Finalizado,Ejecución,200
";

pub struct FixtureConfig {
    pub data_dir: String,
}

impl ConfigProvider for FixtureConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn dataset_prefix(&self) -> &str {
        PREFIX
    }

    fn table_rows(&self) -> usize {
        10
    }
}

fn write(dir: &Path, suffix: &str, content: &str) {
    std::fs::write(dir.join(format!("{}_{}.csv", PREFIX, suffix)), content).unwrap();
}

/// Writes the five extracts, with `projects` as the project extract.
pub fn write_extracts(dir: &Path, projects: &str) {
    write(dir, "snip", projects);
    write(dir, "municipios", MUNICIPALITIES_CSV);
    write(dir, "codede", CODEDE_CSV);
    write(dir, "entidades", ENTITIES_CSV);
    write(dir, "budget_inconsistencias", BUDGET_CSV);
}

pub fn storage_for(dir: &TempDir) -> (LocalStorage, FixtureConfig) {
    let data_dir = dir.path().to_str().unwrap().to_string();
    (
        LocalStorage::new(data_dir.clone()),
        FixtureConfig { data_dir },
    )
}

pub async fn load_fixture() -> (TempDir, DashboardEngine) {
    let dir = TempDir::new().unwrap();
    write_extracts(dir.path(), PROJECTS_CSV);
    let (storage, config) = storage_for(&dir);
    let engine = DashboardEngine::load(&storage, &config).await.unwrap();
    (dir, engine)
}

pub fn snips(points: &[&snip_dashboard::ProjectPoint]) -> Vec<i64> {
    points.iter().map(|p| p.snip_id).collect()
}
