use anyhow::Context;
use clap::Parser;
use snip_dashboard::core::ConfigProvider;
use snip_dashboard::render::render_text;
use snip_dashboard::utils::error::ErrorSeverity;
use snip_dashboard::utils::monitor::SystemMonitor;
use snip_dashboard::utils::{logger, validation::Validate};
use snip_dashboard::{
    Action, CliConfig, DashboardEngine, DashboardError, LocalStorage, Redraw, Session,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting snip-dashboard");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor = SystemMonitor::new(config.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    if let Err(e) = run(&config, &monitor).await {
        let Some(dashboard_error) = e.downcast_ref::<DashboardError>() else {
            return Err(e);
        };
        tracing::error!(
            "❌ {:#} (Severity: {:?})",
            e,
            dashboard_error.severity()
        );
        eprintln!("❌ {}", dashboard_error.user_friendly_message());
        eprintln!("💡 Suggestion: {}", dashboard_error.recovery_suggestion());

        let exit_code = match dashboard_error.severity() {
            ErrorSeverity::Low | ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    monitor.log_final();
    Ok(())
}

async fn run(config: &CliConfig, monitor: &SystemMonitor) -> anyhow::Result<()> {
    let rows = config.table_rows();
    let storage = LocalStorage::new(config.data_dir.clone());
    let engine = DashboardEngine::load(&storage, config)
        .await
        .with_context(|| format!("loading extracts from {}", config.data_dir))?;
    monitor.log_phase("Load");

    let mut session = engine.session();
    for raw in &config.actions {
        let action: Action = raw.parse()?;
        let redraw = session
            .apply(&action)
            .with_context(|| format!("applying action '{}'", raw))?;
        tracing::info!("🎯 {} -> {} ({:?})", raw, session.filter(), redraw);
    }

    if config.interactive {
        interactive(&mut session, rows).await?;
    } else if config.json {
        println!("{}", serde_json::to_string_pretty(&session.view())?);
    } else {
        print!("{}", render_text(&session.view(), rows));
    }
    monitor.log_phase("Render");

    if let Some(path) = &config.export {
        // Export paths are taken as given, not relative to the data directory.
        let out = LocalStorage::new(String::new());
        session
            .export_map(&out, path)
            .await
            .with_context(|| format!("exporting map to {}", path))?;
        println!("📁 Map exported to: {}", path);
        monitor.log_phase("Export");
    }

    Ok(())
}

/// Reads one action per line from stdin. Errors are reported and the
/// session keeps its previous filter.
async fn interactive(session: &mut Session, rows: usize) -> anyhow::Result<()> {
    print!("{}", render_text(&session.view(), rows));
    eprintln!("Enter an action (reset, inconsistencies, filter:<kind>:k=v, select:<table>:<row>), show, or quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" => break,
            "show" => {
                print!("{}", render_text(&session.view(), rows));
                continue;
            }
            _ => {}
        }

        match input
            .parse::<Action>()
            .and_then(|action| session.apply(&action))
        {
            Ok(Redraw::Needed) => print!("{}", render_text(&session.view(), rows)),
            Ok(Redraw::Skipped) => eprintln!("Filter unchanged: {}", session.filter()),
            Err(e) => {
                tracing::warn!("⚠️ {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
            }
        }
    }

    tracing::info!("👋 Session closed with filter {}", session.filter());
    Ok(())
}
