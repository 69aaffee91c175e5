use std::path::{Path, PathBuf};

use absence_recon::api::{AppState, create_router};
use absence_recon::config::{ConfigLoader, ReconConfig};
use absence_recon::io::{read_table_from_path, save_report};
use absence_recon::reconciliation::{ReconInputs, run};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reconciles HCM absences against the downstream absence exports.
#[derive(Parser, Debug)]
#[command(name = "absence-recon", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serves the upload API.
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
        /// Directory holding sources.yaml and report.yaml.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reconciles five workbooks on disk and writes the result workbook.
    Run {
        #[arg(long)]
        hcm: PathBuf,
        #[arg(long)]
        fractioned: PathBuf,
        #[arg(long)]
        total: PathBuf,
        #[arg(long)]
        monetary_segovia: PathBuf,
        #[arg(long)]
        monetary_marmato: PathBuf,
        /// Defaults to the configured output file name.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "absence_recon=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { addr, config } => {
            let loader = load_config(config.as_deref())?;
            let app = create_router(AppState::new(loader));

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("cannot bind {}", addr))?;
            tracing::info!("Listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Run {
            hcm,
            fractioned,
            total,
            monetary_segovia,
            monetary_marmato,
            output,
            config,
        } => {
            let config = load_config(config.as_deref())?.into_config();
            let sources = &config.sources;

            let inputs = ReconInputs {
                primary: read_table_from_path(&hcm, "hcm", sources.primary.header_skip_rows)?,
                fractioned: read_table_from_path(
                    &fractioned,
                    "fraccionadas_ps",
                    sources.fractioned.source.header_skip_rows,
                )?,
                total: read_table_from_path(&total, "total_ps", sources.total.header_skip_rows)?,
                monetary: vec![
                    read_table_from_path(
                        &monetary_segovia,
                        "dinero_segovia",
                        sources.monetary.header_skip_rows,
                    )?,
                    read_table_from_path(
                        &monetary_marmato,
                        "dinero_marmato",
                        sources.monetary.header_skip_rows,
                    )?,
                ],
            };

            let report = run(inputs, &config)?;
            let output =
                output.unwrap_or_else(|| PathBuf::from(&config.report.output_file_name));
            save_report(&report, &output)?;

            for table in report.sheets() {
                println!("{:<16} {:>6} row(s)", table.name, table.len());
            }
            println!("Result written to {}", output.display());
        }
    }

    Ok(())
}

fn load_config(dir: Option<&Path>) -> Result<ConfigLoader> {
    let loader = match dir {
        Some(dir) => ConfigLoader::load(dir)
            .with_context(|| format!("cannot load configuration from {}", dir.display()))?,
        None => ConfigLoader::from_config(ReconConfig::default())?,
    };
    Ok(loader)
}
