//! pdfsplit server
//!
//! Converts between a PDF's bookmark tree and flat CSV range tables, and
//! splits PDFs into fragments described by such a table. Provides REST API
//! endpoints for:
//!
//! - Bookmark export (`POST /api/bookmarks/zip`)
//! - CSV-driven split (`POST /api/split`)
//!
//! The same pipelines are available offline through the `bookmarks` and
//! `split` subcommands.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::{Args, Parser, Subcommand};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pdfsplit_core::{export_bookmarks_zip, split_pdf_by_csv};

mod api;
mod error;
#[cfg(test)]
mod tests;

use api::{handle_export_bookmarks, handle_health, handle_split, BOOKMARKS_ARCHIVE, SPLIT_ARCHIVE};

const MEGABYTE: usize = 1024 * 1024;

/// Command-line arguments for pdfsplit
#[derive(Parser, Debug)]
#[command(name = "pdfsplit", version)]
#[command(about = "Export PDF bookmarks as CSV range tables and split PDFs by CSV")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Write the bookmarks of a PDF as a ZIP of per-depth CSV files
    Bookmarks {
        /// Source PDF
        pdf: PathBuf,

        /// Output archive
        #[arg(short, long, default_value = BOOKMARKS_ARCHIVE)]
        output: PathBuf,
    },

    /// Split a PDF into the page ranges flagged in a CSV file
    Split {
        /// Source PDF
        pdf: PathBuf,

        /// CSV with columns split,name,from,to
        csv: PathBuf,

        /// Output archive
        #[arg(short, long, default_value = SPLIT_ARCHIVE)]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "PDFSPLIT_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "PDFSPLIT_PORT")]
    port: u16,

    /// Largest accepted request body in megabytes
    #[arg(long, default_value = "64", env = "PDFSPLIT_MAX_UPLOAD_MB")]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Bookmarks { pdf, output } => {
            let bytes = read_input(&pdf)?;
            let archive = export_bookmarks_zip(&bytes)?;
            write_output(&output, &archive)
        }
        Command::Split { pdf, csv, output } => {
            let pdf_bytes = read_input(&pdf)?;
            let csv_bytes = read_input(&csv)?;
            info!("Splitting {}", pdf.display());
            let archive = split_pdf_by_csv(&pdf_bytes, &csv_bytes)?;
            write_output(&output, &archive)
        }
    }
}

/// Build the HTTP router
fn app(max_upload_bytes: usize) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/bookmarks/zip", post(handle_export_bookmarks))
        .route("/api/split", post(handle_split))
        // Apply middleware
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload limit: {} MB", args.max_upload_mb);

    axum::serve(listener, app(args.max_upload_mb * MEGABYTE)).await?;

    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(path: &Path, archive: &[u8]) -> anyhow::Result<()> {
    fs::write(path, archive).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} ({} bytes)", path.display(), archive.len());
    Ok(())
}
