//! Serve command - HTTP trigger for extraction runs.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use clap::Args;
use console::style;
use tracing::{error, info};

use docint_core::models::config::DocintConfig;
use docint_core::pipeline::read_report;
use docint_core::{build_vectorizer, DocintError, FinalReport, RunCoordinator, VectorizerCell};

use super::load_config;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,
}

/// Shared by every worker; the encoder is loaded on the first run.
struct AppState {
    config: DocintConfig,
    vectorizer: VectorizerCell,
}

impl AppState {
    fn extract(&self) -> Result<FinalReport, DocintError> {
        let vectorizer = self
            .vectorizer
            .get_or_try_init(|| build_vectorizer(&self.config.vectorizer))?;
        RunCoordinator::new(self.config.clone(), vectorizer).run_and_persist()
    }
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let state = Arc::new(AppState {
        config,
        vectorizer: VectorizerCell::new(),
    });

    println!(
        "{} Listening on http://{}:{}",
        style("ℹ").blue(),
        args.host,
        args.port
    );

    // actix runs its own system on a dedicated thread
    let (host, port) = (args.host, args.port);
    let server = std::thread::spawn(move || {
        actix_web::rt::System::new().block_on(start(state, host, port))
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
        joined = tokio::task::spawn_blocking(move || server.join()) => {
            match joined? {
                Ok(result) => Ok(result?),
                Err(_) => anyhow::bail!("HTTP server thread panicked"),
            }
        }
    }
}

async fn start(state: Arc<AppState>, host: String, port: u16) -> std::io::Result<()> {
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .route("/health", web::get().to(health))
            .route("/extract", web::post().to(extract))
            .route("/results", web::get().to(results))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

async fn extract(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    let state = state.get_ref().clone();
    let outcome = web::block(move || state.extract()).await;

    Ok(match outcome {
        Ok(Ok(report)) => HttpResponse::Ok().json(report),
        Ok(Err(e)) => {
            error!("Extraction run failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
        Err(e) => {
            error!("Extraction task failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    })
}

/// The report of the last completed run.
async fn results(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    let path = state.config.output.path.clone();
    if !path.exists() {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({ "error": "no results yet" })));
    }

    Ok(match web::block(move || read_report(&path)).await {
        Ok(Ok(report)) => HttpResponse::Ok().json(report),
        Ok(Err(e)) => HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
    })
}
