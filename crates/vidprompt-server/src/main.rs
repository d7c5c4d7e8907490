//! VidPrompt — prompt-driven video editing server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use vidprompt_core::VidPromptConfig;
use vidprompt_render::redact_endpoint;
use vidprompt_server::{build_router, AppState};
use vidprompt_translate::OracleConfig;

fn resolve_data_dir() -> PathBuf {
    std::env::var("VIDPROMPT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        None => "(not set)".to_string(),
        Some(s) if s.chars().count() <= 8 => "****".to_string(),
        Some(s) => {
            let tail: String = s.chars().skip(s.chars().count() - 4).collect();
            format!("****{}", tail)
        }
    }
}

/// Human-readable dump of the resolved configuration, secrets masked.
fn config_report(config: &VidPromptConfig, oracle: &OracleConfig) -> String {
    let oracle_key = oracle.resolve().map(|resolved| resolved.api_key);
    let summary = oracle.summary();

    let lines = [
        "VidPrompt configuration".to_string(),
        String::new(),
        format!("  data dir          {}", config.data_paths.root.display()),
        format!("  port              {}", config.port),
        format!("  max upload        {} bytes", config.max_upload_bytes),
        String::new(),
        format!("  engine endpoint   {}", redact_endpoint(&config.engine.endpoint)),
        format!(
            "  download base     {}",
            config
                .engine
                .download_base
                .as_deref()
                .map(redact_endpoint)
                .unwrap_or_else(|| "(none)".to_string())
        ),
        format!("  engine api key    {}", mask(config.engine.api_key.as_deref())),
        format!("  engine timeout    {}s", config.engine.timeout.as_secs()),
        String::new(),
        format!("  oracle provider   {}", summary.provider),
        format!("  oracle model      {}", summary.model),
        format!("  oracle base url   {}", summary.base_url),
        format!("  oracle api key    {}", mask(oracle_key.as_deref())),
        format!("  oracle timeout    {}s", summary.timeout_secs),
    ];
    lines.join("\n")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--check-config" | "check-config" => {
                let config = VidPromptConfig::from_env(resolve_data_dir())?;
                let oracle = OracleConfig::load(&config.data_paths.oracle_config_file);
                println!("{}", config_report(&config, &oracle));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("VidPrompt — edit videos with natural-language prompts");
                println!();
                println!("Usage: vidprompt [command]");
                println!();
                println!("Commands:");
                println!("  (none)         Start the server");
                println!("  check-config   Print the resolved configuration and exit");
                println!("  help           Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'vidprompt help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = VidPromptConfig::from_env(&data_dir)?;
    let port = config.port;

    let state = Arc::new(AppState::new(config)?);
    info!("Job store: {}", state.store().backend());

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("VidPrompt server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
