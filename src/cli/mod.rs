use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgMatches, Command};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{PlannerConfig, ServerConfig},
    core::{TripPlanner, PROBE_PROMPT},
    error::PlannerError,
    server,
    services::{
        extract::extract_json_object,
        gemini_client::{GeminiClient, GenerateContentRequest},
    },
    types::ItineraryRequest,
};

/// CLI entry point for the trip-planner tool
pub async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let matches = command().get_matches();

    let mut config = PlannerConfig::from_env().context("invalid planner configuration")?;
    apply_overrides(&mut config, &matches);

    match matches.subcommand() {
        Some(("serve", sub)) => serve(config, sub).await,
        Some(("plan", sub)) => plan(config, sub).await,
        Some(("check", _)) => check(config).await,
        _ => bail!("a subcommand is required"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("trip_planner_rs=info,trip_planner=info,tower_http=info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn command() -> Command {
    Command::new("trip-planner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Turn a trip description into a structured itinerary with Gemini")
        .subcommand_required(true)
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .global(true)
                .help("Gemini API key (or set GEMINI_API_KEY env var)"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .global(true)
                .help("Gemini model to use (or set GEMINI_MODEL)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .global(true)
                .help("Gemini API base URL (or set GEMINI_BASE_URL)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Per-request timeout in seconds"),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP service exposing POST /plan-trip")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("Interface to bind (or set HOST)"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .value_parser(value_parser!(u16))
                        .help("Port to listen on (or set PORT)"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Plan a single trip and print the itinerary JSON")
                .arg(
                    Arg::new("prompt")
                        .help("Natural-language trip description")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("image")
                        .short('i')
                        .long("image")
                        .value_name("PATH")
                        .help("Optional inspiration image"),
                )
                .arg(
                    Arg::new("mime")
                        .long("mime")
                        .value_name("TYPE")
                        .help("MIME type of the image (guessed from the extension otherwise)"),
                ),
        )
        .subcommand(Command::new("check").about("Send a probe prompt to verify the Gemini key works"))
}

fn apply_overrides(config: &mut PlannerConfig, matches: &ArgMatches) {
    if let Some(key) = matches.get_one::<String>("api-key") {
        config.api_key = Some(key.clone());
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config.model = model.clone();
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.base_url = base_url.clone();
    }
    if let Some(seconds) = matches.get_one::<u64>("timeout") {
        config.request_timeout = Duration::from_secs(*seconds);
    }
}

async fn serve(config: PlannerConfig, matches: &ArgMatches) -> anyhow::Result<()> {
    let mut server_config = ServerConfig::from_env().context("invalid server configuration")?;
    if let Some(host) = matches.get_one::<String>("host") {
        server_config.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        server_config.port = *port;
    }

    let planner = Arc::new(TripPlanner::from_config(&config)?);
    if !planner.is_configured() {
        warn!("GEMINI_API_KEY is not set; /plan-trip will fail until it is");
    }
    info!(model = %config.model, "using Gemini model");

    server::serve(planner, &server_config)
        .await
        .with_context(|| format!("server on {} failed", server_config.bind_address()))
}

async fn plan(config: PlannerConfig, matches: &ArgMatches) -> anyhow::Result<()> {
    let prompt = matches
        .get_one::<String>("prompt")
        .context("prompt is required")?;
    let mut request = ItineraryRequest::new(prompt.as_str())?;

    if let Some(path) = matches.get_one::<String>("image") {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image {path}"))?;
        let mime = matches
            .get_one::<String>("mime")
            .cloned()
            .or_else(|| guess_image_mime(Path::new(path)).map(str::to_string));
        request = request.with_image(bytes, mime);
    }

    let planner = TripPlanner::from_config(&config)?;
    info!(model = %config.model, "planning trip");

    match planner.plan_trip(request).await {
        Ok(itinerary) => {
            println!("{}", serde_json::to_string_pretty(&itinerary)?);
            Ok(())
        }
        Err(e) => {
            error!(code = e.error_code(), "planning failed: {}", e);
            eprintln!("{}", failure_report(&e));
            Err(e.into())
        }
    }
}

async fn check(config: PlannerConfig) -> anyhow::Result<()> {
    let client = GeminiClient::new(config.api_key.clone(), config.request_timeout)?
        .with_base_url(config.base_url.clone())
        .with_model(config.model.clone());

    println!(
        "API key: {}",
        if config.api_key.is_some() { "found" } else { "missing" }
    );
    println!("Calling {} with a probe prompt...", client.model());

    let text = match client
        .generate_content(&GenerateContentRequest::new(PROBE_PROMPT))
        .await
    {
        Ok(text) => text,
        Err(e) => {
            error!(code = e.error_code(), "probe failed: {}", e);
            eprintln!("{}", failure_report(&e));
            return Err(e.into());
        }
    };

    println!("Response text: {}", text);
    match extract_json_object(&text) {
        Some(parsed) => println!("Valid JSON parsed: {}", serde_json::Value::Object(parsed)),
        None => println!("Response is not JSON"),
    }
    Ok(())
}

/// Structured `{ "error": { code, message, retryable } }` for stderr.
fn failure_report(err: &PlannerError) -> String {
    serde_json::to_string_pretty(&err.to_error_payload()).unwrap_or_else(|_| err.to_string())
}

fn guess_image_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
