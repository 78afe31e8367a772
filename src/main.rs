use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use venue_discovery::utils::{logger, validation::Validate};
use venue_discovery::{
    ApiResponse, CliConfig, Command, DiscoveryConfig, DiscoveryError, DiscoveryService,
    InMemoryVenueStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting venue-discovery");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = match &cli.config {
        Some(path) => DiscoveryConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?,
        None => DiscoveryConfig::default(),
    };

    // 命令列覆蓋設定
    if let Some(venues) = &cli.venues {
        config.store.venues_file = venues.clone();
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let store = InMemoryVenueStore::from_file(&config.store.venues_file).with_context(|| {
        format!("failed to load venues from '{}'", config.store.venues_file)
    })?;
    tracing::info!("📁 Loaded {} venues", store.len());

    let service = DiscoveryService::new(store, config);

    let exit_code = match cli.command {
        Command::Search { params } => {
            let raw = Command::raw_params(&params);
            match service.search_params(&raw).await {
                Ok(result) => emit(&ApiResponse::from_search(result))?,
                Err(e) => emit_error::<Vec<()>>(&e)?,
            }
        }
        Command::Suggest { params, count } => {
            let raw = Command::raw_params(&params);
            match service.suggest_params(&raw, count).await {
                Ok(items) => emit(&ApiResponse::success(items, "Suggested venues fetched successfully"))?,
                Err(e) => emit_error::<Vec<()>>(&e)?,
            }
        }
        Command::Show { slug } => match service.get_by_slug(&slug).await {
            Ok(detail) => emit(&ApiResponse::success(detail, "Venue fetched successfully"))?,
            Err(e) => emit_error::<()>(&e)?,
        },
        Command::Midpoint {
            from,
            to,
            radius_km,
        } => match service.near_midpoint(from, to, radius_km).await {
            Ok(items) => emit(&ApiResponse::success(items, "Venues near midpoint fetched successfully"))?,
            Err(e) => emit_error::<Vec<()>>(&e)?,
        },
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn emit<T: Serialize>(response: &ApiResponse<T>) -> anyhow::Result<i32> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(0)
}

fn emit_error<T: Serialize>(err: &DiscoveryError) -> anyhow::Result<i32> {
    tracing::error!(
        "❌ Request failed: {} (Category: {:?}, Status: {})",
        err,
        err.category(),
        err.status_code()
    );
    let response: ApiResponse<T> = ApiResponse::error(err);
    println!("{}", serde_json::to_string_pretty(&response)?);

    // 找不到資料不算程式錯誤
    Ok(match err.status_code() {
        404 => 0,
        400 => 2,
        _ => 1,
    })
}
