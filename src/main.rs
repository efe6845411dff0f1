mod background;
mod config;
mod display;
mod media;
mod models;
mod storage;
mod web;

use crate::background::BackgroundController;
use crate::media::{DefaultMediaLoader, PreloadCache, Preloader};
use crate::storage::load_catalog;
use chrono::Local;
use colored::*;
use config::init_config;
use env_logger::Builder;
use log::{error, info, LevelFilter};
use std::io::Write;
use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() {
    // Initialize the logger with a custom format that includes timestamps and colors
    Builder::new()
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Error => record.level().to_string().red().bold(),
                log::Level::Warn => record.level().to_string().yellow().bold(),
                log::Level::Info => record.level().to_string().green(),
                log::Level::Debug => record.level().to_string().blue(),
                log::Level::Trace => record.level().to_string().purple(),
            };

            let message = match record.level() {
                log::Level::Error => record.args().to_string().red(),
                log::Level::Warn => record.args().to_string().yellow(),
                log::Level::Info => record.args().to_string().normal(),
                log::Level::Debug => record.args().to_string().blue(),
                log::Level::Trace => record.args().to_string().purple(),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                level,
                message
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    info!("Starting random background media server");

    let config = init_config();

    if let Err(errors) = config.validate() {
        for error in errors {
            error!("{}", error);
        }
        std::process::exit(1);
    }

    let catalog = match load_catalog(config.catalog_path.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let loader = Arc::new(DefaultMediaLoader::new(config.media_dir.clone()));
    let preloader = Preloader::new(loader, PreloadCache::new());
    let controller = BackgroundController::new(
        catalog,
        preloader,
        config.engine_settings(),
        config.reduced_motion,
    )
    .shared();

    // Set up signal handlers for clean shutdown
    let controller_for_shutdown = controller.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received termination signal, shutting down...");

        // try_lock, we are in a signal handler
        if let Ok(mut controller) = controller_for_shutdown.try_lock() {
            // Drop the engine without awaiting, tasks get aborted
            controller.stop_now();
        } else {
            println!("Could not acquire background lock for shutdown");
        }

        std::process::exit(0);
    }) {
        error!("Error setting Ctrl-C handler: {}", e);
    }

    let app = web::router(controller.clone(), &config.media_dir);

    let ip_addr: std::net::IpAddr = match config.interface.parse() {
        Ok(ip_addr) => ip_addr,
        Err(e) => {
            error!("Invalid network interface address {}: {}", config.interface, e);
            std::process::exit(1);
        }
    };
    let addr = SocketAddr::from((ip_addr, config.port));

    info!("Server running on http://{}", addr);

    if let Err(e) = axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .unwrap_or_else(|e| {
                error!("Failed to bind to address {}: {}", addr, e);
                std::process::exit(1);
            }),
        app,
    )
    .await
    {
        error!("Server error: {}", e);
    }

    info!("Application exiting, stopping background...");
    controller.lock().await.shutdown().await;
}
