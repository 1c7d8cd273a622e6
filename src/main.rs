use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

mod api;
mod cli;
mod config;
mod error;
mod metrics;
mod models;
mod services;
mod state;

use api::{get_metrics, health, list_targets, notification_status};
use cli::CommandArgs;
use config::Settings;
use metrics::{ConsoleSink, MetricsRegistry, PrometheusSink};
use models::Registry;
use services::{scheduler, Sampler, SysinfoInspector};
use state::new_state;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandArgs::parse();
    let settings = Settings::load(&args)?;
    let registry = Registry::build(settings.targets.clone())
        .context("pid-tracker needs at least one usable pid file")?;

    let tracked = registry.len();

    if args.once {
        return run_once(registry, &settings);
    }

    let metrics = Arc::new(MetricsRegistry::new().context("failed to register metrics")?);
    let sampler = Sampler::new(
        registry,
        Box::new(SysinfoInspector::new()),
        Box::new(PrometheusSink::new(metrics.clone())),
        settings.interval,
        settings.notification.clone(),
    )
    .with_verbose(settings.verbose);
    let state = new_state(sampler);

    print_banner(&args, &settings, tracked);

    actix_rt::spawn(scheduler::run(
        state.clone(),
        Duration::from_secs(settings.tick_secs()),
    ));

    let bind_address = format!("{}:{}", args.address, args.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::from(metrics.clone()))
            .route("/api/targets", web::get().to(list_targets))
            .route("/api/notification", web::get().to(notification_status))
            .route("/metrics", web::get().to(get_metrics))
            .route("/health", web::get().to(health))
    })
    .bind(&bind_address)
    .with_context(|| format!("cannot bind {}", bind_address))?
    .run()
    .await?;

    Ok(())
}

/// Manual harness: one cycle against the real process table, printed to stdout.
fn run_once(registry: Registry, settings: &Settings) -> anyhow::Result<()> {
    let mut sampler = Sampler::new(
        registry,
        Box::new(SysinfoInspector::new()),
        Box::new(ConsoleSink),
        settings.interval,
        settings.notification.clone(),
    )
    .with_verbose(true);

    let report = sampler.run_cycle(SystemTime::now());
    println!(
        "any-running={} all-running={} samples={} notified={}",
        report.liveness.any_running,
        report.liveness.all_running,
        report.samples_emitted,
        report.notified
    );
    Ok(())
}

fn print_banner(args: &CommandArgs, settings: &Settings, tracked: usize) {
    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║      PID Tracker v{:<40}║", env!("CARGO_PKG_VERSION"));
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
    println!("🚀 Server starting on http://{}:{}", args.address, args.port);
    println!(
        "⏱  Sampling {} pid file(s) every {}s",
        tracked,
        settings.tick_secs()
    );
    println!();
    println!("📋 Available endpoints:");
    println!("  GET    /api/targets            - Tracked targets and their state");
    println!("  GET    /api/notification       - One-shot notification status");
    println!("  GET    /metrics                - Prometheus metrics");
    println!("  GET    /health                 - Health check");
    println!("═══════════════════════════════════════════════════════════");
}
