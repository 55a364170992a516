use std::sync::Arc;
use std::time::Instant;

use tokio::time::sleep;
use tracing::{error, info, warn};

use envstation::acquire::{self, CycleOutcome};
use envstation::clock::{SystemTimeSource, TimeSource};
use envstation::config::Config;
use envstation::display::{ConsoleDisplay, DisplayRenderer};
use envstation::http;
use envstation::link::GatewayProbeLink;
use envstation::model::SnapshotCell;
use envstation::retry::RetryPolicy;
use envstation::sensor::SimulatedSensor;
use envstation::supervisor::Supervisor;
use envstation::watchdog::{Heartbeat, Watchdog};

/// Exit code the platform supervisor treats as "restart me".
const RESTART_EXIT_CODE: i32 = 10;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting environmental station");
    info!("HTTP server: {}", config.http_addr);
    info!("Link probe: {}", config.link.probe_addr);
    info!(
        "Time source: {} (UTC offset {}s)",
        config.time.server, config.time.utc_offset_secs
    );
    info!(
        "Capabilities: humidity={}, web_server={}",
        config.capabilities.has_humidity, config.capabilities.has_web_server
    );

    let watchdog = Watchdog::new(config.supervisor.watchdog_timeout);
    watchdog.heartbeat();
    let snapshot = SnapshotCell::new();

    let mut time = match SystemTimeSource::new(config.time.utc_offset_secs, config.time.server.clone()) {
        Ok(time) => time,
        Err(e) => {
            error!("Failed to build time source: {}", e);
            std::process::exit(1);
        }
    };
    let link = match GatewayProbeLink::new(&config.link) {
        Ok(link) => link,
        Err(e) => {
            error!("Failed to build network link: {}", e);
            std::process::exit(1);
        }
    };
    let mut display = ConsoleDisplay;
    let mut sensor = SimulatedSensor::new(config.capabilities.has_humidity);

    // Boot-time sync, bounded and heartbeating, before the loop starts.
    // If it fails here the supervisor retries on its own cadence.
    display.show_status("Syncing Time...");
    let boot_sync = RetryPolicy {
        max_attempts: config.time.boot_sync_attempts,
        per_attempt_delay: config.time.boot_sync_delay,
    };
    match boot_sync.run(&watchdog, async || time.resync()).await {
        Ok(()) => info!("Initial time sync successful"),
        Err(e) => warn!("Initial time sync failed, will retry in loop: {}", e),
    }

    let reconnect_policy = RetryPolicy {
        max_attempts: config.link.reconnect_attempts,
        per_attempt_delay: config.link.reconnect_delay,
    };
    let heartbeat: Arc<dyn Heartbeat> = Arc::new(watchdog.clone());
    let mut supervisor = Supervisor::new(
        config.supervisor.clone(),
        link,
        reconnect_policy,
        heartbeat,
    );

    // HTTP serving is decoupled from the cycle cadence; a request between
    // cycles is answered from the last published snapshot.
    let server_handle = if config.capabilities.has_web_server {
        let app = http::create_router(snapshot.clone(), config.capabilities.has_humidity);
        let listener = match tokio::net::TcpListener::bind(&config.http_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind to {}: {}", config.http_addr, e);
                std::process::exit(1);
            }
        };
        info!("HTTP server listening on {}", config.http_addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("HTTP server error: {}", e);
            }
        })
    } else {
        tokio::spawn(std::future::pending::<()>())
    };

    // Main cycle: supervisor checks, then acquisition, then presentation,
    // then a bounded sleep.
    let loop_snapshot = snapshot.clone();
    let tick_period = config.tick_period;
    // The supervisor's retry closures borrow across awaits in a way the
    // compiler cannot prove `Send`, so this future is polled on the main
    // task via `select!` rather than spawned.
    let main_loop = async move {
        loop {
            if let Err(fatal) = supervisor
                .tick(Instant::now(), &mut time, &mut display)
                .await
            {
                return fatal;
            }

            let outcome =
                acquire::run_cycle(&mut time, &mut sensor, &loop_snapshot, &mut display).await;
            if outcome == CycleOutcome::Published {
                let current = loop_snapshot.read().await;
                display.render(&current);
            }

            sleep(tick_period).await;
        }
    };

    let watchdog_handle = tokio::spawn(watchdog.clone().watch());

    tokio::select! {
        fatal = main_loop => {
            error!("Fatal condition: {}. Restarting.", fatal);
            std::process::exit(RESTART_EXIT_CODE);
        },
        result = watchdog_handle => match result {
            Ok(fatal) => {
                error!("Fatal condition: {}. Restarting.", fatal);
                std::process::exit(RESTART_EXIT_CODE);
            }
            Err(e) => {
                error!("Watchdog task failed: {}", e);
                std::process::exit(1);
            }
        },
        _ = server_handle => {
            error!("HTTP server terminated");
            std::process::exit(1);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
}
