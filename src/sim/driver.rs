//! The simulation driver: builds the world, spawns the pipeline processes,
//! wires the streams, and runs the flight, ATC and radar tasks for the
//! configured duration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use acx_core::airline::build_world;
use acx_core::{FlightScheduler, RunwayBoard, SpeedBand};
use acx_ipc::{connect_with_retry, SocketDir, ViolationFrame};

use crate::config::{Config, CONNECT_ATTEMPTS, CONNECT_DELAY};
use crate::shutdown::cancel_on_termination;
use crate::sim::{atc, flight, radar};
use crate::snapshot;

struct NamedChild {
    role: &'static str,
    child: Child,
}

fn spawn_child(role: &'static str, config: &Config) -> Result<NamedChild> {
    let exe = std::env::current_exe().context("locating own executable")?;
    let child = Command::new(exe)
        .arg(role)
        .env("ACX_SOCKET_DIR", &config.socket_dir)
        .env("ACX_LOCK_FILE", &config.lock_file)
        .env("ACX_AUTO_PAY", if config.auto_pay { "1" } else { "0" })
        .env("ACX_AUTO_APPROVE", if config.auto_approve { "1" } else { "0" })
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning {role} process"))?;
    info!(role, pid = child.id(), "child process spawned");
    Ok(NamedChild { role, child })
}

/// SIGTERM the children, then wait; anything still alive after the grace
/// period is killed.
async fn stop_children(mut children: Vec<NamedChild>, grace: Duration) {
    for named in &children {
        if let Some(pid) = named.child.id() {
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }
    }
    for named in &mut children {
        match tokio::time::timeout(grace, named.child.wait()).await {
            Ok(Ok(status)) => info!(role = named.role, %status, "child exited"),
            Ok(Err(e)) => warn!(role = named.role, error = %e, "failed to reap child"),
            Err(_) => {
                warn!(role = named.role, "child ignored SIGTERM, killing");
                if let Err(e) = named.child.kill().await {
                    warn!(role = named.role, error = %e, "kill failed");
                }
            }
        }
    }
}

/// Run the full simulation.
pub async fn run(config: Config) -> Result<()> {
    let sockets = SocketDir::new(&config.socket_dir);
    sockets
        .ensure()
        .await
        .with_context(|| format!("creating socket directory {}", sockets.root().display()))?;

    let world = Arc::new(build_world(config.max_aircraft));
    anyhow::ensure!(!world.is_empty(), "no aircraft configured");
    info!(aircraft = world.len(), duration = ?config.sim_duration, "simulation starting");

    let children = vec![
        spawn_child("avn-generator", &config)?,
        spawn_child("airline-portal", &config)?,
        spawn_child("payment-service", &config)?,
    ];

    let violations = connect_with_retry(&sockets.violations(), CONNECT_ATTEMPTS, CONNECT_DELAY)
        .await
        .context("connecting to the notice generator's violation stream")?;

    let scheduler = Arc::new(FlightScheduler::new());
    let board = Arc::new(RunwayBoard::new());
    let cancel = cancel_on_termination();

    let atc_task = tokio::spawn(atc::run_atc_loop(
        world.clone(),
        scheduler.clone(),
        board.clone(),
        config.atc_interval,
        cancel.clone(),
    ));
    let radar_task = tokio::spawn(radar::run_radar_loop(
        world.clone(),
        scheduler.clone(),
        violations,
        config.radar_interval,
        cancel.clone(),
    ));

    // Launch flight tasks airline by airline, staggered for readable logs
    // the same way the fleet rolls out of the gates in waves.
    let timing = flight::FlightTiming::from(&config);
    let mut flights: Vec<JoinHandle<()>> = Vec::with_capacity(world.len());
    let mut current_airline = String::new();
    for id in world.ids() {
        let airline = world.get(id).airline().to_string();
        if airline != current_airline {
            if !current_airline.is_empty() {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            current_airline = airline;
        }
        flights.push(tokio::spawn(flight::fly(
            world.clone(),
            id,
            scheduler.clone(),
            board.clone(),
            timing,
            cancel.clone(),
        )));
    }
    info!("all aircraft launched");

    tokio::select! {
        _ = tokio::time::sleep(config.sim_duration) => info!("simulation duration elapsed"),
        _ = cancel.cancelled() => info!("terminated early"),
    }
    cancel.cancel();

    // Flight tasks finish their current dwell and drain naturally.
    let drain = async {
        for handle in flights {
            let _ = handle.await;
        }
        let _ = atc_task.await;
        let _ = radar_task.await;
    };
    if tokio::time::timeout(config.shutdown_grace, drain).await.is_err() {
        warn!("some tasks did not drain before the grace deadline");
    }

    let snap = snapshot::capture(&world, &scheduler, &board);
    match serde_json::to_string_pretty(&snap) {
        Ok(json) => info!("final state:\n{json}"),
        Err(e) => warn!(error = %e, "could not serialize final snapshot"),
    }

    stop_children(children, config.shutdown_grace).await;
    info!("simulation complete");
    Ok(())
}

/// `--test`: run only the notice generator and feed it canned violations.
pub async fn run_test_mode(config: Config) -> Result<()> {
    info!("running in test mode: emitting canned violation frames");
    let sockets = SocketDir::new(&config.socket_dir);
    sockets.ensure().await.context("creating socket directory")?;

    // Stand in for the airline portal so the generator has somewhere to
    // forward its summaries.
    let notices_listener = acx_ipc::bind(&sockets.notices())
        .await
        .context("binding the notice stream")?;

    let children = vec![spawn_child("avn-generator", &config)?];

    let mut violations = connect_with_retry(&sockets.violations(), CONNECT_ATTEMPTS, CONNECT_DELAY)
        .await
        .context("connecting to the notice generator's violation stream")?;
    let mut notices = acx_ipc::accept_one(&notices_listener)
        .await
        .context("accepting the generator's notice stream")?;

    let drain = tokio::spawn(async move {
        while let Ok(Some(frame)) = acx_ipc::PaymentFrame::read_from(&mut notices).await {
            info!(
                notice = %frame.notice_id,
                flight = %frame.flight_number,
                class = %frame.fine_class,
                amount = frame.amount_due,
                "notice summary received"
            );
        }
    });

    let canned = [
        ViolationFrame::new("PK123", "PIA", 650, SpeedBand { min: 400, max: 600 }),
        ViolationFrame::new("FX456", "FedEx", 300, SpeedBand { min: 240, max: 290 }),
        ViolationFrame::new("PAF789", "PakistanAirforce", 35, SpeedBand { min: 15, max: 30 }),
    ];
    for frame in &canned {
        frame
            .write_to(&mut violations)
            .await
            .with_context(|| format!("sending test violation for {}", frame.flight_number))?;
        info!(flight = %frame.flight_number, speed = frame.speed, "test violation sent");
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    // Let the generator process everything before tearing down.
    tokio::time::sleep(Duration::from_secs(3)).await;
    drop(violations);
    stop_children(children, config.shutdown_grace).await;
    drain.abort();
    info!("test run complete");
    Ok(())
}
