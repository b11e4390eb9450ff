//! The notice generator process.
//!
//! Reads violation frames from the simulator and payment confirmations
//! from the payment service, owns the list of issued notices, and forwards
//! a summary to the airline portal on every change. Paid-flag flips are
//! additionally guarded by the cross-process lock so a second generator
//! instance cannot race this one.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use acx_core::airline::class_for_airline;
use acx_core::notice::{FineClass, Notice, NoticeStore, PaidOutcome};
use acx_core::{unix_now, SpeedBand};
use acx_ipc::{
    accept_one, bind, connect_with_retry, CrossProcessLock, PaymentFrame, SocketDir,
    ViolationFrame,
};

use crate::config::{Config, CONNECT_ATTEMPTS, CONNECT_DELAY};
use crate::shutdown::cancel_on_termination;

type SharedStream = Arc<Mutex<UnixStream>>;

pub async fn run(config: Config) -> Result<()> {
    // The lock is mandatory. If it cannot be created the generator refuses
    // to run rather than flipping paid flags unguarded.
    let lock = CrossProcessLock::create(&config.lock_file)
        .context("creating the cross-process notice lock")?;

    let sockets = SocketDir::new(&config.socket_dir);
    sockets.ensure().await.context("creating socket directory")?;
    let violations = bind(&sockets.violations())
        .await
        .context("binding the violation stream")?;
    let confirmations = bind(&sockets.confirmations())
        .await
        .context("binding the confirmation stream")?;
    let portal = connect_with_retry(&sockets.notices(), CONNECT_ATTEMPTS, CONNECT_DELAY)
        .await
        .context("connecting to the airline portal")?;

    info!(pid = std::process::id(), "notice generator running");

    let store = Arc::new(NoticeStore::new());
    let portal: SharedStream = Arc::new(Mutex::new(portal));
    let cancel = cancel_on_termination();

    let violation_task = tokio::spawn(violation_loop(
        violations,
        store.clone(),
        portal.clone(),
        cancel.clone(),
    ));
    let confirmation_task = tokio::spawn(confirmation_loop(
        confirmations,
        lock,
        store.clone(),
        portal,
        cancel,
    ));
    let _ = tokio::join!(violation_task, confirmation_task);

    info!(notices = store.len(), "notice generator stopping");
    Ok(())
}

async fn accept_or_cancel(
    listener: &UnixListener,
    cancel: &CancellationToken,
    what: &str,
) -> Option<UnixStream> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        result = accept_one(listener) => match result {
            Ok(stream) => Some(stream),
            Err(e) => {
                error!(stream = what, error = %e, "accept failed");
                None
            }
        }
    }
}

async fn violation_loop(
    listener: UnixListener,
    store: Arc<NoticeStore>,
    portal: SharedStream,
    cancel: CancellationToken,
) {
    let Some(mut stream) = accept_or_cancel(&listener, &cancel, "violations").await else {
        return;
    };
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            result = ViolationFrame::read_from(&mut stream) => match result {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("violation stream closed by the simulator");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "violation stream broken, discarding partial frame");
                    break;
                }
            }
        };
        handle_violation(frame, &store, &portal).await;
    }
}

async fn handle_violation(frame: ViolationFrame, store: &NoticeStore, portal: &SharedStream) {
    let fine_class = match class_for_airline(&frame.airline) {
        Some(class) => FineClass::from_aircraft_class(class),
        None => {
            warn!(airline = %frame.airline, "unknown airline, billing at the commercial rate");
            FineClass::Commercial
        }
    };
    let notice = Notice::issue(
        &frame.flight_number,
        &frame.airline,
        fine_class,
        frame.speed,
        SpeedBand {
            min: frame.min_allowed,
            max: frame.max_allowed,
        },
        unix_now() as i64,
        &mut rand::thread_rng(),
    );
    info!(
        id = %notice.id,
        flight = %notice.flight_number,
        airline = %notice.airline,
        class = notice.fine_class.as_str(),
        speed = notice.observed_speed,
        allowed_min = notice.allowed.min,
        allowed_max = notice.allowed.max,
        fine = notice.fine,
        service_fee = notice.service_fee,
        total = notice.total,
        "airspace violation notice issued"
    );
    if !store.push(notice.clone()) {
        warn!(id = %notice.id, "notice id collision, keeping both records");
    }
    forward_summary(&notice, portal).await;
}

async fn confirmation_loop(
    listener: UnixListener,
    lock: CrossProcessLock,
    store: Arc<NoticeStore>,
    portal: SharedStream,
    cancel: CancellationToken,
) {
    let Some(mut stream) = accept_or_cancel(&listener, &cancel, "confirmations").await else {
        return;
    };
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            result = PaymentFrame::read_from(&mut stream) => match result {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("confirmation stream closed by the payment service");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "confirmation stream broken, discarding partial frame");
                    break;
                }
            }
        };

        let guard = match lock.acquire() {
            Ok(guard) => guard,
            Err(e) => {
                error!(error = %e, notice = %frame.notice_id, "cannot take the notice lock, dropping confirmation");
                continue;
            }
        };
        match store.mark_paid(&frame.notice_id) {
            PaidOutcome::Flipped(notice) => {
                info!(
                    id = %notice.id,
                    flight = %notice.flight_number,
                    total = notice.total,
                    "notice marked paid"
                );
                forward_summary(&notice, &portal).await;
            }
            PaidOutcome::AlreadyPaid(notice) => {
                debug!(id = %notice.id, "confirmation for an already-paid notice");
            }
            PaidOutcome::Unknown => {
                warn!(id = %frame.notice_id, "payment confirmation for an unknown notice, dropped");
            }
        }
        drop(guard);
    }
}

async fn forward_summary(notice: &Notice, portal: &SharedStream) {
    let frame = PaymentFrame::from_notice(notice);
    let mut stream = portal.lock().await;
    if let Err(e) = frame.write_to(&mut *stream).await {
        error!(id = %notice.id, error = %e, "failed to forward notice summary to the portal");
    }
}
