//! The airline portal process.
//!
//! Receives notice summaries from the generator, keeps the per-airline
//! accounts, and initiates payments. The interactive menu of an operator
//! console is out of scope here; with `auto_pay` enabled the portal pays
//! each affordable unpaid notice as it arrives.

use anyhow::{Context, Result};
use tokio::net::UnixStream;
use tracing::{debug, error, info, warn};

use acx_core::account::{Portal, UpdateOutcome};
use acx_ipc::{accept_one, bind, connect_with_retry, PaymentFrame, SocketDir};

use crate::config::{Config, CONNECT_ATTEMPTS, CONNECT_DELAY};
use crate::shutdown::cancel_on_termination;

pub async fn run(config: Config) -> Result<()> {
    let sockets = SocketDir::new(&config.socket_dir);
    sockets.ensure().await.context("creating socket directory")?;
    let notices_listener = bind(&sockets.notices())
        .await
        .context("binding the notice stream")?;
    let mut payments = connect_with_retry(&sockets.payments(), CONNECT_ATTEMPTS, CONNECT_DELAY)
        .await
        .context("connecting to the payment service")?;

    info!(
        pid = std::process::id(),
        auto_pay = config.auto_pay,
        "airline portal running"
    );

    let portal = Portal::new();
    let cancel = cancel_on_termination();

    let mut notices = tokio::select! {
        _ = cancel.cancelled() => {
            return Ok(());
        }
        result = accept_one(&notices_listener) => {
            result.context("accepting the notice stream")?
        }
    };

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            result = PaymentFrame::read_from(&mut notices) => match result {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("notice stream closed by the generator");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "notice stream broken, discarding partial frame");
                    break;
                }
            }
        };

        let summary = frame.to_summary();
        match portal.apply_update(summary.clone()) {
            UpdateOutcome::NewUnpaid => {
                info!(
                    notice = %summary.id,
                    flight = %summary.flight_number,
                    amount = summary.amount,
                    "notice received"
                );
                if config.auto_pay {
                    pay_notice(&portal, &summary.id, &mut payments).await;
                }
            }
            UpdateOutcome::MarkedPaid => {
                info!(notice = %summary.id, "notice settled");
            }
            UpdateOutcome::NewPaid => {
                info!(notice = %summary.id, "already-paid notice recorded");
            }
            UpdateOutcome::Unchanged => {
                debug!(notice = %summary.id, "duplicate notice update ignored");
            }
        }
    }

    for (airline, account) in portal.accounts() {
        info!(
            airline = %airline,
            balance = account.balance,
            total_fines = account.total_fines,
            total_paid = account.total_paid,
            outstanding = account.total_fines - account.total_paid,
            "closing account position"
        );
    }
    info!("airline portal stopping");
    Ok(())
}

async fn pay_notice(portal: &Portal, notice_id: &str, payments: &mut UnixStream) {
    match portal.pay(notice_id) {
        Ok(request) => {
            info!(
                notice = %notice_id,
                flight = %request.flight_number,
                amount = request.amount_due,
                "payment initiated"
            );
            if let Err(e) = PaymentFrame::from_request(&request).write_to(payments).await {
                error!(notice = %notice_id, error = %e, "failed to send payment request");
            }
        }
        Err(e) => {
            warn!(notice = %notice_id, reason = %e, "payment not initiated");
        }
    }
}
