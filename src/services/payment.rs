//! The payment service process.
//!
//! Queues payment requests from the portal and, on approval, records the
//! transaction and sends a confirmation back to the notice generator. The
//! operator console is out of scope; with `auto_approve` enabled each
//! request is approved as it arrives.

use anyhow::{Context, Result};
use tokio::net::UnixStream;
use tracing::{error, info};

use acx_core::payment::{transaction_id, PaymentDesk};
use acx_core::unix_now;
use acx_ipc::{accept_one, bind, connect_with_retry, PaymentFrame, SocketDir};

use crate::config::{Config, CONNECT_ATTEMPTS, CONNECT_DELAY};
use crate::shutdown::cancel_on_termination;

pub async fn run(config: Config) -> Result<()> {
    let sockets = SocketDir::new(&config.socket_dir);
    sockets.ensure().await.context("creating socket directory")?;
    let payments_listener = bind(&sockets.payments())
        .await
        .context("binding the payment-request stream")?;
    let mut confirmations =
        connect_with_retry(&sockets.confirmations(), CONNECT_ATTEMPTS, CONNECT_DELAY)
            .await
            .context("connecting to the notice generator")?;

    info!(
        pid = std::process::id(),
        auto_approve = config.auto_approve,
        "payment service running"
    );

    let desk = PaymentDesk::new();
    let cancel = cancel_on_termination();

    let mut requests = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        result = accept_one(&payments_listener) => {
            result.context("accepting the payment-request stream")?
        }
    };

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            result = PaymentFrame::read_from(&mut requests) => match result {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("payment-request stream closed by the portal");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "payment-request stream broken, discarding partial frame");
                    break;
                }
            }
        };

        if frame.paid {
            info!(notice = %frame.notice_id, "request already paid, nothing to do");
            continue;
        }
        info!(
            notice = %frame.notice_id,
            flight = %frame.flight_number,
            amount_due = frame.amount_due,
            "payment request queued for approval"
        );
        desk.enqueue(frame.to_request());

        if config.auto_approve {
            approve_next(&desk, &mut confirmations).await;
        }
    }

    info!(
        approved = desk.history().len(),
        still_pending = desk.pending_len(),
        "payment service stopping"
    );
    Ok(())
}

/// Approve the oldest pending request and confirm it to the generator.
async fn approve_next(desk: &PaymentDesk, confirmations: &mut UnixStream) {
    let Some(approved) = desk.approve(0) else {
        return;
    };
    let txid = transaction_id(unix_now() as i64, &mut rand::thread_rng());
    info!(
        transaction = %txid,
        notice = %approved.notice_id,
        amount = approved.amount_offered,
        "payment approved"
    );
    let frame = PaymentFrame::from_request(&approved).confirmed();
    if let Err(e) = frame.write_to(confirmations).await {
        error!(notice = %approved.notice_id, error = %e, "failed to send payment confirmation");
    }
}
