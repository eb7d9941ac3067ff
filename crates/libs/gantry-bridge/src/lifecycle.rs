use std::sync::Arc;

use gantry_wire::OutboundCommand;
use tokio_util::sync::CancellationToken;

use crate::channel::CommandChannel;
use crate::config::BridgeConfig;
use crate::now_ms;
use crate::session::SessionState;

/// Drive connection acquisition and renewal.
///
/// Three independent tasks, all torn down by `cancel`:
///
/// 1. the connect loop — send `connection` immediately, then retry at a
///    fixed interval until a session is bound;
/// 2. the liveness check — reconnect when too long has passed since the
///    last successful connection;
/// 3. the expiry check — reconnect when the bound delegation is close to
///    expiring.
///
/// Checks 2 and 3 are no-ops for anonymous sessions: there is no
/// delegation to keep alive.
pub(crate) fn spawn(
    channel: Arc<CommandChannel>,
    session: Arc<SessionState>,
    config: BridgeConfig,
    cancel: CancellationToken,
) {
    session.mark_connecting();

    {
        let channel = Arc::clone(&channel);
        let session = Arc::clone(&session);
        let cancel = cancel.clone();
        let period = config.connect_retry();
        let navbg = config.navbg.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tick.tick() => {}
                }
                if session.is_bound() {
                    log::debug!("lifecycle: session bound, connect loop done");
                    return;
                }
                channel.send(&OutboundCommand::Connection { navbg: navbg.clone() });
            }
        });
    }

    {
        let channel = Arc::clone(&channel);
        let session = Arc::clone(&session);
        let cancel = cancel.clone();
        let period = config.liveness_check();
        let stale_after_ms = config.liveness_stale_after_ms;
        let navbg = config.navbg.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.tick().await; // the immediate first tick
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tick.tick() => {}
                }
                let Some(snapshot) = session.snapshot() else { continue };
                if snapshot.anonymous {
                    continue;
                }
                let Some(last) = session.last_connected_ms() else { continue };
                if now_ms().saturating_sub(last) > stale_after_ms {
                    log::debug!("lifecycle: connection stale, requesting a fresh one");
                    channel.send(&OutboundCommand::Connection { navbg: navbg.clone() });
                }
            }
        });
    }

    {
        let cancel = cancel.clone();
        let period = config.expiry_check();
        let margin_ms = config.renew_margin_ms;
        let navbg = config.navbg;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tick.tick() => {}
                }
                let Some(snapshot) = session.snapshot() else { continue };
                if snapshot.anonymous {
                    continue;
                }
                let Some(identity) = session.identity() else { continue };
                if identity.expires_within(margin_ms) {
                    log::debug!("lifecycle: delegation expiring soon, renewing");
                    channel.send(&OutboundCommand::Connection { navbg: navbg.clone() });
                }
            }
        });
    }
}
