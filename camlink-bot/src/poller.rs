/**
 * PRESENCE POLLER - Détection de déconnexion du device pendant le mode PIR auto
 *
 * RÔLE :
 * Tant que la session est armée, une sonde légère (`/pir_status`) est relancée
 * à intervalle fixe. Un échec de connectivité désarme la session et notifie
 * une seule fois le contexte chat d'origine.
 *
 * MACHINE À ÉTATS :
 * - Disarmed
 * - Armed { origin, pending }   pending = timer de la prochaine sonde (au plus un)
 *
 * INVARIANTS :
 * - Au plus un timer en attente : `arm` annule l'existant avant de replanifier
 * - Chaque `arm`/`disarm` ouvre une nouvelle génération ; le résultat d'une
 *   sonde d'une génération périmée est ignoré
 * - `disarm` annule seulement le timer, jamais une sonde déjà en vol
 */

use crate::chat::{Reply, SharedChannel};
use crate::error::DeviceError;
use crate::gateway::Gateway;
use crate::render;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

enum SessionState {
    Disarmed,
    Armed {
        origin: SharedChannel,
        pending: Option<JoinHandle<()>>,
    },
}

struct Session {
    generation: u64,
    state: SessionState,
}

struct PollerInner {
    gateway: Gateway,
    interval: Duration,
    session: Mutex<Session>,
}

/// Poll session, shared between the dispatcher and its own timer tasks.
#[derive(Clone)]
pub struct PresencePoller {
    inner: Arc<PollerInner>,
}

enum ProbeVerdict {
    Continue,
    Disconnected(SharedChannel),
    Stale,
}

impl PresencePoller {
    pub fn new(gateway: Gateway, interval: Duration) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                gateway,
                interval,
                session: Mutex::new(Session { generation: 0, state: SessionState::Disarmed }),
            }),
        }
    }

    /// Arms (or re-arms) polling; the first probe fires immediately.
    pub fn arm(&self, origin: SharedChannel) {
        let mut session = self.inner.session.lock();
        cancel_pending(&mut session.state);
        session.generation += 1;
        let generation = session.generation;

        let pending = schedule(self.inner.clone(), generation, Duration::ZERO);
        session.state = SessionState::Armed { origin, pending: Some(pending) };
        info!(generation, "presence polling armed");
    }

    /// Returns whether a session was actually armed.
    pub fn disarm(&self) -> bool {
        let mut session = self.inner.session.lock();
        if matches!(session.state, SessionState::Disarmed) {
            return false;
        }
        cancel_pending(&mut session.state);
        session.generation += 1;
        session.state = SessionState::Disarmed;
        info!(generation = session.generation, "presence polling disarmed");
        true
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.inner.session.lock().state, SessionState::Armed { .. })
    }

    /// Nombre de sondes planifiées non encore déclenchées (0 ou 1)
    pub fn pending_probes(&self) -> usize {
        match &self.inner.session.lock().state {
            SessionState::Armed { pending: Some(handle), .. } if !handle.is_finished() => 1,
            _ => 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.inner.session.lock().generation
    }
}

fn cancel_pending(state: &mut SessionState) {
    if let SessionState::Armed { pending, .. } = state {
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}

fn schedule(inner: Arc<PollerInner>, generation: u64, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        // Le timer a expiré : on libère le slot `pending` pour que la sonde en vol
        // ne puisse plus être annulée par un disarm.
        {
            let mut session = inner.session.lock();
            if session.generation != generation {
                return;
            }
            match &mut session.state {
                SessionState::Armed { pending, .. } => drop(pending.take()),
                SessionState::Disarmed => return,
            }
        }

        let outcome = inner.gateway.probe_presence().await;

        match settle(&inner, generation, outcome) {
            ProbeVerdict::Continue => {}
            ProbeVerdict::Stale => debug!(generation, "discarding stale probe result"),
            ProbeVerdict::Disconnected(origin) => {
                if let Err(e) = origin.send(Reply::text(render::PIR_DISCONNECTED)).await {
                    error!("failed to send disconnection notice: {e:#}");
                }
            }
        }
    })
}

fn settle<T>(inner: &Arc<PollerInner>, generation: u64, outcome: Result<T, DeviceError>) -> ProbeVerdict {
    let mut session = inner.session.lock();
    if session.generation != generation {
        return ProbeVerdict::Stale;
    }

    match outcome {
        Err(e) if e.disarms_polling() => {
            session.generation += 1;
            let previous = std::mem::replace(&mut session.state, SessionState::Disarmed);
            info!(kind = %e.kind(), "device lost during presence polling, auto-mode stopped");
            match previous {
                SessionState::Armed { origin, .. } => ProbeVerdict::Disconnected(origin),
                SessionState::Disarmed => ProbeVerdict::Stale,
            }
        }
        other => {
            if let Err(e) = other {
                debug!(kind = %e.kind(), "transient probe failure, polling continues");
            }
            let next = schedule(inner.clone(), generation, inner.interval);
            match &mut session.state {
                SessionState::Armed { pending, .. } => {
                    *pending = Some(next);
                    ProbeVerdict::Continue
                }
                SessionState::Disarmed => {
                    next.abort();
                    ProbeVerdict::Stale
                }
            }
        }
    }
}
