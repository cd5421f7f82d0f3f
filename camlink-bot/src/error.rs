//! Device failure taxonomy shared by the transport, the gateway and the poller.

use std::fmt;

/// Erreurs possibles lors d'un appel au device
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("device request timed out: {0}")]
    Timeout(String),
    #[error("device unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("device request failed: {0}")]
    Other(String),
    /// Réponse valide mais le capteur signale un échec de lecture
    #[error("sensor read failed: {0}")]
    SensorFault(String),
}

/// Three-way classification the poller acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    NetworkUnreachable,
    OtherError,
}

impl DeviceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DeviceError::Timeout(_) => FailureKind::Timeout,
            DeviceError::NetworkUnreachable(_) => FailureKind::NetworkUnreachable,
            DeviceError::Other(_) | DeviceError::SensorFault(_) => FailureKind::OtherError,
        }
    }

    /// Timeout and connection failures stop auto-mode polling; anything else is retried.
    pub fn disarms_polling(&self) -> bool {
        matches!(self.kind(), FailureKind::Timeout | FailureKind::NetworkUnreachable)
    }

    pub(crate) fn from_http(err: reqwest::Error) -> Self {
        // l'ordre compte : un connect timeout est d'abord un timeout
        if err.is_timeout() {
            DeviceError::Timeout(err.to_string())
        } else if err.is_connect() {
            DeviceError::NetworkUnreachable(err.to_string())
        } else {
            DeviceError::Other(err.to_string())
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::NetworkUnreachable => "network_unreachable",
            FailureKind::OtherError => "other",
        };
        f.write_str(s)
    }
}
