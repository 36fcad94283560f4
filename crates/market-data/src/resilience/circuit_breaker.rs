//! Per-endpoint circuit breaker for fault tolerance.
//!
//! Implements the circuit breaker pattern to prevent cascading failures
//! when an upstream is experiencing issues. The circuit has three states:
//!
//! - **Closed**: Normal operation, calls are executed.
//! - **Open**: Upstream is failing, calls are short-circuited.
//! - **HalfOpen**: One probe call is allowed to test recovery.
//!
//! The breaker holds its lock across the guarded call, so probe attempts are
//! serialized. One breaker guards one outbound endpoint; state is in-memory
//! and resets on restart.

use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, info};
use thiserror::Error;
use tokio::sync::Mutex;

/// Default number of consecutive failures before opening the circuit.
const DEFAULT_MAX_FAILURES: u32 = 5;

/// Default time to wait before transitioning from Open to HalfOpen.
const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(60);

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    /// Normal operation - calls are executed.
    Closed,
    /// Upstream is failing - calls are short-circuited.
    Open,
    /// Testing recovery - a single probe is executed.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Returned instead of executing the call while the circuit is open.
#[derive(Debug, Clone, Error)]
#[error("circuit breaker is open: {name}")]
pub struct CircuitOpenError {
    /// Name of the guarded endpoint.
    pub name: String,
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub max_failures: u32,
    /// Time the circuit stays open before a probe is allowed.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: DEFAULT_MAX_FAILURES,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure: None,
        }
    }
}

/// Circuit breaker guarding a single outbound endpoint.
pub struct CircuitBreaker {
    name: String,
    circuit: Mutex<Circuit>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a breaker with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, CircuitBreakerConfig::default())
    }

    /// Create a breaker with custom configuration.
    pub fn with_config(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            circuit: Mutex::new(Circuit::new()),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Execute `operation` through the breaker.
    ///
    /// While Open and inside the reset timeout the operation is not executed and
    /// a [`CircuitOpenError`] is returned through `E`. Every `Err` produced by
    /// the operation counts as a failure.
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CircuitOpenError>,
    {
        let mut circuit = self.circuit.lock().await;

        if circuit.state == CircuitState::Open {
            let elapsed = circuit.last_failure.map(|at| at.elapsed());
            match elapsed {
                Some(elapsed) if elapsed > self.config.reset_timeout => {
                    info!(
                        "Circuit breaker: transitioning '{}' from Open to HalfOpen",
                        self.name
                    );
                    circuit.state = CircuitState::HalfOpen;
                    circuit.failure_count = 0;
                }
                _ => {
                    debug!("Circuit breaker: rejecting call to '{}' (open)", self.name);
                    return Err(CircuitOpenError {
                        name: self.name.clone(),
                    }
                    .into());
                }
            }
        }

        let result = operation().await;

        match &result {
            Ok(_) => self.on_success(&mut circuit),
            Err(_) => self.on_failure(&mut circuit),
        }

        result
    }

    fn on_success(&self, circuit: &mut Circuit) {
        match circuit.state {
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker: closing circuit for '{}' after successful probe",
                    self.name
                );
                circuit.state = CircuitState::Closed;
                circuit.failure_count = 0;
                circuit.last_failure = None;
            }
            CircuitState::Closed => {
                if circuit.failure_count > 0 {
                    debug!(
                        "Circuit breaker: success for '{}', failure count reset",
                        self.name
                    );
                }
                circuit.failure_count = 0;
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, circuit: &mut Circuit) {
        circuit.last_failure = Some(Instant::now());

        match circuit.state {
            CircuitState::Closed => {
                circuit.failure_count += 1;
                if circuit.failure_count >= self.config.max_failures {
                    info!(
                        "Circuit breaker: opening circuit for '{}' after {} failures",
                        self.name, circuit.failure_count
                    );
                    circuit.state = CircuitState::Open;
                } else {
                    debug!(
                        "Circuit breaker: failure for '{}' ({}/{})",
                        self.name, circuit.failure_count, self.config.max_failures
                    );
                }
            }
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker: reopening circuit for '{}' after failed probe",
                    self.name
                );
                circuit.failure_count += 1;
                circuit.state = CircuitState::Open;
            }
            CircuitState::Open => {}
        }
    }

    /// Current state. Does not perform the Open -> HalfOpen transition.
    pub async fn state(&self) -> CircuitState {
        self.circuit.lock().await.state
    }

    pub async fn failure_count(&self) -> u32 {
        self.circuit.lock().await.failure_count
    }

    /// Reset the circuit to Closed.
    pub async fn reset(&self) {
        let mut circuit = self.circuit.lock().await;
        info!("Circuit breaker: manually resetting circuit for '{}'", self.name);
        *circuit = Circuit::new();
    }
}
