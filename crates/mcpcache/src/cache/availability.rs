//! Cache backend availability tracking.

use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Registra el estado del backend de cache.
///
/// Despues de un fallo de conexion o timeout el backend se considera caido
/// durante `retry_after`; mientras tanto el cache va directo al fetch sin
/// pagar el timeout en cada llamada. El primer exito lo restablece.
#[derive(Debug)]
pub struct Availability {
    /// Tiempo de espera antes de reintentar.
    retry_after: Duration,
    /// Momento del ultimo fallo, si el backend esta caido.
    down_since: RwLock<Option<Instant>>,
    /// Ultimo error registrado.
    last_error: RwLock<Option<String>>,
    /// Fallos consecutivos.
    failure_count: RwLock<u32>,
}

impl Availability {
    /// Crea un tracker con el tiempo de reintento dado.
    pub fn new(retry_after: Duration) -> Self {
        Self {
            retry_after,
            down_since: RwLock::new(None),
            last_error: RwLock::new(None),
            failure_count: RwLock::new(0),
        }
    }

    /// Retorna true si se puede intentar una operacion contra el backend.
    pub fn allows_attempt(&self) -> bool {
        match *self.down_since.read() {
            None => true,
            Some(since) => since.elapsed() >= self.retry_after,
        }
    }

    /// Registra un fallo.
    /// Retorna true si el backend estaba disponible hasta ahora.
    pub fn record_failure(&self, error: impl Into<String>) -> bool {
        let mut down_since = self.down_since.write();
        let mut last_error = self.last_error.write();
        let mut failure_count = self.failure_count.write();

        let was_up = down_since.is_none();
        *down_since = Some(Instant::now());
        *last_error = Some(error.into());
        *failure_count += 1;

        was_up
    }

    /// Registra un exito.
    /// Retorna true si el backend estaba caido.
    pub fn record_success(&self) -> bool {
        if self.down_since.read().is_none() {
            return false;
        }

        let mut down_since = self.down_since.write();
        let mut last_error = self.last_error.write();
        let mut failure_count = self.failure_count.write();

        let was_down = down_since.is_some();
        *down_since = None;
        *last_error = None;
        *failure_count = 0;

        was_down
    }

    /// Retorna true si el backend esta marcado como caido.
    pub fn is_down(&self) -> bool {
        self.down_since.read().is_some()
    }

    /// Retorna el ultimo error.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Retorna el numero de fallos consecutivos.
    pub fn failure_count(&self) -> u32 {
        *self.failure_count.read()
    }

    /// Retorna el tiempo de reintento.
    pub fn retry_after(&self) -> Duration {
        self.retry_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_available() {
        let availability = Availability::new(Duration::from_secs(5));

        assert!(availability.allows_attempt());
        assert!(!availability.is_down());
        assert_eq!(availability.failure_count(), 0);
    }

    #[test]
    fn test_failure_blocks_attempts_until_retry_after() {
        let availability = Availability::new(Duration::from_millis(30));

        assert!(availability.record_failure("connection refused"));
        assert!(!availability.allows_attempt());
        assert_eq!(availability.last_error().as_deref(), Some("connection refused"));

        std::thread::sleep(Duration::from_millis(50));
        assert!(availability.allows_attempt());
        // Sigue marcado como caido hasta el primer exito
        assert!(availability.is_down());
    }

    #[test]
    fn test_consecutive_failures() {
        let availability = Availability::new(Duration::from_secs(5));

        assert!(availability.record_failure("a"));
        assert!(!availability.record_failure("b"));
        assert_eq!(availability.failure_count(), 2);
        assert_eq!(availability.last_error().as_deref(), Some("b"));
    }

    #[test]
    fn test_success_resets() {
        let availability = Availability::new(Duration::from_secs(5));

        availability.record_failure("timeout");
        assert!(availability.record_success());

        assert!(availability.allows_attempt());
        assert!(availability.last_error().is_none());
        assert_eq!(availability.failure_count(), 0);
        assert!(!availability.record_success());
    }
}
