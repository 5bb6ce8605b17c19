//! Per-key fetch coalescing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializa los misses concurrentes de una misma key.
///
/// Solo una tarea por key ejecuta el fetch; las demas esperan y al entrar
/// vuelven a consultar el store, que normalmente ya esta poblado. Keys
/// distintas nunca se esperan entre si.
#[derive(Debug, Default)]
pub struct SingleFlight {
    inflight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Slot adquirido para una key. Se libera al hacer drop.
pub struct FlightGuard<'a> {
    flights: &'a SingleFlight,
    key: String,
    slot: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    waited: bool,
}

impl SingleFlight {
    /// Crea un registro vacio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adquiere el slot de la key, esperando si otra tarea lo tiene.
    pub async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        let (slot, contended) = {
            let mut inflight = self.inflight.lock();
            match inflight.get(key) {
                Some(slot) => (Arc::clone(slot), true),
                None => {
                    let slot = Arc::new(AsyncMutex::new(()));
                    inflight.insert(key.to_string(), Arc::clone(&slot));
                    (slot, false)
                },
            }
        };

        let guard = Arc::clone(&slot).lock_owned().await;

        FlightGuard {
            flights: self,
            key: key.to_string(),
            slot,
            guard: Some(guard),
            waited: contended,
        }
    }

    /// Numero de keys con un fetch en curso.
    pub fn len(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Retorna true si no hay fetches en curso.
    pub fn is_empty(&self) -> bool {
        self.inflight.lock().is_empty()
    }
}

impl FlightGuard<'_> {
    /// Retorna true si otra tarea tenia el slot al llegar.
    pub fn waited(&self) -> bool {
        self.waited
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut inflight = self.flights.inflight.lock();
        // Solo el mapa y este guard referencian el slot: nadie espera
        if Arc::strong_count(&self.slot) == 2 {
            inflight.remove(&self.key);
        }
    }
}
