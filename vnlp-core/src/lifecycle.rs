//! # Ciclo de Vida do Serviço
//!
//! ```text
//! Unstarted ──start──▶ Loading ──ok──▶ Ready ──shutdown──▶ ShuttingDown ──▶ Stopped
//!                         │                                                   ▲
//!                         └──────────────────── falha ────────────────────────┘
//! ```
//!
//! `start` carrega o backend, inicializa o registro e faz a passada de
//! aquecimento. Qualquer falha leva direto a `Stopped` e nunca a `Ready`.
//! `shutdown` solta a referência do engine; os recursos são liberados quando
//! a última requisição em andamento devolver seu `Arc`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{info, warn};

use crate::annotator::AnnotatorSet;
use crate::error::{LoadError, StartupError};
use crate::loader::{self, LoadedBackend};
use crate::pipeline::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unstarted,
    Loading,
    Ready,
    ShuttingDown,
    Stopped,
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    engine: Option<Arc<Engine>>,
}

/// Gerenciador de ciclo de vida.
#[derive(Debug)]
pub struct Lifecycle {
    inner: Mutex<Inner>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: LifecycleState::Unstarted,
                engine: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    /// Engine ativo, se o serviço está `Ready`.
    pub fn engine(&self) -> Option<Arc<Engine>> {
        self.lock().engine.clone()
    }

    /// Carrega o backend em `path` e prepara os estágios de `set`.
    pub fn start(
        &self,
        path: impl AsRef<Path>,
        set: AnnotatorSet,
    ) -> Result<Arc<Engine>, StartupError> {
        let path = path.as_ref();
        self.start_with(|| loader::load(path), set)
    }

    /// Como [`Lifecycle::start`], com o carregamento do backend fornecido
    /// pelo chamador (backend embutido no binário, por exemplo).
    pub fn start_with<F>(&self, load: F, set: AnnotatorSet) -> Result<Arc<Engine>, StartupError>
    where
        F: FnOnce() -> Result<LoadedBackend, LoadError>,
    {
        {
            let mut inner = self.lock();
            if inner.state != LifecycleState::Unstarted {
                return Err(StartupError::InvalidState(inner.state));
            }
            inner.state = LifecycleState::Loading;
        }

        match Self::prepare(load, set) {
            Ok(engine) => {
                let engine = Arc::new(engine);
                let mut inner = self.lock();
                inner.state = LifecycleState::Ready;
                inner.engine = Some(Arc::clone(&engine));
                info!("Serviço pronto com [{set}]");
                Ok(engine)
            }
            Err(e) => {
                self.lock().state = LifecycleState::Stopped;
                Err(e)
            }
        }
    }

    fn prepare<F>(load: F, set: AnnotatorSet) -> Result<Engine, StartupError>
    where
        F: FnOnce() -> Result<LoadedBackend, LoadError>,
    {
        let backend = load()?;
        let engine = Engine::new(backend, set)?;
        let started = Instant::now();
        let words = engine.warm_up().map_err(StartupError::WarmupFailure)?;
        info!("Aquecimento: {words} palavra(s) em {:?}", started.elapsed());
        Ok(engine)
    }

    /// Encerra o serviço; chamadas repetidas não têm efeito.
    pub fn shutdown(&self) {
        let engine = {
            let mut inner = self.lock();
            match inner.state {
                LifecycleState::Stopped | LifecycleState::ShuttingDown => return,
                LifecycleState::Ready => {}
                other => warn!("Encerrando a partir de {other:?}"),
            }
            inner.state = LifecycleState::ShuttingDown;
            inner.engine.take()
        };

        if let Some(engine) = engine {
            let in_flight = Arc::strong_count(&engine) - 1;
            if in_flight > 0 {
                info!("Liberando backend após {in_flight} referência(s) restante(s)");
            }
            drop(engine);
        }

        self.lock().state = LifecycleState::Stopped;
        info!("Serviço encerrado");
    }
}
