//! # Registro de Anotadores
//!
//! Inicializa, uma única vez e no startup, cada estágio do conjunto
//! configurado. Depois disso o registro é imutável e pode ser lido por
//! qualquer número de requisições simultâneas.
//!
//! Estágios que declaram [`Concurrency::Serialized`] recebem um `Mutex`
//! próprio: só chamadas ao mesmo handle se enfileiram, os demais seguem livres.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::annotator::{AnnotatorKind, AnnotatorSet};
use crate::backend::{Annotator, Backend, Concurrency};
use crate::error::{BackendError, StartupError};
use crate::sentence::Sentence;

/// Um estágio inicializado, pronto para uso concorrente.
pub struct AnnotatorHandle {
    kind: AnnotatorKind,
    inner: Box<dyn Annotator>,
    gate: Option<Mutex<()>>,
}

impl AnnotatorHandle {
    pub fn new(inner: Box<dyn Annotator>) -> Self {
        let gate = match inner.concurrency() {
            Concurrency::Shared => None,
            Concurrency::Serialized => Some(Mutex::new(())),
        };
        Self {
            kind: inner.kind(),
            inner,
            gate,
        }
    }

    pub fn kind(&self) -> AnnotatorKind {
        self.kind
    }

    pub fn is_serialized(&self) -> bool {
        self.gate.is_some()
    }

    /// Aplica o estágio, respeitando sua política de concorrência.
    pub fn annotate(&self, sentence: &mut Sentence) -> Result<(), BackendError> {
        match &self.gate {
            Some(gate) => {
                // Um pânico anterior não invalida o estágio: o lock não protege dados
                let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);
                self.inner.annotate(sentence)
            }
            None => self.inner.annotate(sentence),
        }
    }
}

impl std::fmt::Debug for AnnotatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotatorHandle")
            .field("kind", &self.kind)
            .field("serialized", &self.is_serialized())
            .finish()
    }
}

/// Mapa imutável `AnnotatorKind → AnnotatorHandle`.
#[derive(Debug)]
pub struct AnnotatorRegistry {
    handles: [Option<AnnotatorHandle>; 4],
    configured: AnnotatorSet,
}

impl AnnotatorRegistry {
    /// Chama `init_annotator` exatamente uma vez para cada estágio de `set`.
    pub fn initialize(backend: &dyn Backend, set: AnnotatorSet) -> Result<Self, StartupError> {
        let mut handles: [Option<AnnotatorHandle>; 4] = Default::default();

        for kind in set.iter() {
            debug!("Inicializando anotador \"{kind}\"");
            let inner = backend
                .init_annotator(kind)
                .map_err(|source| StartupError::InitializationFailure { kind, source })?;
            if inner.kind() != kind {
                return Err(StartupError::InitializationFailure {
                    kind,
                    source: BackendError::new(format!(
                        "backend returned annotator \"{}\"",
                        inner.kind()
                    )),
                });
            }
            handles[kind.index()] = Some(AnnotatorHandle::new(inner));
        }

        info!("Anotadores prontos: {set}");
        Ok(Self {
            handles,
            configured: set,
        })
    }

    pub fn lookup(&self, kind: AnnotatorKind) -> Option<&AnnotatorHandle> {
        self.handles[kind.index()].as_ref()
    }

    /// Conjunto configurado no startup.
    pub fn configured(&self) -> AnnotatorSet {
        self.configured
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::backend::BackendInfo;
    use crate::sentence::WordBoundary;
    use crate::tokenizer::{self, Token};

    /// Estágio que marca cada palavra com o código do seu tipo.
    pub(crate) struct Marker {
        pub(crate) kind: AnnotatorKind,
        pub(crate) concurrency: Concurrency,
        pub(crate) active: Arc<AtomicUsize>,
        pub(crate) max_active: Arc<AtomicUsize>,
        pub(crate) broken: bool,
    }

    impl Annotator for Marker {
        fn kind(&self) -> AnnotatorKind {
            self.kind
        }

        fn annotate(&self, sentence: &mut Sentence) -> Result<(), BackendError> {
            if self.broken {
                return Err(BackendError::new("model weights missing"));
            }
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(2));
            for word in &mut sentence.words {
                let code = Some(self.kind.code().to_string());
                match self.kind {
                    AnnotatorKind::Segmenter => {
                        word.boundary = Some(WordBoundary {
                            start: word.start,
                            end: word.end,
                            syllables: 1,
                        })
                    }
                    AnnotatorKind::Tagger => word.pos_tag = code,
                    AnnotatorKind::Recognizer => word.ner_label = code,
                    AnnotatorKind::Parser => {
                        word.head = Some(0);
                        word.dep_label = code;
                    }
                }
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        fn concurrency(&self) -> Concurrency {
            self.concurrency
        }
    }

    /// Backend falso que conta inicializações.
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub(crate) init_calls: [AtomicUsize; 4],
        pub(crate) failing: Option<AnnotatorKind>,
        pub(crate) serialized: Option<AnnotatorKind>,
        /// Inicializa normalmente, mas falha a cada `annotate`.
        pub(crate) broken: Option<AnnotatorKind>,
        pub(crate) max_active: Arc<AtomicUsize>,
    }

    impl Backend for FakeBackend {
        fn info(&self) -> BackendInfo {
            BackendInfo {
                name: "fake".into(),
                version: "0".into(),
            }
        }

        fn tokenize(&self, text: &str) -> Vec<Token> {
            tokenizer::tokenize(text)
        }

        fn split_sentences(&self, tokens: Vec<Token>) -> Vec<Vec<Token>> {
            tokenizer::split_sentences(tokens)
        }

        fn init_annotator(&self, kind: AnnotatorKind) -> Result<Box<dyn Annotator>, BackendError> {
            self.init_calls[kind.index()].fetch_add(1, Ordering::SeqCst);
            if self.failing == Some(kind) {
                return Err(BackendError::new("model file is corrupt"));
            }
            let concurrency = if self.serialized == Some(kind) {
                Concurrency::Serialized
            } else {
                Concurrency::Shared
            };
            Ok(Box::new(Marker {
                kind,
                concurrency,
                active: Arc::new(AtomicUsize::new(0)),
                max_active: Arc::clone(&self.max_active),
                broken: self.broken == Some(kind),
            }))
        }

        fn detect_language(&self, text: &str) -> Result<String, BackendError> {
            if text.contains("Tôi") {
                Ok("vi".into())
            } else {
                Err(BackendError::new("unknown"))
            }
        }
    }

    #[test]
    fn test_initializes_each_kind_once() {
        let backend = FakeBackend::default();
        let set = AnnotatorSet::parse("pos,wseg").unwrap();
        let registry = AnnotatorRegistry::initialize(&backend, set).unwrap();

        assert_eq!(backend.init_calls[AnnotatorKind::Segmenter.index()].load(Ordering::SeqCst), 1);
        assert_eq!(backend.init_calls[AnnotatorKind::Tagger.index()].load(Ordering::SeqCst), 1);
        assert_eq!(backend.init_calls[AnnotatorKind::Recognizer.index()].load(Ordering::SeqCst), 0);
        assert!(registry.lookup(AnnotatorKind::Tagger).is_some());
        assert!(registry.lookup(AnnotatorKind::Parser).is_none());
        assert_eq!(registry.configured(), set);
    }

    #[test]
    fn test_failing_stage_aborts_startup() {
        let backend = FakeBackend {
            failing: Some(AnnotatorKind::Recognizer),
            ..Default::default()
        };
        let err = AnnotatorRegistry::initialize(&backend, AnnotatorSet::all()).unwrap_err();
        match err {
            StartupError::InitializationFailure { kind, .. } => {
                assert_eq!(kind, AnnotatorKind::Recognizer)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_serialized_handle_never_overlaps() {
        let backend = FakeBackend {
            serialized: Some(AnnotatorKind::Tagger),
            ..Default::default()
        };
        let registry =
            AnnotatorRegistry::initialize(&backend, AnnotatorSet::parse("pos").unwrap()).unwrap();
        let handle = registry.lookup(AnnotatorKind::Tagger).unwrap();
        assert!(handle.is_serialized());

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let mut sentence = Sentence::from_tokens(&tokenizer::tokenize("Tôi là"));
                    handle.annotate(&mut sentence).unwrap();
                });
            }
        });
        assert_eq!(backend.max_active.load(Ordering::SeqCst), 1);
    }
}
