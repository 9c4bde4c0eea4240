//! # Pipeline: Orquestrador de Anotação
//!
//! O [`Engine`] reúne o backend carregado e o registro de anotadores e
//! responde às duas operações de requisição:
//!
//! 1. **Anotação** ([`Engine::annotate`]): texto → tokens → sentenças →
//!    estágios selecionados, sempre na ordem fixa `wseg → pos → ner → parse`.
//! 2. **Idioma** ([`Engine::detect_language`]): código curto ou o sentinela
//!    [`UNKNOWN_LANGUAGE`] quando o backend não consegue decidir.
//!
//! ## Concorrência
//!
//! O engine é compartilhado como `Arc<Engine>` e nunca muda depois do
//! startup. Cada sentença recebe sua própria [`Sentence`] de trabalho, e as
//! sentenças de uma mesma requisição são anotadas em paralelo com `rayon`
//! (a coleta indexada preserva a ordem original).

use rayon::prelude::*;
use tracing::{debug, error, warn};

use crate::annotator::{AnnotatorKind, AnnotatorSet};
use crate::backend::BackendInfo;
use crate::error::{PipelineError, StartupError};
use crate::loader::LoadedBackend;
use crate::registry::{AnnotatorHandle, AnnotatorRegistry};
use crate::sentence::{AnnotatedWord, Sentence};

/// Valor devolvido quando o idioma não pôde ser determinado.
pub const UNKNOWN_LANGUAGE: &str = "N/A";

/// Backend + registro, prontos para atender requisições.
///
/// A ordem dos campos é a ordem de destruição: os anotadores são liberados
/// antes do backend (e da biblioteca nativa que o contém).
pub struct Engine {
    registry: AnnotatorRegistry,
    backend: LoadedBackend,
}

impl Engine {
    /// Inicializa os estágios de `set` sobre o backend carregado.
    pub fn new(backend: LoadedBackend, set: AnnotatorSet) -> Result<Self, StartupError> {
        let registry = AnnotatorRegistry::initialize(backend.backend(), set)?;
        Ok(Self { registry, backend })
    }

    pub fn info(&self) -> BackendInfo {
        self.backend.info()
    }

    /// Conjunto de estágios configurado no startup.
    pub fn annotators(&self) -> AnnotatorSet {
        self.registry.configured()
    }

    /// Anota `text` com os estágios de `set`.
    ///
    /// Retorna uma lista de palavras por sentença, na ordem do texto. O número
    /// de sentenças depende só do texto, nunca de `set`.
    pub fn annotate(
        &self,
        text: &str,
        set: &AnnotatorSet,
    ) -> Result<Vec<Vec<AnnotatedWord>>, PipelineError> {
        // Resolve todos os handles antes de tocar no texto
        let handles = set
            .iter()
            .map(|kind| {
                self.registry
                    .lookup(kind)
                    .ok_or(PipelineError::StageUnavailable(kind))
            })
            .collect::<Result<Vec<&AnnotatorHandle>, _>>()?;

        let backend = self.backend.backend();
        let sentences = backend.split_sentences(backend.tokenize(text));
        debug!(
            "Anotando {} sentença(s) com [{}]",
            sentences.len(),
            set
        );

        sentences
            .into_par_iter()
            .map(|tokens| -> Result<Vec<AnnotatedWord>, PipelineError> {
                let mut sentence = Sentence::from_tokens(&tokens);
                for handle in &handles {
                    run_stage(handle, &mut sentence)?;
                }
                Ok(sentence.into_annotated())
            })
            .collect()
    }

    /// Código do idioma de `text`, ou [`UNKNOWN_LANGUAGE`].
    pub fn detect_language(&self, text: &str) -> String {
        match self.backend.backend().detect_language(text) {
            Ok(code) if !code.trim().is_empty() => code,
            Ok(_) => UNKNOWN_LANGUAGE.to_string(),
            Err(e) => {
                warn!("Detecção de idioma falhou: {e}");
                UNKNOWN_LANGUAGE.to_string()
            }
        }
    }

    /// Passada de aquecimento com todos os estágios configurados.
    pub fn warm_up(&self) -> Result<usize, PipelineError> {
        let text = self.backend.backend().warmup_text();
        let sentences = self.annotate(text, &self.annotators())?;
        Ok(sentences.iter().map(Vec::len).sum())
    }
}

fn run_stage(handle: &AnnotatorHandle, sentence: &mut Sentence) -> Result<(), PipelineError> {
    let kind: AnnotatorKind = handle.kind();
    handle.annotate(sentence).map_err(|source| {
        error!("Estágio \"{kind}\" falhou: {source}");
        PipelineError::AnalysisFailure { kind, source }
    })
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.backend)
            .field("annotators", &self.annotators())
            .finish()
    }
}
