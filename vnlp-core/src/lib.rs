//! # vnlp-core: Pipeline de Anotação de Vietnamita
//!
//! Núcleo de um serviço de anotação linguística com estágios plugáveis. O
//! algoritmo de cada estágio vem de um **backend** carregado no startup; este
//! crate orquestra os estágios, garante o isolamento entre requisições
//! concorrentes e converte tudo em um envelope de resposta uniforme.
//!
//! ## Arquitetura do Sistema
//!
//! ```text
//! Lifecycle ──▶ loader (uma vez) ──▶ AnnotatorRegistry (uma vez)
//!                                          │
//! requisição ──▶ handler ──▶ Engine ───────┘──▶ envelope JSON
//! ```
//!
//! 1.  **Tipos de estágio** ([`annotator`]): `wseg`, `pos`, `ner`, `parse` e conjuntos deles.
//! 2.  **Contrato do backend** ([`backend`]): traits [`Backend`] e [`Annotator`].
//! 3.  **Carregador** ([`loader`]): plugins nativos (`.so`) ou manifesto de léxico (`.toml`).
//! 4.  **Registro** ([`registry`]): um handle por estágio, imutável após o startup.
//! 5.  **Orquestrador** ([`pipeline`]): anotação por sentença, na ordem fixa do pipeline.
//! 6.  **Handler** ([`handler`]): `handle(text, props)` → [`ResponseEnvelope`].
//! 7.  **Ciclo de vida** ([`lifecycle`]): `Unstarted → Loading → Ready → ShuttingDown → Stopped`.
//!
//! O backend embutido ([`lexicon`]) implementa os quatro estágios com
//! algoritmos clássicos: segmentação por vocabulário ([`segmenter`]), HMM
//! ([`pos_tagger`]), regras e gazetteers ([`recognizer`]) e um parser de
//! dependências por regras ([`parser`]).
//!
//! ## Exemplo de Uso
//!
//! ```no_run
//! use vnlp_core::{handle, AnnotatorSet, Lifecycle};
//!
//! let lifecycle = Lifecycle::new();
//! let engine = lifecycle.start("models/vi/backend.toml", AnnotatorSet::all())?;
//!
//! let envelope = handle(&engine, Some("Tôi là sinh viên."), Some("wseg,pos"));
//! println!("{}", serde_json::to_string(&envelope)?);
//!
//! lifecycle.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod annotator;
pub mod backend;
pub mod error;
pub mod handler;
pub mod language;
pub mod lexicon;
pub mod lifecycle;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod pos_tagger;
pub mod recognizer;
pub mod registry;
pub mod segmenter;
pub mod sentence;
pub mod tokenizer;

pub use annotator::{AnnotatorKind, AnnotatorSet};
pub use backend::{Annotator, Backend, BackendInfo, Concurrency, LoadContext};
pub use error::{AnnotatorError, BackendError, LoadError, PipelineError, StartupError};
pub use handler::{handle, ResponseEnvelope};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use pipeline::{Engine, UNKNOWN_LANGUAGE};
pub use sentence::{AnnotatedWord, Sentence, Word, WordBoundary};
pub use tokenizer::Token;
