//! # Taxonomia de Erros
//!
//! Cada fase do ciclo de vida tem seu próprio tipo de erro:
//!
//! | Tipo             | Quando ocorre                                   | Efeito                    |
//! |------------------|-------------------------------------------------|---------------------------|
//! | [`AnnotatorError`] | código de anotador inválido (CLI ou `props`)  | fatal no startup / envelope |
//! | [`LoadError`]      | artefato ausente, incompatível ou que falhou  | fatal, nunca chega a Ready  |
//! | [`BackendError`]   | falha levantada pelo próprio backend          | depende do chamador         |
//! | [`PipelineError`]  | estágio indisponível ou análise que falhou    | envelope `status=false`     |
//! | [`StartupError`]   | qualquer falha durante `Loading`              | processo encerra            |
//!
//! O texto de `Display` dos erros de requisição é exatamente a mensagem
//! devolvida no campo `error` do envelope.

use std::path::PathBuf;

use thiserror::Error;

use crate::annotator::AnnotatorKind;

/// Falha levantada por código do backend (inicialização de estágio ou análise).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Erros de configuração de anotadores (códigos fora do conjunto fixo).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnnotatorError {
    #[error("Annotator \"{0}\" is invalid.")]
    InvalidAnnotator(String),
}

/// Erros do carregador de backend.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File \"{}\" was not found.", .0.display())]
    NotFound(PathBuf),
    #[error("incompatible backend \"{}\": {reason}", .path.display())]
    IncompatibleBackend { path: PathBuf, reason: String },
    #[error("backend initialization failed: {0}")]
    InitializationFailure(String),
}

/// Erros do orquestrador em tempo de requisição.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Annotator \"{}\" is not available.", .0.code())]
    StageUnavailable(AnnotatorKind),
    #[error("analysis failed in \"{}\": {source}", .kind.code())]
    AnalysisFailure {
        kind: AnnotatorKind,
        #[source]
        source: BackendError,
    },
}

/// Erros do ciclo de vida durante `Loading`.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("failed to initialize annotator \"{}\": {source}", .kind.code())]
    InitializationFailure {
        kind: AnnotatorKind,
        #[source]
        source: BackendError,
    },
    #[error("warm-up pass failed: {0}")]
    WarmupFailure(#[source] PipelineError),
    #[error("lifecycle is {0:?}, cannot start")]
    InvalidState(crate::lifecycle::LifecycleState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_messages() {
        assert_eq!(
            AnnotatorError::InvalidAnnotator("bogus".into()).to_string(),
            "Annotator \"bogus\" is invalid."
        );
        assert_eq!(
            PipelineError::StageUnavailable(AnnotatorKind::Parser).to_string(),
            "Annotator \"parse\" is not available."
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = LoadError::NotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "File \"/tmp/missing.toml\" was not found.");
    }
}
