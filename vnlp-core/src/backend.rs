//! # Contrato de Capacidades do Backend
//!
//! O backend é o módulo externo que fornece os algoritmos de análise. O núcleo
//! não conhece sua implementação: só o vê através destes dois traits.
//!
//! - [`Backend`]: tokenização, divisão em sentenças, detecção de idioma e a
//!   fábrica de estágios (`init_annotator`).
//! - [`Annotator`]: um estágio inicializado (ex: um modelo carregado), aplicado
//!   a uma [`Sentence`] que pertence exclusivamente à chamada atual.
//!
//! Backends nativos (bibliotecas dinâmicas) exportam seus pontos de entrada com
//! [`declare_backend!`](crate::declare_backend); o backend de léxico embutido
//! ([`crate::lexicon`]) implementa os mesmos traits diretamente.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::annotator::AnnotatorKind;
use crate::error::BackendError;
use crate::sentence::Sentence;
use crate::tokenizer::Token;

/// Versão do contrato binário entre o host e plugins nativos.
pub const BACKEND_ABI_VERSION: u32 = 1;

/// Símbolo que retorna a versão do contrato (`extern "C" fn() -> u32`).
pub const ABI_VERSION_SYMBOL: &[u8] = b"vnlp_backend_abi_version\0";

/// Símbolo da fábrica do backend ([`CreateBackendFn`]).
pub const CREATE_SYMBOL: &[u8] = b"vnlp_backend_create\0";

/// Assinatura da fábrica exportada por plugins nativos.
pub type CreateBackendFn = fn(&LoadContext) -> Result<Box<dyn Backend>, BackendError>;

/// Assinatura da função de versão exportada por plugins nativos.
pub type AbiVersionFn = extern "C" fn() -> u32;

/// Frase de aquecimento padrão.
pub const DEFAULT_WARMUP_TEXT: &str =
    "Ông Nguyễn Khắc Chúc đang làm việc tại Đại học Quốc gia Hà Nội.";

/// Identificação do backend carregado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    pub name: String,
    pub version: String,
}

/// Política de concorrência de um estágio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// Pode ser chamado por várias threads ao mesmo tempo.
    #[default]
    Shared,
    /// O registro serializa as chamadas com uma seção crítica própria do handle.
    Serialized,
}

/// Contexto de carregamento: o diretório-base para resolver arquivos de dados.
///
/// Substitui qualquer mudança no diretório de trabalho do processo: o backend
/// recebe a base explicitamente e resolve seus caminhos relativos a ela.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadContext {
    artifact: PathBuf,
    base_dir: PathBuf,
}

impl LoadContext {
    /// Cria o contexto a partir do caminho do artefato; a base é o diretório que o contém.
    pub fn for_artifact(artifact: impl Into<PathBuf>) -> Self {
        let artifact = artifact.into();
        let base_dir = artifact
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { artifact, base_dir }
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve um caminho de dados: relativo → sob `base_dir`; absoluto → inalterado.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.base_dir.join(relative)
        }
    }
}

/// Um estágio de análise inicializado.
pub trait Annotator: Send + Sync {
    fn kind(&self) -> AnnotatorKind;

    /// Aplica o estágio à sentença, preenchendo os campos que lhe cabem.
    fn annotate(&self, sentence: &mut Sentence) -> Result<(), BackendError>;

    fn concurrency(&self) -> Concurrency {
        Concurrency::Shared
    }
}

/// O módulo de análise carregado.
pub trait Backend: Send + Sync {
    fn info(&self) -> BackendInfo;

    /// Divide o texto em uma sequência plana de tokens.
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Agrupa tokens em sentenças ordenadas (função pura).
    fn split_sentences(&self, tokens: Vec<Token>) -> Vec<Vec<Token>>;

    /// Inicializador específico do estágio; chamado no máximo uma vez por tipo.
    fn init_annotator(&self, kind: AnnotatorKind) -> Result<Box<dyn Annotator>, BackendError>;

    /// Detecta o idioma do texto (código curto, ex: `"vi"`).
    fn detect_language(&self, text: &str) -> Result<String, BackendError>;

    /// Texto usado na passada de aquecimento.
    fn warmup_text(&self) -> &str {
        DEFAULT_WARMUP_TEXT
    }
}

/// Exporta os pontos de entrada de um plugin nativo.
///
/// ```ignore
/// fn create(ctx: &vnlp_core::LoadContext) -> Result<Box<dyn vnlp_core::Backend>, vnlp_core::BackendError> {
///     Ok(Box::new(MyBackend::open(ctx)?))
/// }
/// vnlp_core::declare_backend!(create);
/// ```
#[macro_export]
macro_rules! declare_backend {
    ($create:path) => {
        #[no_mangle]
        pub extern "C" fn vnlp_backend_abi_version() -> u32 {
            $crate::backend::BACKEND_ABI_VERSION
        }

        #[no_mangle]
        pub fn vnlp_backend_create(
            ctx: &$crate::backend::LoadContext,
        ) -> ::std::result::Result<
            ::std::boxed::Box<dyn $crate::backend::Backend>,
            $crate::error::BackendError,
        > {
            let create: $crate::backend::CreateBackendFn = $create;
            create(ctx)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_resolves_against_artifact_dir() {
        let ctx = LoadContext::for_artifact("/opt/models/vi/backend.toml");
        assert_eq!(ctx.base_dir(), Path::new("/opt/models/vi"));
        assert_eq!(ctx.resolve("pos/train.txt"), PathBuf::from("/opt/models/vi/pos/train.txt"));
        assert_eq!(ctx.resolve("/data/x.txt"), PathBuf::from("/data/x.txt"));
    }

    #[test]
    fn test_context_bare_file_name() {
        let ctx = LoadContext::for_artifact("backend.toml");
        assert_eq!(ctx.base_dir(), Path::new("."));
    }
}
