//! # Carregador de Backend
//!
//! Localiza e carrega o módulo de análise a partir do caminho passado no
//! startup. O tipo do artefato é decidido pela extensão:
//!
//! | Extensão                 | Backend                                        |
//! |--------------------------|------------------------------------------------|
//! | `.so`, `.dylib`, `.dll`  | plugin nativo via `libloading`                 |
//! | `.toml`                  | manifesto do backend de léxico embutido        |
//!
//! Arquivos de dados do backend são resolvidos relativos ao diretório do
//! artefato através de [`LoadContext`], nunca pelo diretório de trabalho do
//! processo, que permanece intocado.

use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use libloading::{Library, Symbol};
use tracing::{debug, info};

use crate::backend::{
    AbiVersionFn, Backend, BackendInfo, CreateBackendFn, LoadContext, ABI_VERSION_SYMBOL,
    BACKEND_ABI_VERSION, CREATE_SYMBOL,
};
use crate::error::LoadError;
use crate::lexicon::LexiconBackend;

/// Tipo de artefato reconhecido pelo carregador.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Native,
    Manifest,
}

impl ArtifactKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "so" | "dylib" | "dll" => Some(ArtifactKind::Native),
            "toml" => Some(ArtifactKind::Manifest),
            _ => None,
        }
    }
}

/// Um backend carregado e os recursos que o mantêm vivo.
///
/// A ordem dos campos é a ordem de destruição: o backend (código que vive
/// dentro da biblioteca) é destruído antes da biblioteca ser descarregada.
pub struct LoadedBackend {
    backend: Box<dyn Backend>,
    context: LoadContext,
    kind: ArtifactKind,
    library: Option<Library>,
}

impl LoadedBackend {
    /// Envolve um backend já construído (útil para embutir ou testar).
    pub fn from_backend(backend: Box<dyn Backend>, context: LoadContext) -> Self {
        Self {
            backend,
            context,
            kind: ArtifactKind::Manifest,
            library: None,
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn info(&self) -> BackendInfo {
        self.backend.info()
    }
}

impl std::fmt::Debug for LoadedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedBackend")
            .field("info", &self.backend.info())
            .field("artifact", &self.context.artifact())
            .field("kind", &self.kind)
            .field("native", &self.library.is_some())
            .finish()
    }
}

/// Carrega o backend apontado por `path`.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedBackend, LoadError> {
    let path = path.as_ref();
    if !path.is_file() || File::open(path).is_err() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let kind = ArtifactKind::from_path(path).ok_or_else(|| LoadError::IncompatibleBackend {
        path: path.to_path_buf(),
        reason: "unsupported artifact type (expected .toml, .so, .dylib or .dll)".into(),
    })?;

    let context = LoadContext::for_artifact(path);
    debug!("Resolvendo dados do backend em {}", context.base_dir().display());

    let loaded = match kind {
        ArtifactKind::Manifest => LoadedBackend {
            backend: Box::new(LexiconBackend::open(&context)?),
            context,
            kind,
            library: None,
        },
        ArtifactKind::Native => load_native(path, context)?,
    };

    let info = loaded.info();
    info!(
        "Backend carregado: {} {} ({})",
        info.name,
        info.version,
        path.display()
    );
    Ok(loaded)
}

fn load_native(path: &Path, context: LoadContext) -> Result<LoadedBackend, LoadError> {
    let incompatible = |reason: String| LoadError::IncompatibleBackend {
        path: path.to_path_buf(),
        reason,
    };

    let library = open_isolated(path).map_err(|e| incompatible(e.to_string()))?;

    // SAFETY: os símbolos são resolvidos com as assinaturas do contrato
    // (`AbiVersionFn`, `CreateBackendFn`); a versão é conferida antes da fábrica
    // ser chamada, e a biblioteca fica viva dentro de `LoadedBackend`.
    let create: CreateBackendFn = unsafe {
        let version: Symbol<AbiVersionFn> = library.get(ABI_VERSION_SYMBOL).map_err(|_| {
            incompatible("missing entry point `vnlp_backend_abi_version`".into())
        })?;
        check_abi(version()).map_err(incompatible)?;
        let create: Symbol<CreateBackendFn> = library
            .get(CREATE_SYMBOL)
            .map_err(|_| incompatible("missing entry point `vnlp_backend_create`".into()))?;
        *create
    };

    let backend = instantiate(create, &context)?;

    Ok(LoadedBackend {
        backend,
        context,
        kind: ArtifactKind::Native,
        library: Some(library),
    })
}

fn check_abi(found: u32) -> Result<(), String> {
    if found == BACKEND_ABI_VERSION {
        Ok(())
    } else {
        Err(format!(
            "backend ABI version {found}, host expects {BACKEND_ABI_VERSION}"
        ))
    }
}

/// Chama a fábrica do plugin; erro ou pânico viram `InitializationFailure`.
fn instantiate(create: CreateBackendFn, context: &LoadContext) -> Result<Box<dyn Backend>, LoadError> {
    panic::catch_unwind(AssertUnwindSafe(|| create(context)))
        .map_err(|_| LoadError::InitializationFailure("backend panicked during startup".into()))?
        .map_err(|e| LoadError::InitializationFailure(e.to_string()))
}

/// Abre a biblioteca com escopo de símbolos local, para que suas dependências
/// não colidam com as do host.
#[cfg(unix)]
fn open_isolated(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LOCAL, RTLD_NOW};
    // SAFETY: carregar uma biblioteca executa seus inicializadores; o artefato
    // é escolhido explicitamente pelo operador na linha de comando.
    unsafe { UnixLibrary::open(Some(path.as_os_str()), RTLD_NOW | RTLD_LOCAL) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_isolated(path: &Path) -> Result<Library, libloading::Error> {
    // SAFETY: ver a variante unix.
    unsafe { Library::new(path) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::error::BackendError;

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load("/definitely/not/here/backend.toml").unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_unknown_extension_is_incompatible() {
        let mut file = tempfile::Builder::new().suffix(".jar").tempfile().unwrap();
        writeln!(file, "not a backend").unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleBackend { .. }));
    }

    #[test]
    fn test_garbage_library_is_incompatible() {
        let mut file = tempfile::Builder::new().suffix(".so").tempfile().unwrap();
        writeln!(file, "this is not an ELF object").unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleBackend { .. }));
    }

    /// Uma biblioteca compartilhada real do sistema, sem os pontos de entrada.
    #[cfg(target_os = "linux")]
    fn system_library() -> Option<std::path::PathBuf> {
        [
            "/lib/x86_64-linux-gnu/libm.so.6",
            "/usr/lib/x86_64-linux-gnu/libm.so.6",
            "/lib/aarch64-linux-gnu/libm.so.6",
            "/usr/lib/aarch64-linux-gnu/libm.so.6",
            "/lib64/libm.so.6",
            "/usr/lib64/libm.so.6",
            "/lib/libm.so.6",
            "/usr/lib/libm.so.6",
        ]
        .iter()
        .map(std::path::PathBuf::from)
        .find(|p| p.is_file())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_library_without_entry_points_is_incompatible() {
        let Some(source) = system_library() else {
            eprintln!("libm.so.6 não encontrada; teste ignorado");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.so");
        std::fs::copy(&source, &path).unwrap();

        match load(&path).unwrap_err() {
            LoadError::IncompatibleBackend { reason, .. } => {
                assert!(reason.contains("vnlp_backend_abi_version"), "{reason}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_abi_version_mismatch() {
        assert!(check_abi(BACKEND_ABI_VERSION).is_ok());
        let reason = check_abi(BACKEND_ABI_VERSION + 1).unwrap_err();
        assert_eq!(
            reason,
            format!(
                "backend ABI version {}, host expects {BACKEND_ABI_VERSION}",
                BACKEND_ABI_VERSION + 1
            )
        );
    }

    fn failing_factory(_: &LoadContext) -> Result<Box<dyn Backend>, BackendError> {
        Err(BackendError::new("model directory is empty"))
    }

    fn panicking_factory(_: &LoadContext) -> Result<Box<dyn Backend>, BackendError> {
        panic!("plugin bug")
    }

    fn working_factory(_: &LoadContext) -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(crate::registry::tests::FakeBackend::default()))
    }

    #[test]
    fn test_factory_error_is_initialization_failure() {
        let context = LoadContext::for_artifact("/plugins/libfake.so");
        match instantiate(failing_factory, &context) {
            Err(LoadError::InitializationFailure(message)) => {
                assert!(message.contains("model directory is empty"), "{message}")
            }
            other => panic!("unexpected result: {:?}", other.map(|b| b.info())),
        }
    }

    #[test]
    fn test_factory_panic_is_initialization_failure() {
        let context = LoadContext::for_artifact("/plugins/libfake.so");
        match instantiate(panicking_factory, &context) {
            Err(LoadError::InitializationFailure(message)) => {
                assert_eq!(message, "backend panicked during startup")
            }
            other => panic!("unexpected result: {:?}", other.map(|b| b.info())),
        }
    }

    #[test]
    fn test_factory_success() {
        let context = LoadContext::for_artifact("/plugins/libfake.so");
        let backend = instantiate(working_factory, &context).unwrap();
        assert_eq!(backend.info().name, "fake");
    }

    #[test]
    fn test_artifact_kind_from_extension() {
        assert_eq!(ArtifactKind::from_path(Path::new("a/b.TOML")), Some(ArtifactKind::Manifest));
        assert_eq!(ArtifactKind::from_path(Path::new("libx.so")), Some(ArtifactKind::Native));
        assert_eq!(ArtifactKind::from_path(Path::new("VnCoreNLP.jar")), None);
        assert_eq!(ArtifactKind::from_path(Path::new("noext")), None);
    }
}
