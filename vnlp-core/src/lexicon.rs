//! # Backend de Léxico Embutido
//!
//! Backend dirigido por dados, descrito por um manifesto TOML ao lado dos
//! arquivos de modelo:
//!
//! ```toml
//! name = "vnlp-lexicon-vi"
//! version = "1.0.0"
//! sample = "Ông Nguyễn Khắc Chúc đang làm việc tại Đại học Quốc gia Hà Nội."
//!
//! [segmenter]
//! vocabulary = "wordseg/vocabulary.txt"
//! max_syllables = 4
//!
//! [tagger]
//! corpus = "pos/train.txt"
//!
//! [recognizer]
//! gazetteer = "ner/gazetteer.tsv"
//!
//! [parser]
//! enabled = true
//!
//! [languages]
//! vi = "lang/vi.txt"
//! en = "lang/en.txt"
//! ```
//!
//! Caminhos relativos são resolvidos contra o diretório do manifesto
//! ([`LoadContext::resolve`]). Os dados de cada estágio só são lidos quando o
//! estágio é inicializado; as listas de idioma são lidas na abertura.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::annotator::AnnotatorKind;
use crate::backend::{Annotator, Backend, BackendInfo, LoadContext, DEFAULT_WARMUP_TEXT};
use crate::error::{BackendError, LoadError};
use crate::language::LanguageDetector;
use crate::parser::RuleParser;
use crate::pos_tagger::HmmTagger;
use crate::recognizer::Recognizer;
use crate::segmenter::{Segmenter, DEFAULT_MAX_SYLLABLES};
use crate::tokenizer::{self, Token};

/// Conteúdo do `backend.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub sample: Option<String>,
    #[serde(default)]
    pub segmenter: Option<SegmenterSection>,
    #[serde(default)]
    pub tagger: Option<TaggerSection>,
    #[serde(default)]
    pub recognizer: Option<RecognizerSection>,
    #[serde(default)]
    pub parser: Option<ParserSection>,
    /// Código do idioma → lista de palavras frequentes.
    #[serde(default)]
    pub languages: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmenterSection {
    pub vocabulary: PathBuf,
    #[serde(default)]
    pub max_syllables: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaggerSection {
    pub corpus: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecognizerSection {
    #[serde(default)]
    pub gazetteer: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserSection {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Manifest {
    /// Parseia o texto do manifesto.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Estágios que o manifesto declara.
    pub fn declared_kinds(&self) -> Vec<AnnotatorKind> {
        AnnotatorKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                AnnotatorKind::Segmenter => self.segmenter.is_some(),
                AnnotatorKind::Tagger => self.tagger.is_some(),
                AnnotatorKind::Recognizer => self.recognizer.is_some(),
                AnnotatorKind::Parser => self.parser.as_ref().is_some_and(|p| p.enabled),
            })
            .collect()
    }
}

/// O backend de léxico aberto a partir de um manifesto.
#[derive(Debug)]
pub struct LexiconBackend {
    manifest: Manifest,
    context: LoadContext,
    detector: LanguageDetector,
}

impl LexiconBackend {
    /// Lê o manifesto de `context.artifact()` e as listas de idioma.
    pub fn open(context: &LoadContext) -> Result<Self, LoadError> {
        let artifact = context.artifact();
        let incompatible = |reason: String| LoadError::IncompatibleBackend {
            path: artifact.to_path_buf(),
            reason,
        };

        let text = fs::read_to_string(artifact)
            .map_err(|e| incompatible(format!("unreadable manifest: {e}")))?;
        let manifest = Manifest::parse(&text).map_err(|e| incompatible(e.to_string()))?;

        if manifest.declared_kinds().is_empty() && manifest.languages.is_empty() {
            return Err(incompatible("manifest declares no capabilities".into()));
        }

        let mut detector = LanguageDetector::new();
        for (code, list) in &manifest.languages {
            let words = read_lines(&context.resolve(list))
                .map_err(|e| LoadError::InitializationFailure(format!("language \"{code}\": {e}")))?;
            debug!("Idioma {code}: {} palavras", words.len());
            detector.add_language(code, words);
        }

        Ok(Self {
            manifest,
            context: context.clone(),
            detector,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn missing_section(kind: AnnotatorKind, section: &str) -> BackendError {
        BackendError::new(format!(
            "annotator \"{}\" needs a [{section}] section in the manifest",
            kind.code()
        ))
    }

    fn init_segmenter(&self) -> Result<Segmenter, BackendError> {
        let section = self
            .manifest
            .segmenter
            .as_ref()
            .ok_or_else(|| Self::missing_section(AnnotatorKind::Segmenter, "segmenter"))?;
        let entries = read_lines(&self.context.resolve(&section.vocabulary))?;
        let segmenter = Segmenter::new(entries, section.max_syllables.unwrap_or(DEFAULT_MAX_SYLLABLES));
        debug!("Segmentador: {} entradas no vocabulário", segmenter.vocabulary_size());
        Ok(segmenter)
    }

    fn init_tagger(&self) -> Result<HmmTagger, BackendError> {
        let section = self
            .manifest
            .tagger
            .as_ref()
            .ok_or_else(|| Self::missing_section(AnnotatorKind::Tagger, "tagger"))?;
        let path = self.context.resolve(&section.corpus);
        let corpus = HmmTagger::parse_corpus(&read_file(&path)?)?;
        if corpus.is_empty() {
            return Err(BackendError::new(format!(
                "training corpus \"{}\" is empty",
                path.display()
            )));
        }
        let tagger = HmmTagger::train(&corpus);
        debug!(
            "Tagger HMM treinado: {} sentenças, {} tags",
            corpus.len(),
            tagger.tags().len()
        );
        Ok(tagger)
    }

    fn init_recognizer(&self) -> Result<Recognizer, BackendError> {
        let section = self
            .manifest
            .recognizer
            .as_ref()
            .ok_or_else(|| Self::missing_section(AnnotatorKind::Recognizer, "recognizer"))?;
        let mut recognizer = Recognizer::new();
        if let Some(gazetteer) = &section.gazetteer {
            let count = recognizer.parse_gazetteer(&read_file(&self.context.resolve(gazetteer))?)?;
            debug!("Gazetteer: {count} entradas");
        }
        Ok(recognizer)
    }

    fn init_parser(&self) -> Result<RuleParser, BackendError> {
        match &self.manifest.parser {
            Some(section) if section.enabled => Ok(RuleParser::new()),
            Some(_) => Err(BackendError::new("annotator \"parse\" is disabled in the manifest")),
            None => Err(Self::missing_section(AnnotatorKind::Parser, "parser")),
        }
    }
}

impl Backend for LexiconBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: self.manifest.name.clone(),
            version: self.manifest.version.clone(),
        }
    }

    fn tokenize(&self, text: &str) -> Vec<Token> {
        tokenizer::tokenize(text)
    }

    fn split_sentences(&self, tokens: Vec<Token>) -> Vec<Vec<Token>> {
        tokenizer::split_sentences(tokens)
    }

    fn init_annotator(&self, kind: AnnotatorKind) -> Result<Box<dyn Annotator>, BackendError> {
        Ok(match kind {
            AnnotatorKind::Segmenter => Box::new(self.init_segmenter()?),
            AnnotatorKind::Tagger => Box::new(self.init_tagger()?),
            AnnotatorKind::Recognizer => Box::new(self.init_recognizer()?),
            AnnotatorKind::Parser => Box::new(self.init_parser()?),
        })
    }

    fn detect_language(&self, text: &str) -> Result<String, BackendError> {
        self.detector.detect(text)
    }

    fn warmup_text(&self) -> &str {
        self.manifest.sample.as_deref().unwrap_or(DEFAULT_WARMUP_TEXT)
    }
}

fn read_file(path: &Path) -> Result<String, BackendError> {
    fs::read_to_string(path)
        .map_err(|e| BackendError::new(format!("cannot read \"{}\": {e}", path.display())))
}

/// Linhas não vazias, sem comentários `#`.
fn read_lines(path: &Path) -> Result<Vec<String>, BackendError> {
    Ok(read_file(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::Sentence;
    use std::io::Write;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::File::create(path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }

    fn fixture() -> (tempfile::TempDir, LoadContext) {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "backend.toml",
            r#"
name = "test-lexicon"
version = "0.1.0"

[segmenter]
vocabulary = "wordseg/vocab.txt"

[tagger]
corpus = "pos/train.txt"

[recognizer]
gazetteer = "ner/gazetteer.tsv"

[languages]
vi = "lang/vi.txt"
"#,
        );
        write(dir.path(), "wordseg/vocab.txt", "# vocabulário\nsinh viên\ntôi\n");
        write(dir.path(), "pos/train.txt", "Tôi/P là/V sinh_viên/N ./CH\n");
        write(dir.path(), "ner/gazetteer.tsv", "Hà Nội\tLOC\n");
        write(dir.path(), "lang/vi.txt", "tôi\nlà\n");
        let ctx = LoadContext::for_artifact(dir.path().join("backend.toml"));
        (dir, ctx)
    }

    #[test]
    fn test_open_and_init_stages() {
        let (_dir, ctx) = fixture();
        let backend = LexiconBackend::open(&ctx).unwrap();
        assert_eq!(backend.info().name, "test-lexicon");
        assert_eq!(backend.warmup_text(), DEFAULT_WARMUP_TEXT);

        let wseg = backend.init_annotator(AnnotatorKind::Segmenter).unwrap();
        let pos = backend.init_annotator(AnnotatorKind::Tagger).unwrap();
        let tokens = backend.tokenize("Tôi là sinh viên.");
        let mut sentence = Sentence::from_tokens(&tokens);
        wseg.annotate(&mut sentence).unwrap();
        pos.annotate(&mut sentence).unwrap();
        assert_eq!(sentence.forms(), vec!["Tôi", "là", "sinh_viên", "."]);
        assert_eq!(sentence.words[2].pos_tag.as_deref(), Some("N"));
    }

    #[test]
    fn test_undeclared_stage_fails_at_init() {
        let (_dir, ctx) = fixture();
        let backend = LexiconBackend::open(&ctx).unwrap();
        let err = backend.init_annotator(AnnotatorKind::Parser).err().unwrap();
        assert!(err.message.contains("[parser]"));
    }

    #[test]
    fn test_missing_data_file_fails_at_init_only() {
        let (dir, ctx) = fixture();
        fs::remove_file(dir.path().join("pos/train.txt")).unwrap();
        let backend = LexiconBackend::open(&ctx).unwrap();
        assert!(backend.init_annotator(AnnotatorKind::Segmenter).is_ok());
        assert!(backend.init_annotator(AnnotatorKind::Tagger).is_err());
    }

    #[test]
    fn test_missing_language_list_fails_open() {
        let (dir, ctx) = fixture();
        fs::remove_file(dir.path().join("lang/vi.txt")).unwrap();
        let err = LexiconBackend::open(&ctx).unwrap_err();
        assert!(matches!(err, LoadError::InitializationFailure(_)));
    }

    #[test]
    fn test_malformed_manifest_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "backend.toml", "name = \n[[[");
        let ctx = LoadContext::for_artifact(dir.path().join("backend.toml"));
        let err = LexiconBackend::open(&ctx).unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleBackend { .. }));
    }

    #[test]
    fn test_manifest_without_capabilities_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "backend.toml", "name = \"x\"\nversion = \"1\"\n");
        let ctx = LoadContext::for_artifact(dir.path().join("backend.toml"));
        let err = LexiconBackend::open(&ctx).unwrap_err();
        assert!(matches!(err, LoadError::IncompatibleBackend { .. }));
    }

    #[test]
    fn test_declared_kinds() {
        let manifest = Manifest::parse(
            "name = \"x\"\nversion = \"1\"\n[tagger]\ncorpus = \"c\"\n[parser]\nenabled = false\n",
        )
        .unwrap();
        assert_eq!(manifest.declared_kinds(), vec![AnnotatorKind::Tagger]);
    }

    #[test]
    fn test_language_detection() {
        let (_dir, ctx) = fixture();
        let backend = LexiconBackend::open(&ctx).unwrap();
        assert_eq!(backend.detect_language("Tôi là sinh viên").unwrap(), "vi");
    }
}
