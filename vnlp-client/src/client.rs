//! Cliente assíncrono sobre `reqwest`.
//!
//! | Método            | Requisição                              | Retorno               |
//! |-------------------|-----------------------------------------|-----------------------|
//! | `is_alive`        | `GET /`                                 | `bool`                |
//! | `annotators`      | `GET /annotators`                       | conjunto do startup   |
//! | `annotate`        | `POST /handle` com os estágios da config| sentenças anotadas    |
//! | `detect_language` | `POST /handle`, `props=lang`            | código ou `N/A`       |
//! | `tokenize`        | `wseg`                                  | formas por sentença   |
//! | `pos_tag`         | `wseg,pos`                              | `(forma, tag)`        |
//! | `ner`             | `wseg,ner`                              | `(forma, rótulo BIO)` |
//! | `dep_parse`       | `wseg,pos,parse`                        | [`Dependency`]        |

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use vnlp_core::handler::LANGUAGE_PROPS;
use vnlp_core::{AnnotatedWord, AnnotatorKind, AnnotatorSet, ResponseEnvelope};

use crate::error::ClientError;

/// Endereço do servidor e estágios padrão das chamadas.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host (`127.0.0.1`) ou URL base (`http://nlp.local`).
    pub address: String,
    pub port: u16,
    pub timeout: Duration,
    /// Estágios usados por [`VnlpClient::annotate`]; vazio deixa o servidor
    /// aplicar o conjunto do startup.
    pub annotators: AnnotatorSet,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 9000,
            timeout: Duration::from_secs(30),
            annotators: AnnotatorSet::all(),
        }
    }
}

/// Um arco de dependência devolvido por [`VnlpClient::dep_parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Posição 1-based da palavra na sentença.
    pub index: usize,
    pub form: String,
    /// Núcleo 1-based; `0` para a raiz.
    pub head: usize,
    pub label: String,
}

/// Cliente do `vnlp-server`.
#[derive(Debug, Clone)]
pub struct VnlpClient {
    base_url: String,
    annotators: AnnotatorSet,
    http: Client,
}

impl VnlpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let address = config.address.trim_end_matches('/');
        let base_url = if address.starts_with("http://") || address.starts_with("https://") {
            format!("{address}:{}", config.port)
        } else {
            format!("http://{address}:{}", config.port)
        };

        Ok(Self {
            base_url,
            annotators: config.annotators,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `true` se `GET /` responde com sucesso dentro do timeout.
    pub async fn is_alive(&self) -> bool {
        match self.http.get(format!("{}/", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Servidor {} inacessível: {e}", self.base_url);
                false
            }
        }
    }

    /// Estágios carregados pelo servidor, na ordem do pipeline.
    pub async fn annotators(&self) -> Result<AnnotatorSet, ClientError> {
        let codes: Vec<String> = self
            .http
            .get(format!("{}/annotators", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        codes
            .iter()
            .map(|code| {
                AnnotatorKind::from_code(code).ok_or_else(|| {
                    ClientError::UnexpectedResponse(format!("unknown annotator \"{code}\""))
                })
            })
            .collect()
    }

    /// Anota com os estágios da configuração.
    pub async fn annotate(&self, text: &str) -> Result<Vec<Vec<AnnotatedWord>>, ClientError> {
        self.annotate_with(text, &self.annotators).await
    }

    /// Anota com os estágios de `set`.
    pub async fn annotate_with(
        &self,
        text: &str,
        set: &AnnotatorSet,
    ) -> Result<Vec<Vec<AnnotatedWord>>, ClientError> {
        let props = (!set.is_empty()).then(|| set.to_string());
        self.handle(text, props.as_deref())
            .await?
            .sentences
            .ok_or_else(|| ClientError::UnexpectedResponse("envelope without sentences".into()))
    }

    /// Código do idioma de `text`; `N/A` quando o servidor não decide.
    pub async fn detect_language(&self, text: &str) -> Result<String, ClientError> {
        self.handle(text, Some(LANGUAGE_PROPS))
            .await?
            .language
            .ok_or_else(|| ClientError::UnexpectedResponse("envelope without language".into()))
    }

    pub async fn tokenize(&self, text: &str) -> Result<Vec<Vec<String>>, ClientError> {
        let sentences = self.annotate_with(text, &stages(&[AnnotatorKind::Segmenter])).await?;
        Ok(sentences
            .into_iter()
            .map(|sentence| sentence.into_iter().map(|word| word.form).collect())
            .collect())
    }

    pub async fn pos_tag(&self, text: &str) -> Result<Vec<Vec<(String, String)>>, ClientError> {
        let set = stages(&[AnnotatorKind::Segmenter, AnnotatorKind::Tagger]);
        let sentences = self.annotate_with(text, &set).await?;
        convert(sentences, "posTag", |word| {
            word.pos_tag.map(|tag| (word.form, tag))
        })
    }

    pub async fn ner(&self, text: &str) -> Result<Vec<Vec<(String, String)>>, ClientError> {
        let set = stages(&[AnnotatorKind::Segmenter, AnnotatorKind::Recognizer]);
        let sentences = self.annotate_with(text, &set).await?;
        convert(sentences, "nerLabel", |word| {
            word.ner_label.map(|label| (word.form, label))
        })
    }

    pub async fn dep_parse(&self, text: &str) -> Result<Vec<Vec<Dependency>>, ClientError> {
        let set = stages(&[
            AnnotatorKind::Segmenter,
            AnnotatorKind::Tagger,
            AnnotatorKind::Parser,
        ]);
        let sentences = self.annotate_with(text, &set).await?;
        convert(sentences, "head", |word| match (word.head, word.dep_label) {
            (Some(head), Some(label)) => Some(Dependency {
                index: word.index,
                form: word.form,
                head,
                label,
            }),
            _ => None,
        })
    }

    async fn handle(&self, text: &str, props: Option<&str>) -> Result<ResponseEnvelope, ClientError> {
        let mut form = vec![("text", text)];
        if let Some(props) = props {
            form.push(("props", props));
        }
        debug!("POST {}/handle props={:?}", self.base_url, props);

        let envelope: ResponseEnvelope = self
            .http
            .post(format!("{}/handle", self.base_url))
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if envelope.status {
            Ok(envelope)
        } else {
            Err(ClientError::Server(envelope.error.unwrap_or_default()))
        }
    }
}

fn stages(kinds: &[AnnotatorKind]) -> AnnotatorSet {
    kinds.iter().copied().collect()
}

/// Converte cada palavra; uma palavra sem o campo pedido invalida a resposta.
fn convert<T>(
    sentences: Vec<Vec<AnnotatedWord>>,
    field: &str,
    pick: impl Fn(AnnotatedWord) -> Option<T>,
) -> Result<Vec<Vec<T>>, ClientError> {
    sentences
        .into_iter()
        .map(|sentence| {
            sentence
                .into_iter()
                .map(|word| {
                    let index = word.index;
                    pick(word).ok_or_else(|| {
                        ClientError::UnexpectedResponse(format!("word {index} has no `{field}`"))
                    })
                })
                .collect()
        })
        .collect()
}
