//! # Tratamento de Requisições
//!
//! Ponto único entre o transporte (HTTP) e o engine. Toda requisição termina
//! em um [`ResponseEnvelope`]; nenhuma falha de requisição escapa daqui.
//!
//! | `text`    | `props`               | Resultado                                   |
//! |-----------|-----------------------|---------------------------------------------|
//! | ausente   | qualquer              | `status=false`, `"Text must not be null."`  |
//! | presente  | ausente               | anotação com o conjunto do startup          |
//! | presente  | `lang` (sem caixa)    | `status=true`, `language` (ou `N/A`)        |
//! | presente  | `wseg,pos,...`        | anotação com o subconjunto pedido           |

use serde::{Deserialize, Serialize};

use crate::annotator::AnnotatorSet;
use crate::pipeline::Engine;
use crate::sentence::AnnotatedWord;

/// Mensagem para requisições sem `text`.
pub const MISSING_TEXT: &str = "Text must not be null.";

/// Valor de `props` que pede só a detecção de idioma.
pub const LANGUAGE_PROPS: &str = "lang";

/// Envelope JSON uniforme de resposta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentences: Option<Vec<Vec<AnnotatedWord>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn language(code: String) -> Self {
        Self {
            status: true,
            language: Some(code),
            sentences: None,
            error: None,
        }
    }

    pub fn sentences(sentences: Vec<Vec<AnnotatedWord>>) -> Self {
        Self {
            status: true,
            language: None,
            sentences: Some(sentences),
            error: None,
        }
    }

    pub fn failure(message: impl ToString) -> Self {
        Self {
            status: false,
            language: None,
            sentences: None,
            error: Some(message.to_string()),
        }
    }
}

/// Atende uma requisição `handle(text, props)`.
pub fn handle(engine: &Engine, text: Option<&str>, props: Option<&str>) -> ResponseEnvelope {
    let Some(text) = text else {
        return ResponseEnvelope::failure(MISSING_TEXT);
    };

    let set = match props {
        None => engine.annotators(),
        Some(p) if p.trim().eq_ignore_ascii_case(LANGUAGE_PROPS) => {
            return ResponseEnvelope::language(engine.detect_language(text));
        }
        Some(p) => match AnnotatorSet::parse(p) {
            Ok(set) => set,
            Err(e) => return ResponseEnvelope::failure(e),
        },
    };

    match engine.annotate(text, &set) {
        Ok(sentences) => ResponseEnvelope::sentences(sentences),
        Err(e) => ResponseEnvelope::failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use serde_json::json;

    fn engine(set: &str) -> Engine {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../models/vi/backend.toml");
        let backend = loader::load(path).unwrap();
        Engine::new(backend, AnnotatorSet::parse(set).unwrap()).unwrap()
    }

    #[test]
    fn test_missing_text() {
        let envelope = handle(&engine("wseg"), None, Some("wseg"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": false, "error": "Text must not be null."})
        );
    }

    #[test]
    fn test_segment_and_tag() {
        let envelope = handle(&engine("wseg,pos,ner,parse"), Some("Tôi là sinh viên."), Some("wseg,pos"));
        assert!(envelope.status);
        let sentences = envelope.sentences.unwrap();
        assert_eq!(sentences.len(), 1);
        let forms: Vec<&str> = sentences[0].iter().map(|w| w.form.as_str()).collect();
        assert_eq!(forms, vec!["Tôi", "là", "sinh_viên", "."]);
        let tags: Vec<&str> = sentences[0].iter().filter_map(|w| w.pos_tag.as_deref()).collect();
        assert_eq!(tags, vec!["P", "V", "N", "CH"]);
        assert!(sentences[0].iter().all(|w| w.ner_label.is_none() && w.head.is_none()));
    }

    #[test]
    fn test_invalid_annotator() {
        let envelope = handle(&engine("wseg"), Some("Tôi là sinh viên."), Some("bogus"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": false, "error": "Annotator \"bogus\" is invalid."})
        );
    }

    #[test]
    fn test_props_absent_uses_startup_set() {
        let envelope = handle(&engine("wseg,ner"), Some("Tôi sống ở Hà Nội."), None);
        let sentences = envelope.sentences.unwrap();
        assert!(sentences[0].iter().all(|w| w.boundary.is_some() && w.ner_label.is_some()));
        assert!(sentences[0].iter().all(|w| w.pos_tag.is_none()));
        let hanoi = sentences[0].iter().find(|w| w.form == "Hà_Nội").unwrap();
        assert_eq!(hanoi.ner_label.as_deref(), Some("B-LOC"));
    }

    #[test]
    fn test_language_query() {
        let engine = engine("wseg");
        for props in ["lang", " LANG ", "Lang"] {
            let envelope = handle(&engine, Some("Tôi là sinh viên."), Some(props));
            assert_eq!(envelope, ResponseEnvelope::language("vi".into()));
        }
        let envelope = handle(&engine, Some("12345"), Some("lang"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": true, "language": "N/A"})
        );
    }

    #[test]
    fn test_unavailable_stage() {
        let envelope = handle(&engine("wseg"), Some("Tôi là sinh viên."), Some("parse"));
        assert_eq!(envelope.error.as_deref(), Some("Annotator \"parse\" is not available."));
    }

    #[test]
    fn test_empty_text_is_success() {
        let envelope = handle(&engine("wseg"), Some(""), None);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": true, "sentences": []})
        );
    }
}
