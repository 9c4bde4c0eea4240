//! # Sentença de Trabalho e Palavras Anotadas
//!
//! Uma [`Sentence`] é criada pelo orquestrador para cada grupo de tokens, passa
//! por `&mut` pelos estágios selecionados e é convertida na lista final de
//! [`AnnotatedWord`]. Ela pertence a uma única chamada e nunca é compartilhada.
//!
//! Campos de estágios que não rodaram ficam `None` e são omitidos no JSON:
//! ausência significa "não calculado", nunca um valor padrão.

use serde::{Deserialize, Serialize};

use crate::tokenizer::Token;

/// Fronteira de palavra produzida pelo segmentador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBoundary {
    /// Byte inicial da palavra no texto original.
    pub start: usize,
    /// Byte final (exclusivo).
    pub end: usize,
    /// Número de sílabas unidas (`sinh_viên` → 2).
    pub syllables: usize,
}

/// Unidade de saída: uma palavra com as anotações dos estágios executados.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedWord {
    /// Posição 1-based dentro da sentença.
    pub index: usize,
    pub form: String,
    #[serde(rename = "wseg", default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<WordBoundary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ner_label: Option<String>,
    /// Índice 1-based do núcleo; `0` para a raiz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dep_label: Option<String>,
}

/// Palavra em processamento, com offsets no texto original.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub form: String,
    pub start: usize,
    pub end: usize,
    pub boundary: Option<WordBoundary>,
    pub pos_tag: Option<String>,
    pub ner_label: Option<String>,
    pub head: Option<usize>,
    pub dep_label: Option<String>,
}

impl Word {
    pub fn from_token(token: &Token) -> Self {
        Self {
            form: token.text.clone(),
            start: token.start,
            end: token.end,
            boundary: None,
            pos_tag: None,
            ner_label: None,
            head: None,
            dep_label: None,
        }
    }

    pub fn is_punctuation(&self) -> bool {
        !self.form.chars().any(char::is_alphanumeric)
    }

    pub fn is_capitalized(&self) -> bool {
        self.form.chars().next().is_some_and(char::is_uppercase)
    }
}

/// Sentença de trabalho passada aos estágios.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sentence {
    pub words: Vec<Word>,
}

impl Sentence {
    /// Uma palavra por token (sem segmentação).
    pub fn from_tokens(tokens: &[Token]) -> Self {
        Self {
            words: tokens.iter().map(Word::from_token).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Formas das palavras atuais (conveniência para os estágios).
    pub fn forms(&self) -> Vec<&str> {
        self.words.iter().map(|w| w.form.as_str()).collect()
    }

    /// Converte na saída final, numerando as palavras a partir de 1.
    pub fn into_annotated(self) -> Vec<AnnotatedWord> {
        self.words
            .into_iter()
            .enumerate()
            .map(|(i, word)| AnnotatedWord {
                index: i + 1,
                form: word.form,
                boundary: word.boundary,
                pos_tag: word.pos_tag,
                ner_label: word.ner_label,
                head: word.head,
                dep_label: word.dep_label,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_unset_fields_are_omitted() {
        let sentence = Sentence::from_tokens(&tokenize("Xin chào"));
        let words = sentence.into_annotated();
        let json = serde_json::to_value(&words[0]).unwrap();
        assert_eq!(json, serde_json::json!({"index": 1, "form": "Xin"}));
    }

    #[test]
    fn test_field_names() {
        let word = AnnotatedWord {
            index: 2,
            form: "sinh_viên".into(),
            boundary: Some(WordBoundary { start: 7, end: 17, syllables: 2 }),
            pos_tag: Some("N".into()),
            ner_label: Some("O".into()),
            head: Some(1),
            dep_label: Some("dob".into()),
        };
        let json = serde_json::to_value(&word).unwrap();
        assert_eq!(json["wseg"]["syllables"], 2);
        assert_eq!(json["posTag"], "N");
        assert_eq!(json["nerLabel"], "O");
        assert_eq!(json["depLabel"], "dob");
    }
}
