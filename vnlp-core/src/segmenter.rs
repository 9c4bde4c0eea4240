//! # Segmentador de Palavras (`wseg`)
//!
//! Em vietnamita o espaço separa **sílabas**, não palavras: "sinh viên"
//! (estudante) é uma palavra de duas sílabas. O segmentador agrupa sílabas em
//! palavras e as une com `_` (`sinh_viên`), o formato esperado pelos estágios
//! seguintes.
//!
//! ## Estratégia
//!
//! 1. **Maior casamento no vocabulário**: a partir de cada posição tenta a maior
//!    sequência (até `max_syllables`) presente no vocabulário, sem diferenciar caixa.
//! 2. **Nomes próprios**: sequências de sílabas capitalizadas viram uma única
//!    palavra (`Hà Nội` → `Hà_Nội`). A primeira sílaba da sentença só entra no
//!    nome se não for uma palavra comum conhecida (`Tôi`, `Ông`).
//! 3. Qualquer outra sílaba, número ou pontuação fica sozinha.
//!
//! Toda palavra produzida carrega sua [`WordBoundary`].

use std::collections::HashSet;

use crate::annotator::AnnotatorKind;
use crate::backend::Annotator;
use crate::error::BackendError;
use crate::sentence::{Sentence, Word, WordBoundary};

/// Tamanho máximo padrão de uma palavra em sílabas.
pub const DEFAULT_MAX_SYLLABLES: usize = 4;

/// Segmentador baseado em vocabulário.
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Entradas em minúsculas com sílabas separadas por espaço ("sinh viên").
    vocabulary: HashSet<String>,
    max_syllables: usize,
}

impl Segmenter {
    /// Cria o segmentador; entradas podem usar espaço ou `_` entre sílabas.
    pub fn new<I, S>(entries: I, max_syllables: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary = entries
            .into_iter()
            .map(|entry| normalize(entry.as_ref()))
            .filter(|entry| !entry.is_empty())
            .collect();
        Self {
            vocabulary,
            max_syllables: max_syllables.max(1),
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Agrupa as sílabas de uma sentença em palavras.
    pub fn segment(&self, syllables: &[Word]) -> Vec<Word> {
        let mut words = Vec::with_capacity(syllables.len());
        let mut i = 0;

        while i < syllables.len() {
            let len = self
                .longest_vocabulary_match(syllables, i)
                .or_else(|| self.proper_name_run(syllables, i))
                .unwrap_or(1);
            words.push(merge(&syllables[i..i + len]));
            i += len;
        }
        words
    }

    fn longest_vocabulary_match(&self, syllables: &[Word], start: usize) -> Option<usize> {
        let limit = self.max_syllables.min(syllables.len() - start);
        (2..=limit).rev().find(|&len| {
            let window = &syllables[start..start + len];
            window.iter().all(is_syllable) && self.vocabulary.contains(&joined_lower(window))
        })
    }

    fn proper_name_run(&self, syllables: &[Word], start: usize) -> Option<usize> {
        let first = &syllables[start];
        if !is_syllable(first) || !first.is_capitalized() {
            return None;
        }
        if start == 0 && self.vocabulary.contains(&first.form.to_lowercase()) {
            return None;
        }
        let len = syllables[start..]
            .iter()
            .take_while(|w| is_syllable(w) && w.is_capitalized())
            .count();
        (len >= 2).then_some(len)
    }
}

impl Annotator for Segmenter {
    fn kind(&self) -> AnnotatorKind {
        AnnotatorKind::Segmenter
    }

    fn annotate(&self, sentence: &mut Sentence) -> Result<(), BackendError> {
        sentence.words = self.segment(&sentence.words);
        Ok(())
    }
}

fn normalize(entry: &str) -> String {
    entry
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn joined_lower(window: &[Word]) -> String {
    window
        .iter()
        .map(|w| w.form.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sílaba alfabética (não número, não pontuação).
fn is_syllable(word: &Word) -> bool {
    word.form.chars().all(char::is_alphabetic)
}

fn merge(window: &[Word]) -> Word {
    let first = &window[0];
    let last = &window[window.len() - 1];
    let form = window
        .iter()
        .map(|w| w.form.as_str())
        .collect::<Vec<_>>()
        .join("_");
    Word {
        form,
        start: first.start,
        end: last.end,
        boundary: Some(WordBoundary {
            start: first.start,
            end: last.end,
            syllables: window.len(),
        }),
        pos_tag: None,
        ner_label: None,
        head: None,
        dep_label: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn segmenter() -> Segmenter {
        Segmenter::new(["sinh viên", "đại_học", "quốc gia", "tôi", "ông", "làm việc"], 4)
    }

    fn forms(text: &str) -> Vec<String> {
        let mut sentence = Sentence::from_tokens(&tokenize(text));
        segmenter().annotate(&mut sentence).unwrap();
        sentence.words.into_iter().map(|w| w.form).collect()
    }

    #[test]
    fn test_vocabulary_merge() {
        assert_eq!(forms("Tôi là sinh viên."), vec!["Tôi", "là", "sinh_viên", "."]);
    }

    #[test]
    fn test_proper_names() {
        assert_eq!(
            forms("Ông Nguyễn Khắc Chúc làm việc tại Đại học Quốc gia Hà Nội"),
            vec!["Ông", "Nguyễn_Khắc_Chúc", "làm_việc", "tại", "Đại_học", "Quốc_gia", "Hà_Nội"]
        );
    }

    #[test]
    fn test_every_word_has_boundary() {
        let text = "Tôi là sinh viên.";
        let mut sentence = Sentence::from_tokens(&tokenize(text));
        segmenter().annotate(&mut sentence).unwrap();
        for word in &sentence.words {
            let boundary = word.boundary.expect("boundary");
            assert_eq!(text[boundary.start..boundary.end].replace(' ', "_"), word.form);
        }
        assert_eq!(sentence.words[2].boundary.unwrap().syllables, 2);
    }

    #[test]
    fn test_decomposed_diacritics_still_match() {
        assert_eq!(forms("Tôi là sinh vie\u{0302}n."), vec!["Tôi", "là", "sinh_viên", "."]);
    }

    #[test]
    fn test_numbers_and_punctuation_stay_alone() {
        assert_eq!(forms("Quốc gia 1.000 ."), vec!["Quốc_gia", "1.000", "."]);
    }
}
