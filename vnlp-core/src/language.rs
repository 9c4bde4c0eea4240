//! # Detecção de Idioma
//!
//! Cada idioma configurado tem uma lista de palavras frequentes. A pontuação
//! de um idioma é a fração das palavras do texto (em minúsculas) presentes na
//! lista; quando `vi` está configurado, letras exclusivas do vietnamita
//! (`đ`, `ư`, `ơ`, tons sobre vogais...) somam um bônus a ele.
//!
//! Sem nenhuma evidência o detector devolve erro, e o orquestrador degrada o
//! resultado para o sentinela `N/A`.

use std::collections::HashSet;

use crate::error::BackendError;

const VIETNAMESE: &str = "vi";

/// Letras que só aparecem em texto vietnamita.
const VIETNAMESE_LETTERS: &str = "ăâđêôơưạảấầẩẫậắằẳẵặẹẻẽếềểễệỉịọỏốồổỗộớờởỡợụủứừửữựỳỵỷỹ";

/// Detector por listas de palavras.
#[derive(Debug, Clone, Default)]
pub struct LanguageDetector {
    profiles: Vec<(String, HashSet<String>)>,
}

impl LanguageDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra (ou substitui) a lista de palavras de um idioma.
    pub fn add_language<I, S>(&mut self, code: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: HashSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        match self.profiles.iter_mut().find(|(c, _)| c == code) {
            Some((_, existing)) => *existing = words,
            None => self.profiles.push((code.to_string(), words)),
        }
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|(code, _)| code.as_str())
    }

    /// Código do idioma com maior pontuação.
    pub fn detect(&self, text: &str) -> Result<String, BackendError> {
        if self.profiles.is_empty() {
            return Err(BackendError::new("no languages configured"));
        }

        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Err(BackendError::new("text has no words"));
        }

        let letters = lower.chars().filter(|c| c.is_alphabetic()).count().max(1) as f64;
        let marked = lower.chars().filter(|c| VIETNAMESE_LETTERS.contains(*c)).count() as f64;

        let mut best: Option<(&str, f64)> = None;
        for (code, list) in &self.profiles {
            let hits = words.iter().filter(|w| list.contains(**w)).count() as f64;
            let mut score = hits / words.len() as f64;
            if code == VIETNAMESE {
                score += (marked / letters * 4.0).min(1.0);
            }
            if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((code, score));
            }
        }

        best.map(|(code, _)| code.to_string())
            .ok_or_else(|| BackendError::new("no language matched"))
    }
}
