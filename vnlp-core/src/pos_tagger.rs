//! # Tagger Morfossintático (`pos`) com HMM
//!
//! Implementação clássica de HMM de primeira ordem onde:
//! - **Estados Ocultos**: classes gramaticais (`N`, `V`, `Np`, `CH`...)
//! - **Observações**: palavras (já segmentadas, ex: `sinh_viên`)
//!
//! O modelo aprende de um corpus `palavra/TAG`:
//! 1. Probabilidade de Transição: P(tag_atual | tag_anterior)
//! 2. Probabilidade de Emissão: P(palavra | tag)
//! 3. Probabilidade Inicial: P(tag_inicial)
//!
//! A decodificação é feita via Viterbi em log-space.
//!
//! ## Palavras desconhecidas
//!
//! Antes de recorrer à emissão `<UNK>`, a forma da palavra decide a tag quando
//! ela é inequívoca: números → `M`, pontuação → `CH`, inicial maiúscula fora do
//! começo da sentença → `Np`.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::annotator::AnnotatorKind;
use crate::backend::Annotator;
use crate::error::BackendError;
use crate::sentence::Sentence;

const UNK: &str = "<UNK>";

/// Uma sentença de treino: pares (palavra, tag).
pub type TaggedSentence = Vec<(String, String)>;

/// Modelo HMM treinado para etiquetagem morfossintática.
#[derive(Debug, Clone)]
pub struct HmmTagger {
    /// $P(y_i | y_{i-1})$ em log-space. Chave: `(prev_tag, curr_tag)`.
    transition_probs: HashMap<(String, String), f64>,
    /// $P(x_i | y_i)$ em log-space. Chave: `(tag, palavra_minúscula)`.
    emission_probs: HashMap<(String, String), f64>,
    /// $P(y_0)$ em log-space.
    start_probs: HashMap<String, f64>,
    /// Lista ordenada de todas as tags conhecidas.
    all_tags: Vec<String>,
    /// Vocabulário conhecido (minúsculas).
    vocab: HashSet<String>,
    number_shape: Regex,
}

impl HmmTagger {
    /// Treina o HMM com add-1 smoothing.
    pub fn train(corpus: &[TaggedSentence]) -> Self {
        let mut transition_counts: HashMap<(String, String), u32> = HashMap::new();
        let mut emission_counts: HashMap<(String, String), u32> = HashMap::new();
        let mut start_counts: HashMap<String, u32> = HashMap::new();
        let mut tag_counts: HashMap<String, u32> = HashMap::new();
        let mut vocab: HashSet<String> = HashSet::new();

        for sentence in corpus {
            let mut prev_tag: Option<&str> = None;
            for (i, (word, tag)) in sentence.iter().enumerate() {
                let w = word.to_lowercase();
                vocab.insert(w.clone());
                *tag_counts.entry(tag.clone()).or_insert(0) += 1;
                *emission_counts.entry((tag.clone(), w)).or_insert(0) += 1;

                if i == 0 {
                    *start_counts.entry(tag.clone()).or_insert(0) += 1;
                } else if let Some(prev) = prev_tag {
                    *transition_counts
                        .entry((prev.to_string(), tag.clone()))
                        .or_insert(0) += 1;
                }
                prev_tag = Some(tag);
            }
        }

        let mut all_tags: Vec<String> = tag_counts.keys().cloned().collect();
        all_tags.sort(); // Garante ordem determinística

        let vocab_size = vocab.len() as f64;
        let num_tags = all_tags.len() as f64;
        let total_starts = corpus.iter().filter(|s| !s.is_empty()).count() as f64;

        let mut start_probs = HashMap::new();
        let mut transition_probs = HashMap::new();
        let mut emission_probs = HashMap::new();

        for tag in &all_tags {
            let count = *start_counts.get(tag).unwrap_or(&0) as f64;
            start_probs.insert(tag.clone(), ((count + 1.0) / (total_starts + num_tags)).ln());
        }

        for prev in &all_tags {
            let prev_count = *tag_counts.get(prev).unwrap_or(&0) as f64;
            for curr in &all_tags {
                let count = *transition_counts
                    .get(&(prev.clone(), curr.clone()))
                    .unwrap_or(&0) as f64;
                let prob = (count + 1.0) / (prev_count + num_tags);
                transition_probs.insert((prev.clone(), curr.clone()), prob.ln());
            }
        }

        for tag in &all_tags {
            let tag_count = *tag_counts.get(tag).unwrap_or(&0) as f64;
            for word in &vocab {
                let count = *emission_counts
                    .get(&(tag.clone(), word.clone()))
                    .unwrap_or(&0) as f64;
                let prob = (count + 1.0) / (tag_count + vocab_size + 1.0);
                emission_probs.insert((tag.clone(), word.clone()), prob.ln());
            }
            let prob_unk = 1.0 / (tag_count + vocab_size + 1.0);
            emission_probs.insert((tag.clone(), UNK.to_string()), prob_unk.ln());
        }

        Self {
            transition_probs,
            emission_probs,
            start_probs,
            all_tags,
            vocab,
            number_shape: Regex::new(r"^\d+([.,]\d+)*%?$").expect("Invalid regex"),
        }
    }

    /// Parseia um corpus no formato `palavra/TAG palavra/TAG ...` (uma sentença por linha).
    ///
    /// Linhas vazias e iniciadas por `#` são ignoradas.
    pub fn parse_corpus(text: &str) -> Result<Vec<TaggedSentence>, BackendError> {
        let mut corpus = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut sentence = Vec::new();
            for item in line.split_whitespace() {
                let (word, tag) = item
                    .rsplit_once('/')
                    .filter(|(w, t)| !w.is_empty() && !t.is_empty())
                    .ok_or_else(|| {
                        BackendError::new(format!("line {}: malformed item \"{item}\"", n + 1))
                    })?;
                sentence.push((word.to_string(), tag.to_string()));
            }
            corpus.push(sentence);
        }
        Ok(corpus)
    }

    pub fn tags(&self) -> &[String] {
        &self.all_tags
    }

    /// Tag imposta pela forma da palavra, se houver.
    fn shape_tag(&self, word: &str, position: usize) -> Option<&'static str> {
        if self.vocab.contains(&word.to_lowercase()) {
            return None;
        }
        if self.number_shape.is_match(word) {
            Some("M")
        } else if !word.chars().any(char::is_alphanumeric) {
            Some("CH")
        } else if position > 0 && word.chars().next().is_some_and(char::is_uppercase) {
            Some("Np")
        } else {
            None
        }
    }

    fn emission(&self, tag: &str, word: &str, forced: Option<&str>) -> f64 {
        match forced {
            Some(forced) if self.all_tags.iter().any(|t| t == forced) => {
                if tag == forced { 0.0 } else { f64::NEG_INFINITY }
            }
            _ => {
                let lower = word.to_lowercase();
                let key = if self.vocab.contains(&lower) { lower } else { UNK.to_string() };
                self.emission_probs
                    .get(&(tag.to_string(), key))
                    .copied()
                    .unwrap_or(f64::NEG_INFINITY)
            }
        }
    }

    /// Decodifica a melhor sequência de tags (Viterbi, $O(N \cdot T^2)$).
    pub fn predict(&self, words: &[&str]) -> Vec<String> {
        if words.is_empty() || self.all_tags.is_empty() {
            return words
                .iter()
                .enumerate()
                .map(|(i, w)| self.shape_tag(w, i).unwrap_or("X").to_string())
                .collect();
        }

        let n_words = words.len();
        let n_tags = self.all_tags.len();
        let forced: Vec<Option<&'static str>> =
            words.iter().enumerate().map(|(i, w)| self.shape_tag(w, i)).collect();

        let mut viterbi = vec![vec![f64::NEG_INFINITY; n_tags]; n_words];
        let mut backptr = vec![vec![0usize; n_tags]; n_words];

        // 1. Inicialização
        for (s, tag) in self.all_tags.iter().enumerate() {
            let start_p = self.start_probs.get(tag).copied().unwrap_or(f64::NEG_INFINITY);
            viterbi[0][s] = start_p + self.emission(tag, words[0], forced[0]);
        }

        // 2. Recursão
        for t in 1..n_words {
            for (s, curr_tag) in self.all_tags.iter().enumerate() {
                let emit_p = self.emission(curr_tag, words[t], forced[t]);
                let mut best_prob = f64::NEG_INFINITY;
                let mut best_prev = 0;

                for (prev_s, prev_tag) in self.all_tags.iter().enumerate() {
                    let trans_p = self
                        .transition_probs
                        .get(&(prev_tag.clone(), curr_tag.clone()))
                        .copied()
                        .unwrap_or(f64::NEG_INFINITY);
                    let prob = viterbi[t - 1][prev_s] + trans_p + emit_p;
                    if prob > best_prob {
                        best_prob = prob;
                        best_prev = prev_s;
                    }
                }
                viterbi[t][s] = best_prob;
                backptr[t][s] = best_prev;
            }
        }

        // 3. Terminação
        let mut curr_idx = (0..n_tags)
            .max_by(|&a, &b| {
                viterbi[n_words - 1][a]
                    .partial_cmp(&viterbi[n_words - 1][b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);

        // 4. Backtracking
        let mut best_path = vec![String::new(); n_words];
        best_path[n_words - 1] = self.all_tags[curr_idx].clone();
        for t in (1..n_words).rev() {
            curr_idx = backptr[t][curr_idx];
            best_path[t - 1] = self.all_tags[curr_idx].clone();
        }

        // Formas cuja tag não existe no corpus ainda recebem a tag da forma
        for (tag, shape) in best_path.iter_mut().zip(&forced) {
            if let Some(shape) = shape {
                if !self.all_tags.iter().any(|t| t == shape) {
                    *tag = shape.to_string();
                }
            }
        }
        best_path
    }
}

impl Annotator for HmmTagger {
    fn kind(&self) -> AnnotatorKind {
        AnnotatorKind::Tagger
    }

    fn annotate(&self, sentence: &mut Sentence) -> Result<(), BackendError> {
        let tags = self.predict(&sentence.forms());
        for (word, tag) in sentence.words.iter_mut().zip(tags) {
            word.pos_tag = Some(tag);
        }
        Ok(())
    }
}
