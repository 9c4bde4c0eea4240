//! # Parser de Dependências (`parse`)
//!
//! Parser determinístico por regras de núcleo (*head-finding*). Cada palavra
//! recebe um núcleo (`head`, 1-based, `0` para a raiz) e um rótulo:
//!
//! | Rótulo  | Relação                                  |
//! |---------|------------------------------------------|
//! | `root`  | primeiro verbo da sentença               |
//! | `sub`   | sujeito: último nominal antes da raiz    |
//! | `dob`   | objeto direto de um verbo                |
//! | `nmod`  | nominal modificando outro nominal        |
//! | `amod`  | adjetivo modificando um nominal          |
//! | `vmod`  | verbo subordinado à raiz                 |
//! | `adv`   | advérbio ou adjetivo predicativo         |
//! | `loc`   | preposição ligada ao verbo               |
//! | `pob`   | objeto de preposição                     |
//! | `det`   | numeral/determinante do nominal seguinte |
//! | `coord` | conjunção                                |
//! | `punct` | pontuação                                |
//! | `dep`   | qualquer outra relação                   |
//!
//! As regras usam as tags do estágio `pos` quando ele rodou; caso contrário a
//! classe é estimada pela forma da palavra.

use crate::annotator::AnnotatorKind;
use crate::backend::Annotator;
use crate::error::BackendError;
use crate::sentence::{Sentence, Word};

/// Classe gramatical grosseira usada pelas regras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Nominal,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Determiner,
    Conjunction,
    Punctuation,
    Other,
}

impl Category {
    fn of(word: &Word, position: usize) -> Self {
        match word.pos_tag.as_deref() {
            Some(tag) => Self::from_tag(tag),
            None => Self::from_shape(word, position),
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "CH" => Category::Punctuation,
            "CC" | "C" => Category::Conjunction,
            "M" | "L" => Category::Determiner,
            t if t.starts_with('N') || t == "P" => Category::Nominal,
            t if t.starts_with('V') => Category::Verb,
            t if t.starts_with('A') => Category::Adjective,
            "R" => Category::Adverb,
            "E" => Category::Preposition,
            _ => Category::Other,
        }
    }

    fn from_shape(word: &Word, position: usize) -> Self {
        if word.is_punctuation() {
            Category::Punctuation
        } else if word.form.chars().all(|c| c.is_numeric() || c == '.' || c == ',') {
            Category::Determiner
        } else if position > 0 && word.is_capitalized() {
            Category::Nominal
        } else {
            Category::Other
        }
    }
}

/// Um arco de dependência: núcleo 1-based (0 = raiz) e rótulo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyArc {
    pub head: usize,
    pub label: &'static str,
}

/// Parser de dependências por regras.
#[derive(Debug, Clone, Default)]
pub struct RuleParser;

impl RuleParser {
    pub fn new() -> Self {
        Self
    }

    /// Calcula um arco por palavra.
    pub fn parse(&self, words: &[Word]) -> Vec<DependencyArc> {
        if words.is_empty() {
            return Vec::new();
        }
        let cats: Vec<Category> = words.iter().enumerate().map(|(i, w)| Category::of(w, i)).collect();

        let root = cats
            .iter()
            .position(|c| *c == Category::Verb)
            .or_else(|| cats.iter().position(|c| *c != Category::Punctuation))
            .unwrap_or(0);

        // Núcleos em 0-based durante o cálculo
        let arc = |head: usize, label: &'static str| DependencyArc { head: head + 1, label };
        let subject = (0..root).rev().find(|&j| cats[j] == Category::Nominal);

        (0..words.len())
            .map(|i| {
                if i == root {
                    return DependencyArc { head: 0, label: "root" };
                }
                let prev = previous_content(&cats, i);
                match cats[i] {
                    Category::Punctuation => arc(root, "punct"),
                    Category::Nominal if i < root => {
                        if Some(i) == subject {
                            arc(root, "sub")
                        } else {
                            let next_nominal = (i + 1..root).find(|&j| cats[j] == Category::Nominal);
                            arc(next_nominal.unwrap_or(root), "nmod")
                        }
                    }
                    Category::Nominal => match prev.map(|j| (j, cats[j])) {
                        Some((j, Category::Preposition)) => arc(j, "pob"),
                        Some((j, Category::Nominal)) if j > root => arc(j, "nmod"),
                        _ => arc(nearest_verb_before(&cats, i).unwrap_or(root), "dob"),
                    },
                    Category::Verb => arc(root, "vmod"),
                    Category::Adjective => match prev.map(|j| (j, cats[j])) {
                        Some((j, Category::Nominal)) => arc(j, "amod"),
                        _ => arc(nearest_verb_before(&cats, i).unwrap_or(root), "adv"),
                    },
                    Category::Adverb => {
                        let verb = (i + 1..words.len()).find(|&j| cats[j] == Category::Verb);
                        arc(verb.unwrap_or(root), "adv")
                    }
                    Category::Preposition => arc(nearest_verb_before(&cats, i).unwrap_or(root), "loc"),
                    Category::Determiner => {
                        let noun = (i + 1..words.len()).find(|&j| cats[j] == Category::Nominal);
                        match noun {
                            Some(j) => arc(j, "det"),
                            None => arc(root, "dep"),
                        }
                    }
                    Category::Conjunction => arc(prev.unwrap_or(root), "coord"),
                    Category::Other => arc(root, "dep"),
                }
            })
            .collect()
    }
}

impl Annotator for RuleParser {
    fn kind(&self) -> AnnotatorKind {
        AnnotatorKind::Parser
    }

    fn annotate(&self, sentence: &mut Sentence) -> Result<(), BackendError> {
        let arcs = self.parse(&sentence.words);
        for (word, arc) in sentence.words.iter_mut().zip(arcs) {
            word.head = Some(arc.head);
            word.dep_label = Some(arc.label.to_string());
        }
        Ok(())
    }
}

/// Palavra anterior que não é pontuação.
fn previous_content(cats: &[Category], i: usize) -> Option<usize> {
    (0..i).rev().find(|&j| cats[j] != Category::Punctuation)
}

fn nearest_verb_before(cats: &[Category], i: usize) -> Option<usize> {
    (0..i).rev().find(|&j| cats[j] == Category::Verb)
}
