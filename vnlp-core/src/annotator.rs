//! # Tipos de Anotador e Conjuntos de Estágios
//!
//! O conjunto de anotadores é **fechado**: quatro estágios conhecidos em tempo de
//! compilação, sempre aplicados nesta ordem fixa:
//!
//! | Código  | Estágio       | Produz                               |
//! |---------|---------------|--------------------------------------|
//! | `wseg`  | Segmentador   | fronteiras de palavra (`sinh_viên`)   |
//! | `pos`   | Tagger        | classe gramatical (`N`, `V`, `Np`)    |
//! | `ner`   | Reconhecedor  | rótulo BIO de entidade (`B-PER`)      |
//! | `parse` | Parser        | arco de dependência (`head`, `dob`)   |
//!
//! Estágios posteriores podem depender dos anteriores (o tagger opera sobre
//! palavras segmentadas), por isso a requisição escolhe apenas o *subconjunto*,
//! nunca a ordem.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::AnnotatorError;

/// Um estágio de anotação do conjunto fixo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotatorKind {
    Segmenter,
    Tagger,
    Recognizer,
    Parser,
}

impl AnnotatorKind {
    /// Todos os estágios, na ordem do pipeline.
    pub const ALL: [AnnotatorKind; 4] = [
        AnnotatorKind::Segmenter,
        AnnotatorKind::Tagger,
        AnnotatorKind::Recognizer,
        AnnotatorKind::Parser,
    ];

    /// Código curto usado na CLI, em `props` e em `/annotators`.
    pub fn code(&self) -> &'static str {
        match self {
            AnnotatorKind::Segmenter => "wseg",
            AnnotatorKind::Tagger => "pos",
            AnnotatorKind::Recognizer => "ner",
            AnnotatorKind::Parser => "parse",
        }
    }

    /// Posição do estágio no pipeline (0..4).
    pub fn index(&self) -> usize {
        match self {
            AnnotatorKind::Segmenter => 0,
            AnnotatorKind::Tagger => 1,
            AnnotatorKind::Recognizer => 2,
            AnnotatorKind::Parser => 3,
        }
    }

    /// Parseia um código exato (sem normalização de caixa).
    pub fn from_code(code: &str) -> Option<Self> {
        AnnotatorKind::ALL.into_iter().find(|kind| kind.code() == code)
    }

    fn bit(&self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for AnnotatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for AnnotatorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Conjunto deduplicado de estágios, iterado sempre na ordem do pipeline.
///
/// Internamente é uma máscara de bits: cópia barata, sem alocação, e a ordem
/// de iteração independe da ordem em que os códigos foram escritos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnnotatorSet {
    bits: u8,
}

impl AnnotatorSet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Todos os estágios (`wseg,pos,ner,parse`).
    pub const fn all() -> Self {
        Self { bits: 0b1111 }
    }

    /// Parseia uma lista separada por vírgulas (`"wseg, pos"`).
    ///
    /// Espaços ao redor de cada código são ignorados; qualquer código fora do
    /// conjunto fixo (inclusive o vazio) falha com `InvalidAnnotator`.
    pub fn parse(list: &str) -> Result<Self, AnnotatorError> {
        let mut set = Self::empty();
        for code in list.trim().split(',').map(str::trim) {
            let kind = AnnotatorKind::from_code(code)
                .ok_or_else(|| AnnotatorError::InvalidAnnotator(code.to_string()))?;
            set.insert(kind);
        }
        Ok(set)
    }

    pub fn insert(&mut self, kind: AnnotatorKind) {
        self.bits |= kind.bit();
    }

    pub fn contains(&self, kind: AnnotatorKind) -> bool {
        self.bits & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// `true` se todo estágio de `self` também está em `other`.
    pub fn is_subset(&self, other: &AnnotatorSet) -> bool {
        self.bits & !other.bits == 0
    }

    /// Itera na ordem fixa do pipeline.
    pub fn iter(&self) -> impl Iterator<Item = AnnotatorKind> + '_ {
        AnnotatorKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }

    /// Códigos na ordem do pipeline (para `/annotators` e logs).
    pub fn codes(&self) -> Vec<&'static str> {
        self.iter().map(|kind| kind.code()).collect()
    }
}

impl FromIterator<AnnotatorKind> for AnnotatorSet {
    fn from_iter<I: IntoIterator<Item = AnnotatorKind>>(iter: I) -> Self {
        let mut set = Self::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Display for AnnotatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.codes().join(","))
    }
}

impl Serialize for AnnotatorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
