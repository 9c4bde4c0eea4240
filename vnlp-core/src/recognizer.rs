//! # Reconhecedor de Entidades (`ner`): Gazetteers e Padrões
//!
//! Rotula cada palavra no esquema **BIO**:
//!
//! - `B-TAG`: Begin, primeiro token de uma entidade
//! - `I-TAG`: Inside, tokens subsequentes da mesma entidade
//! - `O`: Outside, não é parte de nenhuma entidade
//!
//! | Prefixo | Significado         | Exemplos                          |
//! |---------|---------------------|-----------------------------------|
//! | PER     | Pessoa              | Nguyễn Du, Hồ Xuân Hương          |
//! | ORG     | Organização         | Vinamilk, Đại học Quốc gia        |
//! | LOC     | Local/Geográfico    | Hà Nội, sông Hồng, Việt Nam       |
//! | MISC    | Miscelânea          | Tết, Truyện Kiều                  |
//!
//! As regras casam por **sílabas**, então funcionam tanto sobre palavras
//! segmentadas (`Hà_Nội`) quanto sobre sílabas soltas (`Hà`, `Nội`).

use crate::annotator::AnnotatorKind;
use crate::backend::Annotator;
use crate::error::BackendError;
use crate::sentence::{Sentence, Word};

/// Categorias de entidade reconhecidas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Per,
    Org,
    Loc,
    Misc,
}

impl EntityCategory {
    pub fn name(&self) -> &'static str {
        match self {
            EntityCategory::Per => "PER",
            EntityCategory::Org => "ORG",
            EntityCategory::Loc => "LOC",
            EntityCategory::Misc => "MISC",
        }
    }

    /// Tenta parsear a partir de string (ex: "PER" → Some(Per))
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PER" => Some(EntityCategory::Per),
            "ORG" => Some(EntityCategory::Org),
            "LOC" => Some(EntityCategory::Loc),
            "MISC" => Some(EntityCategory::Misc),
            _ => None,
        }
    }
}

/// Tag BIO aplicada a uma palavra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTag {
    Begin(EntityCategory),
    Inside(EntityCategory),
    Outside,
}

impl EntityTag {
    /// Representação textual da tag (ex: "B-PER", "I-ORG", "O")
    pub fn label(&self) -> String {
        match self {
            EntityTag::Begin(cat) => format!("B-{}", cat.name()),
            EntityTag::Inside(cat) => format!("I-{}", cat.name()),
            EntityTag::Outside => "O".to_string(),
        }
    }

    /// Parseia uma tag a partir de string (ex: "B-PER" → Begin(Per))
    pub fn from_label(s: &str) -> Option<Self> {
        if s == "O" {
            return Some(EntityTag::Outside);
        }
        let (prefix, cat) = s.split_once('-')?;
        let cat = EntityCategory::parse(cat)?;
        match prefix {
            "B" => Some(EntityTag::Begin(cat)),
            "I" => Some(EntityTag::Inside(cat)),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Uma entrada de gazetteer: sílabas em minúsculas + categoria.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GazetteerEntry {
    syllables: Vec<String>,
    category: EntityCategory,
}

/// Motor de regras com gazetteers e padrões de contexto.
#[derive(Debug, Clone)]
pub struct Recognizer {
    /// Ordenado do maior para o menor número de sílabas.
    gazetteer: Vec<GazetteerEntry>,
    /// Títulos que precedem nomes de pessoas (em sílabas)
    person_titles: Vec<Vec<String>>,
    /// Palavras que iniciam nomes de organização
    org_indicators: Vec<Vec<String>>,
}

impl Recognizer {
    pub fn new() -> Self {
        Self {
            gazetteer: vec![],
            person_titles: syllable_lists(&[
                "ông", "bà", "anh", "chị", "cô", "chú", "bác", "em", "cụ",
                "giáo sư", "tiến sĩ", "bác sĩ", "thủ tướng", "chủ tịch", "tổng thống",
                "bộ trưởng", "nhà thơ", "nhà văn", "ca sĩ", "cầu thủ",
            ]),
            org_indicators: syllable_lists(&[
                "công ty", "tập đoàn", "ngân hàng", "trường", "đại học", "bộ", "viện",
                "bệnh viện", "ủy ban", "tổng công ty", "hội", "câu lạc bộ",
            ]),
        }
    }

    /// Adiciona uma entrada; nomes podem usar espaço ou `_` entre sílabas.
    pub fn add(&mut self, name: &str, category: EntityCategory) {
        let syllables = syllables_of(name);
        if !syllables.is_empty() {
            let pos = self
                .gazetteer
                .partition_point(|e| e.syllables.len() >= syllables.len());
            self.gazetteer.insert(pos, GazetteerEntry { syllables, category });
        }
    }

    /// Parseia um gazetteer TSV (`nome<TAB>CATEGORIA`).
    pub fn parse_gazetteer(&mut self, text: &str) -> Result<usize, BackendError> {
        let mut count = 0;
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, category) = line
                .rsplit_once('\t')
                .and_then(|(name, cat)| Some((name, EntityCategory::parse(cat)?)))
                .ok_or_else(|| {
                    BackendError::new(format!("line {}: expected \"name<TAB>PER|LOC|ORG|MISC\"", n + 1))
                })?;
            self.add(name, category);
            count += 1;
        }
        Ok(count)
    }

    /// Aplica as regras e retorna uma tag por palavra.
    pub fn recognize(&self, words: &[Word]) -> Vec<EntityTag> {
        let syllables: Vec<Vec<String>> = words.iter().map(|w| syllables_of(&w.form)).collect();
        let mut result: Vec<Option<EntityTag>> = vec![None; words.len()];

        // 1. Gazetteers (n-gramas, o maior primeiro)
        let mut i = 0;
        while i < words.len() {
            let matched = self
                .gazetteer
                .iter()
                .find_map(|entry| match_words(&syllables, i, &entry.syllables).map(|n| (n, entry.category)));
            match matched {
                Some((n, cat)) => {
                    mark(&mut result, i, n, cat);
                    i += n;
                }
                None => i += 1,
            }
        }

        // 2. Regra de título: "ông Nguyễn Văn A" → PER
        for i in 0..words.len() {
            let Some(n) = self.person_titles.iter().find_map(|t| match_words(&syllables, i, t)) else {
                continue;
            };
            let run = capitalized_run(words, &result, i + n);
            if run > 0 {
                mark(&mut result, i + n, run, EntityCategory::Per);
            }
        }

        // 3. Indicadores de organização: "Công ty Vinamilk" → ORG
        for i in 0..words.len() {
            if result[i].is_some() {
                continue;
            }
            let Some(n) = self.org_indicators.iter().find_map(|t| match_words(&syllables, i, t)) else {
                continue;
            };
            let run = capitalized_run(words, &result, i + n);
            if run == 0 {
                continue;
            }
            // Indicador capitalizado faz parte do nome
            if words[i].is_capitalized() {
                mark(&mut result, i, n + run, EntityCategory::Org);
            } else {
                mark(&mut result, i + n, run, EntityCategory::Org);
            }
        }

        result
            .into_iter()
            .map(|tag| tag.unwrap_or(EntityTag::Outside))
            .collect()
    }
}

impl Default for Recognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator for Recognizer {
    fn kind(&self) -> AnnotatorKind {
        AnnotatorKind::Recognizer
    }

    fn annotate(&self, sentence: &mut Sentence) -> Result<(), BackendError> {
        let tags = self.recognize(&sentence.words);
        for (word, tag) in sentence.words.iter_mut().zip(tags) {
            word.ner_label = Some(tag.label());
        }
        Ok(())
    }
}

fn syllables_of(form: &str) -> Vec<String> {
    form.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn syllable_lists(items: &[&str]) -> Vec<Vec<String>> {
    items.iter().map(|s| syllables_of(s)).collect()
}

/// Quantas palavras a partir de `start` cobrem exatamente `target` (por sílabas).
fn match_words(words: &[Vec<String>], start: usize, target: &[String]) -> Option<usize> {
    let mut consumed = 0;
    for (n, word) in words.iter().enumerate().skip(start) {
        if word.is_empty() || consumed + word.len() > target.len() {
            return None;
        }
        if target[consumed..consumed + word.len()] != word[..] {
            return None;
        }
        consumed += word.len();
        if consumed == target.len() {
            return Some(n - start + 1);
        }
    }
    None
}

/// Palavras capitalizadas e ainda sem rótulo a partir de `start`.
fn capitalized_run(words: &[Word], result: &[Option<EntityTag>], start: usize) -> usize {
    words
        .iter()
        .zip(result)
        .skip(start)
        .take_while(|(w, tag)| tag.is_none() && w.is_capitalized() && !w.is_punctuation())
        .count()
}

fn mark(result: &mut [Option<EntityTag>], start: usize, len: usize, cat: EntityCategory) {
    for (offset, slot) in result.iter_mut().skip(start).take(len).enumerate() {
        *slot = Some(if offset == 0 {
            EntityTag::Begin(cat)
        } else {
            EntityTag::Inside(cat)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn labels(recognizer: &Recognizer, text: &str) -> Vec<String> {
        let sentence = Sentence::from_tokens(&tokenize(text));
        recognizer
            .recognize(&sentence.words)
            .iter()
            .map(EntityTag::label)
            .collect()
    }

    #[test]
    fn test_tag_labels() {
        assert_eq!(EntityTag::Outside.label(), "O");
        assert_eq!(EntityTag::Begin(EntityCategory::Per).label(), "B-PER");
        assert_eq!(EntityTag::from_label("I-LOC"), Some(EntityTag::Inside(EntityCategory::Loc)));
        assert_eq!(EntityTag::from_label("X-LOC"), None);
    }

    #[test]
    fn test_gazetteer_matches_syllables() {
        let mut recognizer = Recognizer::new();
        recognizer.add("Hà_Nội", EntityCategory::Loc);
        assert_eq!(labels(&recognizer, "Tôi yêu Hà Nội"), vec!["O", "O", "B-LOC", "I-LOC"]);
    }

    #[test]
    fn test_gazetteer_matches_segmented_words() {
        let mut recognizer = Recognizer::new();
        recognizer.add("Hà Nội", EntityCategory::Loc);
        let mut sentence = Sentence::from_tokens(&tokenize("yêu Hà Nội"));
        sentence.words = crate::segmenter::Segmenter::new(["yêu"], 4).segment(&sentence.words);
        let tags = recognizer.recognize(&sentence.words);
        assert_eq!(tags, vec![EntityTag::Outside, EntityTag::Begin(EntityCategory::Loc)]);
    }

    #[test]
    fn test_title_pattern() {
        let recognizer = Recognizer::new();
        assert_eq!(
            labels(&recognizer, "ông Nguyễn Văn Nam đến"),
            vec!["O", "B-PER", "I-PER", "I-PER", "O"]
        );
    }

    #[test]
    fn test_org_indicator() {
        let recognizer = Recognizer::new();
        assert_eq!(
            labels(&recognizer, "Công ty Vinamilk lãi lớn"),
            vec!["B-ORG", "I-ORG", "I-ORG", "O", "O"]
        );
        assert_eq!(
            labels(&recognizer, "làm ở công ty Vinamilk"),
            vec!["O", "O", "O", "O", "B-ORG"]
        );
    }

    #[test]
    fn test_parse_gazetteer() {
        let mut recognizer = Recognizer::new();
        let n = recognizer
            .parse_gazetteer("# nomes\nViệt Nam\tLOC\nNguyễn Du\tPER\n")
            .unwrap();
        assert_eq!(n, 2);
        assert!(recognizer.parse_gazetteer("Việt Nam LOC").is_err());
    }
}
