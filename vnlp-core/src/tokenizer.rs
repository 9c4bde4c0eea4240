//! # Tokenizador e Divisor de Sentenças
//!
//! Divide o texto bruto em tokens (sílabas, números, pontuações) preservando o
//! offset original de cada um, e agrupa os tokens em sentenças.
//!
//! A segmentação de base segue as fronteiras de palavra Unicode (UAX #29) via
//! `unicode-segmentation`, o que mantém juntos:
//! - sílabas com marcas combinantes (`"vie\u{0302}n"`)
//! - números com separadores (`1.000`, `3,5`)
//! - siglas com ponto interno (`TP.HCM`)
//!
//! O texto de cada token sai em NFC (`unicode-normalization`), a forma usada
//! pelos vocabulários; entrada decomposta (NFD) vira `"viên"`. Os offsets
//! continuam apontando para os bytes do texto original.
//!
//! Em cima disso, abreviações conhecidas (`GS.`, `TP.`) absorvem o ponto final
//! para que ele não seja tratado como fim de sentença.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use vnlp_core::tokenizer::{split_sentences, tokenize};
//!
//! let tokens = tokenize("Tôi là sinh viên. Bạn thì sao?");
//! let sentences = split_sentences(tokens);
//! assert_eq!(sentences.len(), 2);
//! ```

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Um token extraído do texto original.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// O texto do token em NFC (ex: "Tôi", ",", "1.000").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token no texto inteiro (0, 1, 2...).
    pub index: usize,
}

impl Token {
    /// `true` se o token não contém nenhum caractere alfanumérico.
    pub fn is_punctuation(&self) -> bool {
        !self.text.chars().any(char::is_alphanumeric)
    }

    /// `true` se o primeiro caractere é maiúsculo.
    pub fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }
}

/// Abreviações comuns que absorvem o ponto seguinte
const ABBREVIATIONS: &[&str] = &[
    "TP", "Tp", "GS", "PGS", "TS", "ThS", "BS", "KS", "Q", "P", "TT", "NXB",
    "St", "Dr", "Mr", "Mrs", "Ms", "Prof", "v.v", "etc",
];

/// Tokens que encerram uma sentença
const SENTENCE_TERMINATORS: &[&str] = &[".", "!", "?", "…", "...", "?!", "!?"];

/// Fechamentos que continuam pertencendo à sentença que acabou de terminar
const CLOSERS: &[&str] = &["\"", "”", "’", "'", ")", "]", "»"];

/// Tokeniza um texto em sílabas, números e pontuações.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for (start, segment) in text.split_word_bound_indices() {
        if segment.chars().all(char::is_whitespace) {
            continue;
        }

        // "GS" + "." → "GS."
        if segment == "." {
            if let Some(prev) = tokens.last_mut() {
                if prev.end == start && ABBREVIATIONS.contains(&prev.text.as_str()) {
                    prev.text.push('.');
                    prev.end = start + 1;
                    continue;
                }
            }
        }

        // Reticências chegam como três segmentos "." adjacentes
        if segment == "." {
            if let Some(prev) = tokens.last_mut() {
                if prev.end == start && prev.text.chars().all(|c| c == '.') && prev.text.len() < 3 {
                    prev.text.push('.');
                    prev.end = start + 1;
                    continue;
                }
            }
        }

        tokens.push(Token {
            text: segment.nfc().collect(),
            start,
            end: start + segment.len(),
            index: 0,
        });
    }

    // Re-indexa os tokens
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Agrupa uma sequência de tokens em sentenças, preservando a ordem.
///
/// A fronteira fica logo após um terminador (`.`, `!`, `?`, `…`), incluindo
/// aspas ou parênteses de fechamento imediatamente seguintes.
pub fn split_sentences(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut sentences = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut closing = false;

    for token in tokens {
        if closing && !CLOSERS.contains(&token.text.as_str()) {
            sentences.push(std::mem::take(&mut current));
            closing = false;
        }
        if SENTENCE_TERMINATORS.contains(&token.text.as_str()) {
            closing = true;
        }
        current.push(token);
    }

    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("Tôi là sinh viên.");
        assert_eq!(texts(&tokens), vec!["Tôi", "là", "sinh", "viên", "."]);
        assert_eq!(tokens[4].index, 4);
    }

    #[test]
    fn test_offsets_point_into_text() {
        let text = "Ông Nguyễn  đến Hà Nội.";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_decomposed_input_is_composed() {
        let text = "sinh vie\u{0302}n";
        let tokens = tokenize(text);
        assert_eq!(texts(&tokens), vec!["sinh", "viên"]);
        assert_eq!(tokens[1].start, 5);
        assert_eq!(tokens[1].end, text.len());
    }

    #[test]
    fn test_numbers_and_abbreviations() {
        let tokens = tokenize("GS. Lâm có 1.000 đồng và 3,5 kg.");
        let t = texts(&tokens);
        assert!(t.contains(&"GS."));
        assert!(t.contains(&"1.000"));
        assert!(t.contains(&"3,5"));
        assert_eq!(t.last(), Some(&"."));
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("").is_empty());
        assert!(split_sentences(tokenize("   \n")).is_empty());
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences(tokenize("Tôi là sinh viên. Bạn thì sao? Còn anh"));
        assert_eq!(sentences.len(), 3);
        assert_eq!(texts(&sentences[1]), vec!["Bạn", "thì", "sao", "?"]);
        assert_eq!(texts(&sentences[2]), vec!["Còn", "anh"]);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let sentences = split_sentences(tokenize("Anh ấy nói: \"Xin chào.\" Rồi đi."));
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].last().unwrap().text, "\"");
    }

    #[test]
    fn test_abbreviation_does_not_split() {
        let sentences = split_sentences(tokenize("GS. Lâm đến TP. Huế."));
        assert_eq!(sentences.len(), 1);
    }
}
