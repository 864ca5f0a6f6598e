//! # Localizador de Spans — de offsets de caractere para índices de token
//!
//! O autômato trabalha sobre texto, mas o resto do pipeline pensa em tokens.
//! O localizador faz a ponte:
//!
//! 1. Reconstrói o texto juntando os tokens com um espaço.
//! 2. Ao mesmo tempo, registra onde cada token começa e termina ([`OffsetMap`]).
//! 3. Roda o índice sobre o texto reconstruído.
//! 4. Converte cada ocorrência para um span de tokens `[start, end)`.
//!
//! ## Alinhamento com tokens
//!
//! A busca por substring encontra ocorrências que não respeitam os limites dos
//! tokens. Com a frase "ate" e os tokens `["plate"]`, o autômato acha "ate" dentro
//! de "plate". Uma ocorrência só vira candidata se o seu início coincide com o
//! início de algum token **e** o seu fim coincide com o fim de algum token; as
//! demais são descartadas silenciosamente.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bilou::LabeledSpan;
use crate::error::Result;
use crate::index::PatternIndex;

/// Separador usado na reconstrução do texto.
pub const TOKEN_SEPARATOR: char = ' ';

/// Uma frase do gazetteer encontrada na sequência de tokens.
///
/// # Exemplo
/// Em `["Atlantic", "City", "of", "Georgia"]`, a frase "city of georgia":
/// `GazetteerMatch { text: "city of georgia", start: 1, end: 4, tags: {"LOC"} }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazetteerMatch {
    /// Frase do gazetteer (normalizada).
    pub text: String,
    /// Índice do token inicial (inclusivo)
    pub start: usize,
    /// Índice do token final (exclusivo)
    pub end: usize,
    /// Tags associadas à frase
    pub tags: BTreeSet<String>,
}

impl GazetteerMatch {
    /// Número de tokens cobertos.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Verifica se dois matches compartilham algum token.
    pub fn overlaps(&self, other: &GazetteerMatch) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Span com uma única label: a primeira tag em ordem alfabética.
    ///
    /// Retorna `None` se o match não tem tags.
    pub fn labeled(&self) -> Option<LabeledSpan> {
        self.tags.iter().next().map(|tag| LabeledSpan {
            start: self.start,
            end: self.end,
            label: tag.clone(),
        })
    }

    /// Span cuja label junta todas as tags (ex: "LOC|ORG").
    pub fn joined_label(&self, separator: &str) -> LabeledSpan {
        LabeledSpan {
            start: self.start,
            end: self.end,
            label: self
                .tags
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(separator),
        }
    }
}

/// Texto reconstruído e as tabelas offset → token.
///
/// Para o token `i` começando no byte `p` com comprimento `L`:
/// `starts[p] = i` e `ends[p + L] = i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    pub text: String,
    pub starts: HashMap<usize, usize>,
    pub ends: HashMap<usize, usize>,
}

impl OffsetMap {
    /// Constrói o texto reconstruído e as duas tabelas em uma única passada.
    ///
    /// Com `lowercase`, cada token é convertido para minúsculas **antes** de
    /// calcular offsets; assim as tabelas ficam consistentes mesmo quando a
    /// conversão muda o número de bytes de um caractere.
    pub fn build<S: AsRef<str>>(tokens: &[S], lowercase: bool) -> Self {
        let mut map = OffsetMap::default();

        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                map.text.push(TOKEN_SEPARATOR);
            }
            map.starts.insert(map.text.len(), i);
            if lowercase {
                map.text.push_str(&token.as_ref().to_lowercase());
            } else {
                map.text.push_str(token.as_ref());
            }
            map.ends.insert(map.text.len(), i);
        }

        map
    }

    /// Converte um span de bytes `[start, end)` em um span de tokens `[start, end)`.
    ///
    /// Retorna `None` se o span não está alinhado com limites de token.
    pub fn token_span(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let first = *self.starts.get(&start)?;
        let last = *self.ends.get(&end)?;
        Some((first, last + 1))
    }
}

/// Encontra todas as frases do índice alinhadas com os tokens.
///
/// A saída segue a ordem do índice (offset final crescente) e pode conter
/// matches sobrepostos.
pub fn locate<S: AsRef<str>>(index: &PatternIndex, tokens: &[S]) -> Result<Vec<GazetteerMatch>> {
    let map = OffsetMap::build(tokens, index.config().case_insensitive);
    let hits = index.lookup_all(&map.text)?;
    let total_hits = hits.len();

    let matches: Vec<GazetteerMatch> = hits
        .into_iter()
        .filter_map(|hit| {
            let (start, end) = map.token_span(hit.start(), hit.end)?;
            Some(GazetteerMatch {
                text: hit.entry.phrase.clone(),
                start,
                end,
                tags: hit.entry.tags.clone(),
            })
        })
        .collect();

    debug!(
        tokens = tokens.len(),
        hits = total_hits,
        candidates = matches.len(),
        "ocorrências localizadas"
    );
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatcherConfig;
    use crate::index::{build_index, build_index_with_config};

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_offset_map() {
        let map = OffsetMap::build(&["Lula", "visitou", "Recife"], false);
        assert_eq!(map.text, "Lula visitou Recife");
        assert_eq!(map.starts.get(&0), Some(&0));
        assert_eq!(map.starts.get(&5), Some(&1));
        assert_eq!(map.starts.get(&13), Some(&2));
        assert_eq!(map.ends.get(&4), Some(&0));
        assert_eq!(map.ends.get(&12), Some(&1));
        assert_eq!(map.ends.get(&19), Some(&2));
        assert_eq!(map.token_span(5, 19), Some((1, 3)));
        assert_eq!(map.token_span(6, 19), None);
    }

    #[test]
    fn test_offset_map_lowercases_per_token() {
        let map = OffsetMap::build(&["SÃO", "Paulo"], true);
        assert_eq!(map.text, "são paulo");
        assert_eq!(map.ends.get(&4), Some(&0));
        assert_eq!(map.starts.get(&5), Some(&1));
    }

    #[test]
    fn test_locate_atlantic_city() {
        let index = build_index([("atlantic city", "LOC"), ("city of georgia", "LOC")]).unwrap();
        let tokens = ["Atlantic", "City", "of", "Georgia"];
        let matches = locate(&index, &tokens).unwrap();

        assert_eq!(
            matches,
            vec![
                GazetteerMatch {
                    text: "atlantic city".to_string(),
                    start: 0,
                    end: 2,
                    tags: tags(&["LOC"]),
                },
                GazetteerMatch {
                    text: "city of georgia".to_string(),
                    start: 1,
                    end: 4,
                    tags: tags(&["LOC"]),
                },
            ]
        );
    }

    #[test]
    fn test_substring_inside_token_is_discarded() {
        let index = build_index([("ate", "MISC"), ("late", "MISC")]).unwrap();
        let matches = locate(&index, &["a", "plate", "of", "food"]).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_partial_token_span_is_discarded() {
        // "new yor" começa alinhado mas termina no meio de "york"
        let index = build_index([("new yor", "LOC"), ("york", "LOC")]).unwrap();
        let matches = locate(&index, &["New", "York"]).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "york");
        assert_eq!((matches[0].start, matches[0].end), (1, 2));
    }

    #[test]
    fn test_nested_matches_are_all_reported() {
        let index = build_index([("korea", "LOC"), ("south korea", "LOC")]).unwrap();
        let matches = locate(&index, &["South", "Korea"]).unwrap();
        let spans: Vec<(usize, usize)> = matches.iter().map(|m| (m.start, m.end)).collect();
        assert_eq!(spans.len(), 2);
        assert!(spans.contains(&(0, 2)));
        assert!(spans.contains(&(1, 2)));
    }

    #[test]
    fn test_empty_inputs() {
        let empty = build_index(Vec::<(&str, &str)>::new()).unwrap();
        assert!(locate(&empty, &["Jinho", "is", "here"]).unwrap().is_empty());

        let index = build_index([("brasil", "LOC")]).unwrap();
        let no_tokens: [&str; 0] = [];
        assert!(locate(&index, &no_tokens).unwrap().is_empty());
    }

    #[test]
    fn test_case_sensitive_locate() {
        let config = MatcherConfig {
            case_insensitive: false,
            ..MatcherConfig::default()
        };
        let index = build_index_with_config([("Rio", "LOC")], config).unwrap();

        let found = locate(&index, &["Rio"]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].start, found[0].end), (0, 1));
        assert_eq!(found[0].text, "Rio");

        assert!(locate(&index, &["rio"]).unwrap().is_empty());
        assert!(locate(&index, &["RIO"]).unwrap().is_empty());
    }

    #[test]
    fn test_unfinalized_index_is_error() {
        let index = PatternIndex::new();
        assert!(locate(&index, &["x"]).is_err());
    }

    #[test]
    fn test_labels() {
        let m = GazetteerMatch {
            text: "flamengo".to_string(),
            start: 2,
            end: 3,
            tags: tags(&["ORG", "LOC"]),
        };
        assert_eq!(m.labeled().unwrap().label, "LOC");
        assert_eq!(m.joined_label("|").label, "LOC|ORG");
        assert_eq!(m.len(), 1);
    }
}
