//! # Índice de Padrões — Gazetteers compilados em um autômato Aho-Corasick
//!
//! Um gazetteer é uma lista de frases conhecidas associadas a uma categoria
//! (ex: nomes de países → `LOC`). O índice junta todas as frases de todos os
//! gazetteers em uma única estrutura de busca multi-padrão.
//!
//! ## Ciclo de vida
//!
//! O índice tem duas fases, modeladas explicitamente:
//!
//! 1. **Construção** (`Building`): `insert` pode ser chamado quantas vezes for
//!    preciso. A mesma frase inserida com tags diferentes acumula as tags em um conjunto.
//! 2. **Finalizado** (`Finalized`): `finalize` compila o autômato. A partir daí
//!    só buscas são válidas; novas inserções retornam [`Error::AlreadyFinalized`].
//!
//! Depois de finalizado o índice é somente leitura e pode ser compartilhado entre
//! threads (`&PatternIndex` é `Send + Sync`).
//!
//! ## Exemplo
//!
//! ```rust
//! use gazetteer_core::index::PatternIndex;
//!
//! let mut index = PatternIndex::new();
//! index.insert("São Paulo", "LOC").unwrap();
//! index.insert("São Paulo", "ORG").unwrap();
//! index.finalize().unwrap();
//!
//! let hits = index.lookup_all("o são paulo venceu").unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].end, 12);
//! assert_eq!(hits[0].entry.tags.len(), 2);
//! ```

use std::collections::{BTreeSet, HashMap};

use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::MatcherConfig;
use crate::error::{Error, Result};

/// Uma frase do gazetteer e o conjunto de tags associadas a ela.
///
/// `BTreeSet` mantém as tags em ordem, o que torna a saída determinística.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseEntry {
    /// Frase já normalizada (ex: "atlantic city").
    pub phrase: String,
    /// União de todas as tags inseridas para esta frase.
    pub tags: BTreeSet<String>,
}

/// Uma ocorrência de frase encontrada pelo autômato.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseHit<'a> {
    /// Offset (em bytes) imediatamente após o fim da ocorrência.
    pub end: usize,
    pub entry: &'a PhraseEntry,
}

impl PhraseHit<'_> {
    /// Offset (em bytes) do início da ocorrência.
    pub fn start(&self) -> usize {
        self.end - self.entry.phrase.len()
    }
}

#[derive(Debug, Clone)]
enum IndexState {
    Building,
    Finalized(AhoCorasick),
}

/// Índice multi-padrão sobre as frases de todos os gazetteers.
#[derive(Debug, Clone)]
pub struct PatternIndex {
    entries: Vec<PhraseEntry>,
    /// Frase normalizada → posição em `entries` (também o id do padrão no autômato).
    positions: HashMap<String, usize>,
    config: MatcherConfig,
    state: IndexState,
}

impl PatternIndex {
    pub fn new() -> Self {
        Self::with_config(MatcherConfig::default())
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            config,
            state: IndexState::Building,
        }
    }

    /// Adiciona `tag` ao conjunto de tags de `phrase`, criando a entrada se necessário.
    ///
    /// A frase é aparada (`trim`) e, se `case_insensitive`, convertida para minúsculas.
    pub fn insert(&mut self, phrase: &str, tag: impl Into<String>) -> Result<()> {
        if self.is_finalized() {
            return Err(Error::AlreadyFinalized);
        }
        let phrase = self.config.normalize(phrase.trim());
        if phrase.is_empty() {
            return Err(Error::EmptyPhrase);
        }

        match self.positions.get(&phrase) {
            Some(&pos) => {
                self.entries[pos].tags.insert(tag.into());
            }
            None => {
                self.positions.insert(phrase.clone(), self.entries.len());
                self.entries.push(PhraseEntry {
                    phrase,
                    tags: BTreeSet::from([tag.into()]),
                });
            }
        }
        Ok(())
    }

    /// Compila o autômato. Só pode ser chamado uma vez.
    pub fn finalize(&mut self) -> Result<()> {
        if self.is_finalized() {
            return Err(Error::AlreadyFinalized);
        }
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(self.entries.iter().map(|e| e.phrase.as_str()))?;

        info!(
            phrases = self.entries.len(),
            tags = self.tags().len(),
            "índice de gazetteers finalizado"
        );
        self.state = IndexState::Finalized(automaton);
        Ok(())
    }

    /// Encontra **todas** as ocorrências de frases do índice em `text`.
    ///
    /// Inclui ocorrências sobrepostas e aninhadas: em "south korea" com as frases
    /// "korea" e "south korea", ambas são reportadas. As ocorrências saem em ordem
    /// crescente de offset final. A resolução de sobreposições fica para o
    /// [`resolver`](crate::resolver).
    ///
    /// `text` deve estar normalizado da mesma forma que as frases
    /// (ver [`MatcherConfig::case_insensitive`]).
    pub fn lookup_all<'a>(&'a self, text: &str) -> Result<Vec<PhraseHit<'a>>> {
        let automaton = match &self.state {
            IndexState::Finalized(automaton) => automaton,
            IndexState::Building => return Err(Error::NotFinalized),
        };

        Ok(automaton
            .find_overlapping_iter(text)
            .map(|m| PhraseHit {
                end: m.end(),
                entry: &self.entries[m.pattern().as_usize()],
            })
            .collect())
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, IndexState::Finalized(_))
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Número de frases distintas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Busca exata de uma frase (normalizada conforme a configuração).
    pub fn get(&self, phrase: &str) -> Option<&PhraseEntry> {
        let phrase = self.config.normalize(phrase.trim());
        self.positions.get(&phrase).map(|&pos| &self.entries[pos])
    }

    /// Todas as tags distintas presentes no índice, em ordem.
    pub fn tags(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.tags.iter().map(String::as_str))
            .collect()
    }
}

impl Default for PatternIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Constrói e finaliza um índice a partir de pares (frase, tag).
pub fn build_index<I, P, T>(pairs: I) -> Result<PatternIndex>
where
    I: IntoIterator<Item = (P, T)>,
    P: AsRef<str>,
    T: Into<String>,
{
    build_index_with_config(pairs, MatcherConfig::default())
}

pub fn build_index_with_config<I, P, T>(pairs: I, config: MatcherConfig) -> Result<PatternIndex>
where
    I: IntoIterator<Item = (P, T)>,
    P: AsRef<str>,
    T: Into<String>,
{
    let mut index = PatternIndex::with_config(config);
    for (phrase, tag) in pairs {
        index.insert(phrase.as_ref(), tag)?;
    }
    index.finalize()?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_merges_tags() {
        let mut index = PatternIndex::new();
        index.insert("Flamengo", "ORG").unwrap();
        index.insert("flamengo", "LOC").unwrap();
        index.insert("Flamengo", "ORG").unwrap();

        assert_eq!(index.len(), 1);
        let entry = index.get("FLAMENGO").unwrap();
        assert_eq!(entry.phrase, "flamengo");
        assert_eq!(
            entry.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["LOC", "ORG"]
        );
    }

    #[test]
    fn test_case_sensitive_keeps_distinct_phrases() {
        let config = MatcherConfig {
            case_insensitive: false,
            ..MatcherConfig::default()
        };
        let mut index = PatternIndex::with_config(config);
        index.insert("Rio", "LOC").unwrap();
        index.insert("rio", "MISC").unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_empty_phrase_rejected() {
        let mut index = PatternIndex::new();
        assert!(matches!(index.insert("   ", "LOC"), Err(Error::EmptyPhrase)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_lookup_before_finalize_fails() {
        let mut index = PatternIndex::new();
        index.insert("brasil", "LOC").unwrap();
        assert!(matches!(index.lookup_all("brasil"), Err(Error::NotFinalized)));
    }

    #[test]
    fn test_finalize_twice_fails() {
        let mut index = PatternIndex::new();
        index.finalize().unwrap();
        assert!(matches!(index.finalize(), Err(Error::AlreadyFinalized)));
    }

    #[test]
    fn test_insert_after_finalize_fails() {
        let mut index = PatternIndex::new();
        index.finalize().unwrap();
        assert!(matches!(
            index.insert("brasil", "LOC"),
            Err(Error::AlreadyFinalized)
        ));
    }

    #[test]
    fn test_lookup_reports_overlapping_and_nested() {
        let index = build_index([
            ("south korea", "LOC"),
            ("korea", "LOC"),
            ("korea united", "MISC"),
            ("united states", "LOC"),
        ])
        .unwrap();

        let hits = index.lookup_all("south korea united states").unwrap();
        let found: Vec<(&str, usize)> = hits
            .iter()
            .map(|h| (h.entry.phrase.as_str(), h.end))
            .collect();

        assert_eq!(found.len(), 4);
        assert!(found.contains(&("south korea", 11)));
        assert!(found.contains(&("korea", 11)));
        assert!(found.contains(&("korea united", 18)));
        assert!(found.contains(&("united states", 25)));

        let ends: Vec<usize> = hits.iter().map(|h| h.end).collect();
        let mut sorted = ends.clone();
        sorted.sort();
        assert_eq!(ends, sorted);
    }

    #[test]
    fn test_hit_start_offset() {
        let index = build_index([("city of georgia", "LOC")]).unwrap();
        let hits = index.lookup_all("atlantic city of georgia").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start(), 9);
        assert_eq!(hits[0].end, 24);
    }

    #[test]
    fn test_empty_index_finds_nothing() {
        let index = build_index(Vec::<(&str, &str)>::new()).unwrap();
        assert!(index.lookup_all("qualquer texto").unwrap().is_empty());
        assert!(index.tags().is_empty());
    }
}
