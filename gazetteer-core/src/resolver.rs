//! # Resolução de Sobreposições
//!
//! O localizador devolve todos os matches, inclusive sobrepostos. Em
//! "Atlantic City of Georgia", tanto "Atlantic City" `[0,2)` quanto
//! "City of Georgia" `[1,4)` são candidatos, mas compartilham o token "City".
//! O resolvedor escolhe um conjunto de matches disjuntos.
//!
//! ## Algoritmo
//!
//! 1. Ordena os candidatos pelo índice final (ordenação estável).
//! 2. Busca em profundidade com pilha explícita sobre (fronteira, cadeia parcial).
//!    A partir de uma fronteira `b`, seja `m` o menor `end` entre os candidatos
//!    com `start >= b`. Os filhos são os candidatos com `b <= start < m`: pular
//!    um deles deixaria a cadeia estensível pelo candidato que termina em `m`.
//! 3. Uma cadeia sem filhos é **maximal** (nenhum candidato cabe depois dela).
//! 4. Vence a cadeia com mais entidades; empate → maior cobertura de tokens;
//!    empate → a primeira encontrada na busca.
//!
//! Matches disjuntos geram uma única cadeia. O número de cadeias só cresce
//! exponencialmente quando muitos candidatos se sobrepõem em sequência; o
//! pipeline pode limitar a quantidade de candidatos
//! (ver [`MatcherConfig::max_candidates`](crate::config::MatcherConfig::max_candidates)).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::locator::GazetteerMatch;

/// Pontuação de uma cadeia: mais entidades primeiro, depois mais cobertura.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainScore {
    /// Número de entidades na cadeia.
    pub count: usize,
    /// Soma de `end - start` sobre as entidades.
    pub coverage: usize,
}

impl ChainScore {
    pub fn of(chain: &[GazetteerMatch]) -> Self {
        Self {
            count: chain.len(),
            coverage: chain.iter().map(GazetteerMatch::len).sum(),
        }
    }
}

impl Ord for ChainScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then(self.coverage.cmp(&other.coverage))
    }
}

impl PartialOrd for ChainScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Percorre as cadeias maximais em profundidade, chamando `visit` para cada uma.
///
/// Retorna o número de cadeias visitadas.
fn walk_chains<F>(sorted: &[&GazetteerMatch], mut visit: F) -> usize
where
    F: FnMut(&[usize]),
{
    let mut visited = 0;
    // (fronteira, cadeia parcial)
    let mut stack: Vec<(usize, Vec<usize>)> = vec![(0, Vec::new())];

    while let Some((boundary, chain)) = stack.pop() {
        let frontier = sorted
            .iter()
            .filter(|c| c.start >= boundary)
            .map(|c| c.end)
            .min();

        let Some(frontier) = frontier else {
            visited += 1;
            visit(&chain);
            continue;
        };

        // Empilha em ordem reversa para visitar o primeiro filho primeiro
        for (i, c) in sorted.iter().enumerate().rev() {
            if c.start >= boundary && c.start < frontier {
                let mut extended = chain.clone();
                extended.push(i);
                stack.push((c.end, extended));
            }
        }
    }

    visited
}

/// Enumera todas as cadeias maximais de candidatos disjuntos.
///
/// `sorted` deve estar ordenado por `end`. Cada cadeia é uma lista de índices
/// em `sorted`, em ordem crescente. Com a entrada vazia, o resultado é uma única
/// cadeia vazia.
pub fn enumerate_chains(sorted: &[GazetteerMatch]) -> Vec<Vec<usize>> {
    let refs: Vec<&GazetteerMatch> = sorted.iter().collect();
    let mut chains = Vec::new();
    walk_chains(&refs, |chain| chains.push(chain.to_vec()));
    chains
}

/// Seleciona o melhor conjunto de matches mutuamente disjuntos.
///
/// A saída vem ordenada por `end` e cada match mantém seu span e suas tags.
pub fn resolve(candidates: &[GazetteerMatch]) -> Vec<GazetteerMatch> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let mut sorted: Vec<&GazetteerMatch> = candidates.iter().collect();
    sorted.sort_by_key(|c| c.end);

    let mut best: Option<(ChainScore, Vec<usize>)> = None;
    let chains = walk_chains(&sorted, |chain| {
        let score = ChainScore {
            count: chain.len(),
            coverage: chain.iter().map(|&i| sorted[i].len()).sum(),
        };
        // `>` estrito: em empate, fica a primeira cadeia encontrada
        if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
            best = Some((score, chain.to_vec()));
        }
    });

    debug!(
        candidates = candidates.len(),
        chains, "sobreposições resolvidas"
    );

    best.map(|(_, chain)| chain.into_iter().map(|i| sorted[i].clone()).collect())
        .unwrap_or_default()
}
