//! # Pipeline de Gazetteers — Orquestrador com Eventos Observáveis
//!
//! Conecta os estágios para uma sequência de tokens:
//!
//! 1. [`locate`]: todas as frases do índice alinhadas com os tokens.
//! 2. [`resolve`]: melhor conjunto de matches disjuntos.
//! 3. [`encode`]: uma tag BILOU por token.
//!
//! Cada estágio pode emitir um [`PipelineEvent`] por um canal `mpsc`, permitindo
//! que o servidor WebSocket transmita o progresso para o cliente.

use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bilou::{encode, LabeledSpan};
use crate::config::MatcherConfig;
use crate::error::{Error, Result};
use crate::index::PatternIndex;
use crate::loader::read_gazetteers;
use crate::locator::{locate, GazetteerMatch};
use crate::resolver::{resolve, ChainScore};

/// Eventos emitidos pelo pipeline durante o processamento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: Ocorrências alinhadas com tokens, ainda com sobreposições.
    CandidatesLocated {
        candidates: Vec<GazetteerMatch>,
        total: usize,
    },
    /// **Passo 2**: Sobreposições resolvidas.
    EntitiesResolved {
        entities: Vec<GazetteerMatch>,
        score: ChainScore,
    },
    /// **Passo 3**: Tag BILOU atribuída a um token.
    TagAssigned {
        token_index: usize,
        token_text: String,
        tag: String,
    },
    /// **Conclusão**: resultado final e tempo total.
    Done { result: AnalysisResult },
    /// **Falha**: erro irrecuperável (ex: limite de candidatos excedido).
    Error { message: String },
}

/// Resultado da análise de uma sentença.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tokens: Vec<String>,
    /// Todos os matches encontrados, antes da resolução.
    pub candidates: Vec<GazetteerMatch>,
    /// Matches disjuntos escolhidos, ordenados por `end`.
    pub entities: Vec<GazetteerMatch>,
    /// Uma tag BILOU por token.
    pub tags: Vec<String>,
    pub processing_ms: u64,
}

/// O pipeline principal: um índice finalizado e nada mais.
///
/// Só usa `&self` depois de construído, então pode ser compartilhado entre
/// threads (`Arc<GazetteerPipeline>`).
#[derive(Debug, Clone)]
pub struct GazetteerPipeline {
    index: PatternIndex,
}

impl GazetteerPipeline {
    /// Cria o pipeline a partir de um índice já finalizado.
    pub fn new(index: PatternIndex) -> Result<Self> {
        if !index.is_finalized() {
            return Err(Error::NotFinalized);
        }
        Ok(Self { index })
    }

    /// Carrega os gazetteers de um diretório (ver [`loader`](crate::loader)).
    pub fn from_dir(dir: impl AsRef<Path>, config: MatcherConfig) -> Result<Self> {
        Self::new(read_gazetteers(dir, config)?)
    }

    pub fn index(&self) -> &PatternIndex {
        &self.index
    }

    /// Processa uma sentença de forma síncrona.
    pub fn analyze<S: AsRef<str>>(&self, tokens: &[S]) -> Result<AnalysisResult> {
        self.run(tokens, &mut |_| {})
    }

    /// Processa várias sentenças em paralelo (rayon) sobre o mesmo índice.
    ///
    /// A ordem da saída é a ordem da entrada. O primeiro erro interrompe o lote.
    pub fn analyze_batch<S>(&self, sentences: &[Vec<S>]) -> Result<Vec<AnalysisResult>>
    where
        S: AsRef<str> + Sync,
    {
        sentences
            .par_iter()
            .map(|tokens| self.analyze(tokens))
            .collect()
    }

    /// Executa o pipeline enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `CandidatesLocated`
    /// 2. `EntitiesResolved`
    /// 3. `TagAssigned` (um por token)
    /// 4. `Done`, ou `Error` se algum estágio falhar
    pub fn analyze_streaming<S: AsRef<str>>(&self, tokens: &[S], tx: mpsc::Sender<PipelineEvent>) {
        let outcome = self.run(tokens, &mut |event| {
            let _ = tx.send(event);
        });
        let last = match outcome {
            Ok(result) => PipelineEvent::Done { result },
            Err(err) => PipelineEvent::Error {
                message: err.to_string(),
            },
        };
        let _ = tx.send(last);
    }

    fn run<S: AsRef<str>>(
        &self,
        tokens: &[S],
        emit: &mut dyn FnMut(PipelineEvent),
    ) -> Result<AnalysisResult> {
        let start = Instant::now();

        // === Passo 1: Localização ===
        let candidates = locate(&self.index, tokens)?;
        if let Some(limit) = self.index.config().max_candidates {
            if candidates.len() > limit {
                return Err(Error::TooManyCandidates {
                    found: candidates.len(),
                    limit,
                });
            }
        }
        emit(PipelineEvent::CandidatesLocated {
            candidates: candidates.clone(),
            total: candidates.len(),
        });

        // === Passo 2: Resolução ===
        let entities = resolve(&candidates);
        emit(PipelineEvent::EntitiesResolved {
            entities: entities.clone(),
            score: ChainScore::of(&entities),
        });

        // === Passo 3: BILOU ===
        let spans: Vec<LabeledSpan> = entities.iter().filter_map(GazetteerMatch::labeled).collect();
        let tags = encode(tokens, &spans);
        for (i, (token, tag)) in tokens.iter().zip(&tags).enumerate() {
            emit(PipelineEvent::TagAssigned {
                token_index: i,
                token_text: token.as_ref().to_string(),
                tag: tag.clone(),
            });
        }

        debug!(
            tokens = tokens.len(),
            candidates = candidates.len(),
            entities = entities.len(),
            "sentença analisada"
        );

        Ok(AnalysisResult {
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            candidates,
            entities,
            tags,
            processing_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{build_index, build_index_with_config};

    fn pipeline() -> GazetteerPipeline {
        let index = build_index([
            ("atlantic city", "LOC"),
            ("city of georgia", "LOC"),
            ("emory university", "ORG"),
            ("jinho", "PER"),
        ])
        .unwrap();
        GazetteerPipeline::new(index).unwrap()
    }

    #[test]
    fn test_analyze() {
        let result = pipeline().analyze(&["Atlantic", "City", "of", "Georgia"]).unwrap();
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].text, "city of georgia");
        assert_eq!(result.tags, ["O", "B-LOC", "I-LOC", "L-LOC"]);
    }

    #[test]
    fn test_unfinalized_index_rejected() {
        assert!(matches!(
            GazetteerPipeline::new(PatternIndex::new()),
            Err(Error::NotFinalized)
        ));
    }

    #[test]
    fn test_streaming_events() {
        let (tx, rx) = mpsc::channel();
        pipeline().analyze_streaming(&["Jinho", "visited", "Emory", "University"], tx);
        let events: Vec<PipelineEvent> = rx.try_iter().collect();

        assert!(matches!(events[0], PipelineEvent::CandidatesLocated { total: 2, .. }));
        assert!(matches!(
            events[1],
            PipelineEvent::EntitiesResolved {
                score: ChainScore { count: 2, coverage: 3 },
                ..
            }
        ));
        let assigned = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::TagAssigned { .. }))
            .count();
        assert_eq!(assigned, 4);
        match events.last() {
            Some(PipelineEvent::Done { result }) => {
                assert_eq!(result.tags, ["U-PER", "O", "B-ORG", "L-ORG"]);
            }
            other => panic!("esperava Done, veio {:?}", other),
        }
    }

    #[test]
    fn test_candidate_limit() {
        let config = MatcherConfig {
            max_candidates: Some(1),
            ..MatcherConfig::default()
        };
        let index =
            build_index_with_config([("atlantic city", "LOC"), ("city of georgia", "LOC")], config)
                .unwrap();
        let pipeline = GazetteerPipeline::new(index).unwrap();
        let tokens = ["Atlantic", "City", "of", "Georgia"];

        assert!(matches!(
            pipeline.analyze(&tokens),
            Err(Error::TooManyCandidates { found: 2, limit: 1 })
        ));

        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming(&tokens, tx);
        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], PipelineEvent::Error { .. }));
    }

    #[test]
    fn test_batch_preserves_order() {
        let sentences = vec![
            vec!["Jinho".to_string()],
            vec!["nada".to_string(), "aqui".to_string()],
            vec!["Emory".to_string(), "University".to_string()],
        ];
        let results = pipeline().analyze_batch(&sentences).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].tags, ["U-PER"]);
        assert_eq!(results[1].tags, ["O", "O"]);
        assert_eq!(results[2].tags, ["B-ORG", "L-ORG"]);
    }

    #[test]
    fn test_empty_tokens() {
        let none: [&str; 0] = [];
        let result = pipeline().analyze(&none).unwrap();
        assert!(result.candidates.is_empty());
        assert!(result.tags.is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = PipelineEvent::TagAssigned {
            token_index: 0,
            token_text: "Jinho".to_string(),
            tag: "U-PER".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TagAssigned");
        assert_eq!(json["data"]["tag"], "U-PER");
    }
}
