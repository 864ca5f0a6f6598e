//! # gazetteer-core — Marcação de Entidades por Gazetteers
//!
//! Dado um dicionário de frases conhecidas (gazetteers) e um texto já tokenizado,
//! este crate encontra todas as ocorrências das frases, resolve as sobreposições e
//! codifica as entidades resultantes no esquema BILOU.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Índice** ([`index`]): frases + tags compiladas em um autômato Aho-Corasick.
//! 2.  **Localização** ([`locator`]): ocorrências no texto reconstruído, convertidas
//!     para spans de tokens; ocorrências que cortam tokens são descartadas.
//! 3.  **Resolução** ([`resolver`]): melhor conjunto de spans disjuntos
//!     (mais entidades, depois mais cobertura).
//! 4.  **Codificação** ([`bilou`]): uma tag `B-`/`I-`/`L-`/`U-`/`O` por token.
//!
//! O [`pipeline`] encadeia os quatro passos e o [`loader`] lê gazetteers do disco.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use gazetteer_core::{build_index, encode, locate, resolve, GazetteerMatch};
//!
//! let index = build_index([
//!     ("atlantic city", "LOC"),
//!     ("city of georgia", "LOC"),
//! ]).unwrap();
//!
//! let tokens = ["Atlantic", "City", "of", "Georgia"];
//! let candidates = locate(&index, &tokens).unwrap();
//! assert_eq!(candidates.len(), 2);
//!
//! let entities = resolve(&candidates);
//! assert_eq!(entities[0].text, "city of georgia");
//!
//! let spans: Vec<_> = entities.iter().filter_map(GazetteerMatch::labeled).collect();
//! assert_eq!(encode(&tokens, &spans), ["O", "B-LOC", "I-LOC", "L-LOC"]);
//! ```

pub mod bilou;
pub mod config;
pub mod error;
pub mod index;
pub mod loader;
pub mod locator;
pub mod pipeline;
pub mod resolver;

pub use bilou::{bilou_to_spans, encode, BilouTag, LabeledSpan};
pub use config::MatcherConfig;
pub use error::{Error, Result};
pub use index::{build_index, build_index_with_config, PatternIndex, PhraseEntry};
pub use locator::{locate, GazetteerMatch};
pub use pipeline::{AnalysisResult, GazetteerPipeline, PipelineEvent};
pub use resolver::{resolve, ChainScore};
