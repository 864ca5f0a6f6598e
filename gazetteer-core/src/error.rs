//! Tipos de erro do `gazetteer-core`.
//!
//! Quase todos os erros aqui são violações de contrato (índice usado fora de ordem,
//! frase vazia). Spans desalinhados com os tokens **não** são erros: o localizador
//! simplesmente os descarta.

use thiserror::Error;

/// Resultado padrão das operações do crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// `insert` ou `finalize` chamados depois da finalização do índice.
    #[error("o índice de padrões já foi finalizado")]
    AlreadyFinalized,

    /// Busca tentada antes de `finalize`.
    #[error("o índice de padrões ainda não foi finalizado")]
    NotFinalized,

    /// Frase vazia (após normalização) não pode ser indexada.
    #[error("frase vazia não pode ser inserida no gazetteer")]
    EmptyPhrase,

    /// Falha na construção do autômato Aho-Corasick.
    #[error("falha ao construir o autômato: {0}")]
    Automaton(String),

    /// Limite de candidatos configurado foi excedido antes da resolução.
    #[error("{found} candidatos encontrados, limite configurado é {limit}")]
    TooManyCandidates { found: usize, limit: usize },

    #[error("erro de IO: {0}")]
    Io(#[from] std::io::Error),

    /// Padrão glob inválido ao procurar arquivos de gazetteer.
    #[error("padrão de arquivo inválido: {0}")]
    Pattern(String),

    /// Configuração inválida.
    #[error("configuração inválida: {0}")]
    Config(String),
}

impl From<aho_corasick::BuildError> for Error {
    fn from(err: aho_corasick::BuildError) -> Self {
        Error::Automaton(err.to_string())
    }
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Error::Pattern(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
