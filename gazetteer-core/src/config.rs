//! # Configuração do Matcher
//!
//! Poucos parâmetros, todos com padrão razoável. A configuração pode ser lida de
//! um JSON (ex: `{"case_insensitive": false, "max_candidates": 64}`); campos
//! ausentes assumem o valor padrão.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parâmetros que controlam indexação, busca e resolução.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Compara frases e tokens em minúsculas. Padrão: `true`.
    ///
    /// Com isso "Atlantic City" no texto casa com "atlantic city" no gazetteer.
    pub case_insensitive: bool,
    /// Número máximo de candidatos aceitos pelo pipeline antes de chamar o resolvedor.
    ///
    /// A enumeração de cadeias é exponencial no pior caso (candidatos todos
    /// sobrepostos); quem processa entrada não confiável deve definir um limite.
    pub max_candidates: Option<usize>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            max_candidates: None,
        }
    }
}

impl MatcherConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Normaliza um texto (frase ou token) conforme a configuração.
    pub(crate) fn normalize(&self, text: &str) -> String {
        if self.case_insensitive {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_case_insensitive() {
        let config = MatcherConfig::default();
        assert!(config.case_insensitive);
        assert_eq!(config.max_candidates, None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MatcherConfig::from_json_str(r#"{"max_candidates": 32}"#).unwrap();
        assert!(config.case_insensitive);
        assert_eq!(config.max_candidates, Some(32));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = MatcherConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_normalize() {
        let mut config = MatcherConfig::default();
        assert_eq!(config.normalize("São Paulo"), "são paulo");
        config.case_insensitive = false;
        assert_eq!(config.normalize("São Paulo"), "São Paulo");
    }
}
