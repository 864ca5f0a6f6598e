//! # Leitura de Gazetteers do disco
//!
//! Formato: um diretório com um arquivo `.txt` por tag, uma frase por linha.
//! O nome do arquivo sem a extensão é a tag:
//!
//! ```text
//! gazetteers/
//! ├── LOC.txt      # "atlantic city", "são paulo", ...
//! ├── ORG.txt      # "emory university", "petrobras", ...
//! └── PER.txt
//! ```
//!
//! Linhas em branco são ignoradas. Os arquivos são lidos em ordem de caminho,
//! o que deixa a construção do índice reprodutível.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::MatcherConfig;
use crate::error::Result;
use crate::index::{build_index_with_config, PatternIndex};

/// Lista os arquivos `*.txt` de `dir`, em ordem.
pub fn gazetteer_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&dir.as_ref().to_string_lossy());
    let pattern = Path::new(&escaped).join("*.txt");

    let mut files = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!(path = %err.path().display(), "arquivo de gazetteer ilegível"),
        }
    }
    files.sort();
    Ok(files)
}

/// Lê um arquivo de gazetteer: uma frase não vazia por linha.
pub fn read_phrases(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Lê todos os gazetteers de `dir` como pares (frase, tag).
pub fn read_gazetteer_pairs(dir: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();

    for path in gazetteer_files(&dir)? {
        let Some(tag) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let phrases = read_phrases(&path)?;
        info!(tag = %tag, phrases = phrases.len(), "gazetteer carregado");
        pairs.extend(phrases.into_iter().map(|phrase| (phrase, tag.clone())));
    }

    if pairs.is_empty() {
        warn!(dir = %dir.as_ref().display(), "nenhuma frase de gazetteer encontrada");
    }
    Ok(pairs)
}

/// Lê os gazetteers de `dir` e devolve o índice já finalizado.
pub fn read_gazetteers(dir: impl AsRef<Path>, config: MatcherConfig) -> Result<PatternIndex> {
    let pairs = read_gazetteer_pairs(dir)?;
    build_index_with_config(pairs, config)
}
