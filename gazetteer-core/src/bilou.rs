//! # Esquema de Tags BILOU
//!
//! Converte entidades (spans de tokens) em uma tag por token, e de volta.
//!
//! | Prefixo | Significado | Uso                                   |
//! |---------|-------------|---------------------------------------|
//! | `B-`    | Begin       | primeiro token de entidade multi-token |
//! | `I-`    | Inside      | tokens do meio                         |
//! | `L-`    | Last        | último token de entidade multi-token   |
//! | `U-`    | Unit        | entidade de um único token             |
//! | `O`     | Outside     | fora de qualquer entidade              |
//!
//! Diferente do BIO, o BILOU marca explicitamente o fim de cada entidade, então
//! duas entidades vizinhas da mesma categoria nunca se confundem.
//!
//! ## Exemplo
//!
//! ```rust
//! use gazetteer_core::bilou::{encode, LabeledSpan};
//!
//! let tokens = ["Jinho", "is", "a", "professor", "at", "Emory", "University"];
//! let entities = [
//!     LabeledSpan::new(0, 1, "PER"),
//!     LabeledSpan::new(5, 7, "ORG"),
//! ];
//! let tags = encode(&tokens, &entities);
//! assert_eq!(tags, ["U-PER", "O", "O", "O", "O", "B-ORG", "L-ORG"]);
//! ```

use serde::{Deserialize, Serialize};

/// Um span de tokens `[start, end)` com uma única label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledSpan {
    /// Índice do token inicial (inclusivo)
    pub start: usize,
    /// Índice do token final (exclusivo)
    pub end: usize,
    /// Rótulo da entidade (ex: "PER", "LOC")
    pub label: String,
}

impl LabeledSpan {
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }
}

/// Tag BILOU aplicada a um token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BilouTag {
    Begin(String),
    Inside(String),
    Last(String),
    Unit(String),
    Outside,
}

impl BilouTag {
    /// Representação textual (ex: "B-PER", "U-LOC", "O")
    pub fn label(&self) -> String {
        match self {
            BilouTag::Begin(cat) => format!("B-{}", cat),
            BilouTag::Inside(cat) => format!("I-{}", cat),
            BilouTag::Last(cat) => format!("L-{}", cat),
            BilouTag::Unit(cat) => format!("U-{}", cat),
            BilouTag::Outside => "O".to_string(),
        }
    }

    /// Parseia a partir de string (ex: "L-ORG" → Last("ORG")).
    ///
    /// A categoria pode conter hífens: "B-GEO-NAT" → Begin("GEO-NAT").
    pub fn from_label(s: &str) -> Option<Self> {
        if s == "O" {
            return Some(BilouTag::Outside);
        }
        let (prefix, cat) = s.split_once('-')?;
        if cat.is_empty() {
            return None;
        }
        let cat = cat.to_string();
        match prefix {
            "B" => Some(BilouTag::Begin(cat)),
            "I" => Some(BilouTag::Inside(cat)),
            "L" => Some(BilouTag::Last(cat)),
            "U" => Some(BilouTag::Unit(cat)),
            _ => None,
        }
    }

    /// Categoria da tag (None para `O`).
    pub fn category(&self) -> Option<&str> {
        match self {
            BilouTag::Begin(c) | BilouTag::Inside(c) | BilouTag::Last(c) | BilouTag::Unit(c) => {
                Some(c)
            }
            BilouTag::Outside => None,
        }
    }

    /// Verifica se a transição prev → next é válida no esquema BILOU.
    ///
    /// - `I-X` e `L-X` só podem seguir `B-X` ou `I-X`
    /// - `B-X`, `U-X` e `O` só podem seguir `L-X`, `U-X` ou `O` (entidade fechada)
    pub fn is_valid_transition(prev: &BilouTag, next: &BilouTag) -> bool {
        let prev_open = match prev {
            BilouTag::Begin(c) | BilouTag::Inside(c) => Some(c),
            _ => None,
        };
        match next {
            BilouTag::Inside(cat) | BilouTag::Last(cat) => prev_open == Some(cat),
            _ => prev_open.is_none(),
        }
    }
}

impl std::fmt::Display for BilouTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Codifica entidades como tags BILOU, uma por token.
///
/// As entidades devem ser disjuntas (garantido pelo [`resolver`](crate::resolver));
/// se não forem, a última sobrescreve. Spans fora dos limites de `tokens` são ignorados.
pub fn encode<S: AsRef<str>>(tokens: &[S], entities: &[LabeledSpan]) -> Vec<String> {
    let mut tags = vec![BilouTag::Outside.label(); tokens.len()];

    for entity in entities {
        let (s, e) = (entity.start, entity.end);
        if s >= e || e > tokens.len() {
            continue;
        }

        if e - s == 1 {
            tags[s] = BilouTag::Unit(entity.label.clone()).label();
            continue;
        }

        tags[s] = BilouTag::Begin(entity.label.clone()).label();
        for tag in &mut tags[s + 1..e - 1] {
            *tag = BilouTag::Inside(entity.label.clone()).label();
        }
        tags[e - 1] = BilouTag::Last(entity.label.clone()).label();
    }

    tags
}

/// Converte tags BILOU de volta em spans.
///
/// Para sequências bem formadas é o inverso exato de [`encode`]. Sequências
/// malformadas são tratadas com tolerância:
/// - `I-X`/`L-X` sem `B-X` aberto inicia um novo span;
/// - troca de categoria fecha o span aberto;
/// - tags desconhecidas contam como `O`.
pub fn bilou_to_spans<S: AsRef<str>>(tags: &[S]) -> Vec<LabeledSpan> {
    let mut spans = Vec::new();
    let mut open: Option<(usize, String)> = None;

    for (i, raw) in tags.iter().enumerate() {
        let tag = BilouTag::from_label(raw.as_ref()).unwrap_or(BilouTag::Outside);

        // Fecha o span aberto se esta tag não o continua
        let continues = matches!(tag, BilouTag::Inside(_) | BilouTag::Last(_))
            && open.as_ref().map(|(_, label)| label.as_str()) == tag.category();
        if !continues {
            if let Some((start, label)) = open.take() {
                spans.push(LabeledSpan { start, end: i, label });
            }
        }

        match tag {
            BilouTag::Unit(cat) => spans.push(LabeledSpan::new(i, i + 1, cat)),
            BilouTag::Begin(cat) => open = Some((i, cat)),
            BilouTag::Inside(cat) => {
                if open.is_none() {
                    open = Some((i, cat));
                }
            }
            BilouTag::Last(cat) => {
                let (start, label) = open.take().unwrap_or((i, cat));
                spans.push(LabeledSpan { start, end: i + 1, label });
            }
            BilouTag::Outside => {}
        }
    }

    // Fecha último span se aberto
    if let Some((start, label)) = open {
        spans.push(LabeledSpan {
            start,
            end: tags.len(),
            label,
        });
    }

    spans
}
