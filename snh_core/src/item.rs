//! Menu items: a named, weighed food or formula entry carrying restriction tags.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trim and lower-case a restriction tag
pub(crate) fn normalizar_restricao(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Immutable menu item value.
///
/// Equality (and hashing) only considers `nome`: two items with the same name
/// but different weight or restrictions are the same item.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ItemCardapioRaw")]
pub struct ItemCardapio {
    nome: String,
    quantidade_gramas: f64,
    restricoes: Vec<String>,
}

impl ItemCardapio {
    /// Create an item without restriction tags
    pub fn new(nome: &str, quantidade_gramas: f64) -> Result<Self> {
        Self::with_restricoes(nome, quantidade_gramas, std::iter::empty::<&str>())
    }

    /// Create an item tagged with restrictions (e.g. "lactose", "gluten").
    ///
    /// Tags are trimmed and lower-cased; order and duplicates are kept.
    pub fn with_restricoes<I, S>(nome: &str, quantidade_gramas: f64, restricoes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nome = nome.trim();
        if nome.is_empty() {
            return Err(Error::validation("Nome do item não pode ser vazio"));
        }
        if !(quantidade_gramas > 0.0) {
            return Err(Error::validation(format!(
                "Quantidade deve ser maior que 0 gramas, recebido: {}",
                quantidade_gramas
            )));
        }

        Ok(Self {
            nome: nome.to_string(),
            quantidade_gramas,
            restricoes: restricoes
                .into_iter()
                .map(|r| normalizar_restricao(r.as_ref()))
                .collect(),
        })
    }

    pub fn nome(&self) -> &str {
        &self.nome
    }

    pub fn quantidade_gramas(&self) -> f64 {
        self.quantidade_gramas
    }

    /// Restriction tags (independent copy)
    pub fn restricoes(&self) -> Vec<String> {
        self.restricoes.clone()
    }

    pub(crate) fn restricoes_ref(&self) -> &[String] {
        &self.restricoes
    }
}

/// Wire shape of an item; deserialization goes through the validating constructor
#[derive(Deserialize)]
struct ItemCardapioRaw {
    nome: String,
    quantidade_gramas: f64,
    #[serde(default)]
    restricoes: Vec<String>,
}

impl TryFrom<ItemCardapioRaw> for ItemCardapio {
    type Error = Error;

    fn try_from(raw: ItemCardapioRaw) -> Result<Self> {
        Self::with_restricoes(&raw.nome, raw.quantidade_gramas, raw.restricoes)
    }
}

impl PartialEq for ItemCardapio {
    fn eq(&self, other: &Self) -> bool {
        self.nome == other.nome
    }
}

impl Eq for ItemCardapio {}

impl std::hash::Hash for ItemCardapio {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.nome.hash(state);
    }
}

impl fmt::Display for ItemCardapio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}g)", self.nome, self.quantidade_gramas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_trims_name() {
        let item = ItemCardapio::new("  Arroz ", 200.0).unwrap();
        assert_eq!(item.nome(), "Arroz");
        assert_eq!(item.quantidade_gramas(), 200.0);
        assert!(item.restricoes().is_empty());
    }

    #[test]
    fn test_item_rejects_blank_name() {
        assert!(matches!(
            ItemCardapio::new("", 100.0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            ItemCardapio::new("   ", 100.0),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_item_rejects_non_positive_weight() {
        assert!(ItemCardapio::new("Arroz", 0.0).is_err());
        assert!(ItemCardapio::new("Arroz", -5.0).is_err());
        assert!(ItemCardapio::new("Arroz", f64::NAN).is_err());
    }

    #[test]
    fn test_equality_uses_name_only() {
        let a = ItemCardapio::new("Arroz", 100.0).unwrap();
        let b = ItemCardapio::with_restricoes("Arroz", 999.0, ["gluten"]).unwrap();
        let c = ItemCardapio::new("Feijão", 100.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_restrictions_are_normalized_and_keep_order() {
        let item =
            ItemCardapio::with_restricoes("Pão", 50.0, [" Gluten ", "LACTOSE", "gluten"]).unwrap();
        assert_eq!(item.restricoes(), vec!["gluten", "lactose", "gluten"]);
    }

    #[test]
    fn test_restrictions_accessor_returns_copy() {
        let item = ItemCardapio::with_restricoes("Leite", 200.0, ["lactose"]).unwrap();
        let mut copia = item.restricoes();
        copia.push("soja".into());
        assert_eq!(item.restricoes(), vec!["lactose"]);
    }

    #[test]
    fn test_deserialize_rejects_invalid_item() {
        let vazio = r#"{"nome":"  ","quantidade_gramas":100.0}"#;
        let err = serde_json::from_str::<ItemCardapio>(vazio).unwrap_err();
        assert!(err.to_string().contains("Nome do item não pode ser vazio"));

        let negativo = r#"{"nome":"Arroz","quantidade_gramas":-5.0,"restricoes":[]}"#;
        let err = serde_json::from_str::<ItemCardapio>(negativo).unwrap_err();
        assert!(err.to_string().contains("Quantidade deve ser maior que 0 gramas"));
    }

    #[test]
    fn test_deserialize_normalizes_like_constructor() {
        let json = r#"{"nome":" Iogurte ","quantidade_gramas":170.0,"restricoes":[" LACTOSE "]}"#;
        let item: ItemCardapio = serde_json::from_str(json).unwrap();
        assert_eq!(item.nome(), "Iogurte");
        assert_eq!(item.restricoes(), vec!["lactose"]);

        let sem_tags: ItemCardapio =
            serde_json::from_str(r#"{"nome":"Arroz","quantidade_gramas":80.0}"#).unwrap();
        assert!(sem_tags.restricoes().is_empty());

        let volta: ItemCardapio =
            serde_json::from_value(serde_json::to_value(&item).unwrap()).unwrap();
        assert_eq!(volta.restricoes(), item.restricoes());
    }
}
