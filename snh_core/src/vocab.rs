//! Closed vocabularies used by the diet variants.
//!
//! Every vocabulary parses from free text (trimmed, case-insensitive) and
//! renders back to its canonical Portuguese label.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Look up `valor` in a label table, accepting any of the listed spellings.
fn parse_label<T: Copy>(valor: &str, campo: &str, tabela: &[(&str, T)]) -> Result<T> {
    let normalizado = valor.trim().to_lowercase();
    tabela
        .iter()
        .find(|(label, _)| *label == normalizado)
        .map(|(_, v)| *v)
        .ok_or_else(|| {
            let mut opcoes: Vec<&str> = tabela.iter().map(|(label, _)| *label).collect();
            opcoes.sort_unstable();
            opcoes.dedup();
            Error::validation(format!(
                "{} inválido: '{}'. Opções válidas: {}",
                campo,
                valor,
                opcoes.join(", ")
            ))
        })
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $campo:literal {
            $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            const LABELS: &'static [(&'static str, $name)] = &[
                $(($label, $name::$variant), $(($alias, $name::$variant),)*)+
            ];

            /// Canonical label
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// All canonical values, in declaration order
            pub fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                parse_label(s, $campo, Self::LABELS)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Preparation texture of an oral diet
    Textura, "Textura" {
        Normal => "normal",
        Mole => "mole",
        Pastosa => "pastosa",
        Liquida => "liquida" | "líquida",
    }
}

vocabulary! {
    /// Meal slot an oral diet is prescribed for
    TipoRefeicao, "Tipo de refeição" {
        Desjejum => "desjejum",
        Lanche => "lanche",
        LancheDaTarde => "lanche da tarde",
        Almoco => "almoço" | "almoco",
        Janta => "janta",
        Ceia => "ceia",
    }
}

vocabulary! {
    /// Feeding tube route of an enteral diet
    ViaInfusao, "Via de infusão" {
        Nasogastrica => "nasogástrica" | "nasogastrica",
        Gastrostomia => "gastrostomia",
        Jejunostomia => "jejunostomia",
        Nasoenterica => "nasoentérica" | "nasoenterica",
        CateterCentral => "cateter central",
        Sng => "sng",
    }
}

vocabulary! {
    /// Infusion set: one pump for the whole day or one gravity set per portion
    TipoEquipo, "Tipo de equipo" {
        Bomba => "bomba",
        Gravitacional => "gravitacional",
    }
}

vocabulary! {
    /// Venous access of a parenteral diet
    TipoAcesso, "Tipo de acesso" {
        Periferico => "periférico" | "periferico",
        Central => "central",
        CateterCentral => "cateter central",
        Picc => "picc",
    }
}
