//! Diet factory: builds validated diets from a type tag and an untyped
//! parameter map.
//!
//! Parameters arrive as a flat JSON object (`serde_json::Map`); numeric values
//! may be JSON numbers or strings and are coerced here. Every check runs before
//! a concrete constructor is called, so a failure never leaves a half-built
//! diet behind.

use crate::audit::USUARIO_PADRAO;
use crate::diet::{compartilhar, DietaHandle};
use crate::diets::{DietaEnteral, DietaOral, ParametrosEnteral, ParametrosOral};
use crate::vocab::{Textura, TipoEquipo, TipoRefeicao, ViaInfusao};
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Untyped factory input
pub type ParametrosDieta = Map<String, Value>;

/// Type tags accepted by [`DietFactory::criar_dieta`]
pub const TIPOS_VALIDOS: &[&str] = &["oral", "enteral"];

const CHAVES_ORAL: &[&str] = &["textura", "numero_refeicoes", "tipo_refeicao"];
const CHAVES_ENTERAL: &[&str] = &[
    "setor_clinico",
    "via_infusao",
    "velocidade_ml_h",
    "quantidade_gramas_por_porcao",
];

/// Accepted spelling variants of parameter names
const ALIASES: &[(&str, &str)] = &[("quantidade_gramas_por_porcao", "quantidade_gramas_por_porção")];

pub struct DietFactory;

impl DietFactory {
    /// Build a diet of kind `tipo` ("oral", "enteral"; trimmed, any case)
    pub fn criar_dieta(tipo: &str, dados: &ParametrosDieta) -> Result<DietaHandle> {
        let tipo_normalizado = tipo.trim().to_lowercase();
        tracing::debug!("Factory request for '{}' diet", tipo_normalizado);

        match tipo_normalizado.as_str() {
            "oral" => Ok(compartilhar(Self::criar_oral(dados)?)),
            "enteral" => Ok(compartilhar(Self::criar_enteral(dados)?)),
            _ => Err(Error::validation(format!(
                "Tipo de dieta desconhecido: '{}'. Tipos válidos: {}",
                tipo,
                TIPOS_VALIDOS.join(", ")
            ))),
        }
    }

    pub fn criar_oral(dados: &ParametrosDieta) -> Result<DietaOral> {
        exigir("Oral", dados, CHAVES_ORAL)?;

        let textura: Textura = texto_obrigatorio(dados, "textura")?.parse()?;
        let numero_refeicoes = inteiro_nao_negativo(dados, "numero_refeicoes")?;
        let tipo_refeicao: TipoRefeicao = texto_obrigatorio(dados, "tipo_refeicao")?.parse()?;

        let dieta = DietaOral::new(ParametrosOral {
            textura,
            numero_refeicoes,
            tipo_refeicao,
            descricao: texto(dados, "descricao").unwrap_or_default(),
            usuario_responsavel: usuario(dados),
        })?;
        tracing::info!("Factory built oral diet ({}, {} meals)", textura, numero_refeicoes);
        Ok(dieta)
    }

    pub fn criar_enteral(dados: &ParametrosDieta) -> Result<DietaEnteral> {
        exigir("Enteral", dados, CHAVES_ENTERAL)?;

        let setor_clinico = texto_obrigatorio(dados, "setor_clinico")?;
        let via_infusao: ViaInfusao = texto_obrigatorio(dados, "via_infusao")?.parse()?;
        let velocidade_ml_h = decimal_positivo(dados, "velocidade_ml_h")?;
        let quantidade_gramas_por_porcao = decimal_positivo(dados, "quantidade_gramas_por_porcao")?;

        let porcoes_diarias = if valor(dados, "porcoes_diarias").is_some() {
            let porcoes = inteiro_nao_negativo(dados, "porcoes_diarias")?;
            if porcoes < 1 {
                return Err(parametro_invalido("porcoes_diarias", &porcoes.to_string()));
            }
            porcoes
        } else {
            1
        };

        let tipo_equipo: TipoEquipo = match texto(dados, "tipo_equipo") {
            Some(t) => t.parse()?,
            None => TipoEquipo::Bomba,
        };

        let dieta = DietaEnteral::new(ParametrosEnteral {
            setor_clinico,
            via_infusao,
            velocidade_ml_h,
            quantidade_gramas_por_porcao,
            porcoes_diarias,
            tipo_equipo,
            descricao: texto(dados, "descricao").unwrap_or_default(),
            usuario_responsavel: usuario(dados),
        })?;
        tracing::info!(
            "Factory built enteral diet ({}, {} ml/h)",
            via_infusao,
            velocidade_ml_h
        );
        Ok(dieta)
    }
}

/// Look a parameter up by name or by one of its aliases; JSON null counts as absent
fn valor<'a>(dados: &'a ParametrosDieta, chave: &str) -> Option<&'a Value> {
    let direto = dados.get(chave);
    let alias = ALIASES
        .iter()
        .filter(|(canonica, _)| *canonica == chave)
        .find_map(|(_, alias)| dados.get(*alias));
    direto.or(alias).filter(|v| !v.is_null())
}

/// Fail with one error listing every missing key
fn exigir(tipo: &str, dados: &ParametrosDieta, chaves: &[&str]) -> Result<()> {
    let faltando: Vec<&str> = chaves
        .iter()
        .copied()
        .filter(|chave| valor(dados, chave).is_none())
        .collect();
    if faltando.is_empty() {
        return Ok(());
    }
    Err(Error::validation(format!(
        "Dieta {} exige os seguintes parâmetros: {}. Faltando: {}",
        tipo,
        chaves.join(", "),
        faltando.join(", ")
    )))
}

fn renderizar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parametro_invalido(chave: &str, recebido: &str) -> Error {
    Error::validation(format!(
        "Parâmetro '{}' inválido: recebido '{}'",
        chave, recebido
    ))
}

fn texto(dados: &ParametrosDieta, chave: &str) -> Option<String> {
    valor(dados, chave).map(renderizar)
}

fn texto_obrigatorio(dados: &ParametrosDieta, chave: &str) -> Result<String> {
    texto(dados, chave)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| parametro_invalido(chave, ""))
}

fn usuario(dados: &ParametrosDieta) -> String {
    texto(dados, "usuario_responsavel")
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| USUARIO_PADRAO.to_string())
}

/// Coerce to a non-negative integer; "6", 6 and 6.0 are accepted
fn inteiro_nao_negativo(dados: &ParametrosDieta, chave: &str) -> Result<u32> {
    let v = valor(dados, chave).ok_or_else(|| parametro_invalido(chave, ""))?;
    let inteiro = match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    inteiro
        .and_then(|i| u32::try_from(i).ok())
        .ok_or_else(|| parametro_invalido(chave, &renderizar(v)))
}

/// Coerce to a strictly positive float
fn decimal_positivo(dados: &ParametrosDieta, chave: &str) -> Result<f64> {
    let v = valor(dados, chave).ok_or_else(|| parametro_invalido(chave, ""))?;
    let decimal = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    decimal
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| parametro_invalido(chave, &renderizar(v)))
}
