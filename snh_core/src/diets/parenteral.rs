//! Parenteral diet: intravenous nutrition.
//!
//! The infusion rate must be able to deliver the prescribed daily volume:
//! `velocidade_ml_h * 24` has to stay within ±20% of `volume_ml_dia`.

use crate::diet::{Dieta, DietaBase, ResumoNutricional, TipoDieta};
use crate::vocab::TipoAcesso;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Allowed relative deviation between 24h infused volume and daily volume
pub const TOLERANCIA_VOLUME: f64 = 0.20;

/// Construction parameters for [`DietaParenteral`]
#[derive(Clone, Debug)]
pub struct ParametrosParenteral {
    pub tipo_acesso: TipoAcesso,
    pub volume_ml_dia: f64,
    pub composicao: String,
    pub velocidade_ml_h: f64,
    pub descricao: String,
    pub usuario_responsavel: String,
}

/// Operational summary of a parenteral diet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResumoParenteral {
    pub tipo_acesso: TipoAcesso,
    pub volume_ml_dia: f64,
    pub composicao: String,
    pub velocidade_ml_h: f64,
    pub volume_infundido_24h: f64,
    pub percentual_volume_atingido: f64,
    pub tempo_para_infundir_horas: f64,
    pub quantidade_itens: usize,
}

#[derive(Clone, Debug)]
pub struct DietaParenteral {
    base: DietaBase,
    tipo_acesso: TipoAcesso,
    volume_ml_dia: f64,
    composicao: String,
    velocidade_ml_h: f64,
}

fn validar_volume(volume_ml_dia: f64) -> Result<()> {
    if !(volume_ml_dia > 0.0) || !volume_ml_dia.is_finite() {
        return Err(Error::validation("Volume por dia deve ser maior que 0 ml"));
    }
    Ok(())
}

fn validar_velocidade(velocidade_ml_h: f64) -> Result<()> {
    if !(velocidade_ml_h > 0.0) || !velocidade_ml_h.is_finite() {
        return Err(Error::validation(
            "Velocidade de infusão deve ser maior que 0 ml/h",
        ));
    }
    Ok(())
}

fn validar_composicao(composicao: &str) -> Result<()> {
    if composicao.trim().is_empty() {
        return Err(Error::validation("Composição não pode ser vazia"));
    }
    Ok(())
}

fn validar_consistencia(velocidade_ml_h: f64, volume_ml_dia: f64) -> Result<()> {
    let volume_24h = velocidade_ml_h * 24.0;
    let minimo = volume_ml_dia * (1.0 - TOLERANCIA_VOLUME);
    let maximo = volume_ml_dia * (1.0 + TOLERANCIA_VOLUME);
    if volume_24h < minimo || volume_24h > maximo {
        return Err(Error::validation(format!(
            "Velocidade {} ml/h infundiria {:.1} ml em 24h, mas volume prescrito é {} ml. \
             Ajuste a velocidade ou o volume.",
            velocidade_ml_h, volume_24h, volume_ml_dia
        )));
    }
    Ok(())
}

impl DietaParenteral {
    pub fn new(params: ParametrosParenteral) -> Result<Self> {
        validar_volume(params.volume_ml_dia)?;
        validar_velocidade(params.velocidade_ml_h)?;
        validar_composicao(&params.composicao)?;
        validar_consistencia(params.velocidade_ml_h, params.volume_ml_dia)?;

        let descricao = if params.descricao.trim().is_empty() {
            format!("Dieta Parenteral via {}", params.tipo_acesso)
        } else {
            params.descricao
        };

        Ok(Self {
            base: DietaBase::new(&descricao, &params.usuario_responsavel),
            tipo_acesso: params.tipo_acesso,
            volume_ml_dia: params.volume_ml_dia,
            composicao: params.composicao.trim().to_string(),
            velocidade_ml_h: params.velocidade_ml_h,
        })
    }

    pub fn tipo_acesso(&self) -> TipoAcesso {
        self.tipo_acesso
    }

    pub fn volume_ml_dia(&self) -> f64 {
        self.volume_ml_dia
    }

    pub fn composicao(&self) -> &str {
        &self.composicao
    }

    pub fn velocidade_ml_h(&self) -> f64 {
        self.velocidade_ml_h
    }

    pub fn volume_infundido_24h(&self) -> f64 {
        self.velocidade_ml_h * 24.0
    }

    /// Share of the prescribed daily volume reached in 24h, in percent
    pub fn percentual_volume_atingido(&self) -> f64 {
        self.volume_infundido_24h() / self.volume_ml_dia * 100.0
    }

    /// Hours needed to infuse the daily volume at the current rate
    pub fn tempo_para_infundir_horas(&self) -> f64 {
        self.volume_ml_dia / self.velocidade_ml_h
    }

    pub fn definir_tipo_acesso(&mut self, tipo_acesso: TipoAcesso) {
        self.tipo_acesso = tipo_acesso;
        self.base.registrar_atualizacao();
    }

    // Setters validate each value on its own. The rate/volume pairing is only
    // enforced at construction; `validar_compatibilidade` reports a mismatch.

    pub fn definir_volume_ml_dia(&mut self, volume_ml_dia: f64) -> Result<()> {
        validar_volume(volume_ml_dia)?;
        self.volume_ml_dia = volume_ml_dia;
        self.base.registrar_atualizacao();
        Ok(())
    }

    pub fn definir_velocidade_ml_h(&mut self, velocidade_ml_h: f64) -> Result<()> {
        validar_velocidade(velocidade_ml_h)?;
        self.velocidade_ml_h = velocidade_ml_h;
        self.base.registrar_atualizacao();
        Ok(())
    }

    pub fn definir_composicao(&mut self, composicao: &str) -> Result<()> {
        validar_composicao(composicao)?;
        self.composicao = composicao.trim().to_string();
        self.base.registrar_atualizacao();
        Ok(())
    }

    fn verificar(&self) -> Result<()> {
        validar_volume(self.volume_ml_dia)?;
        validar_velocidade(self.velocidade_ml_h)?;
        validar_composicao(&self.composicao)?;
        validar_consistencia(self.velocidade_ml_h, self.volume_ml_dia)
    }
}

impl Dieta for DietaParenteral {
    fn tipo(&self) -> TipoDieta {
        TipoDieta::Parenteral
    }

    fn base(&self) -> &DietaBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DietaBase {
        &mut self.base
    }

    fn calcular_nutrientes(&self) -> ResumoNutricional {
        ResumoNutricional::Parenteral(ResumoParenteral {
            tipo_acesso: self.tipo_acesso,
            volume_ml_dia: self.volume_ml_dia,
            composicao: self.composicao.clone(),
            velocidade_ml_h: self.velocidade_ml_h,
            volume_infundido_24h: self.volume_infundido_24h(),
            percentual_volume_atingido: self.percentual_volume_atingido(),
            tempo_para_infundir_horas: self.tempo_para_infundir_horas(),
            quantidade_itens: self.base.quantidade_itens(),
        })
    }

    fn validar_compatibilidade(&self) -> bool {
        self.verificar().is_ok()
    }
}
