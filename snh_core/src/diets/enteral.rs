//! Enteral diet: formula delivered through a feeding tube.
//!
//! Pump rule: a gravity set (`gravitacional`) needs one set per portion, a
//! pump (`bomba`) needs a single set for the whole day.

use crate::diet::{Dieta, DietaBase, ResumoNutricional, TipoDieta};
use crate::vocab::{TipoEquipo, ViaInfusao};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Construction parameters for [`DietaEnteral`]
#[derive(Clone, Debug)]
pub struct ParametrosEnteral {
    pub setor_clinico: String,
    pub via_infusao: ViaInfusao,
    pub velocidade_ml_h: f64,
    pub quantidade_gramas_por_porcao: f64,
    pub porcoes_diarias: u32,
    pub tipo_equipo: TipoEquipo,
    pub descricao: String,
    pub usuario_responsavel: String,
}

/// Operational summary of an enteral diet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResumoEnteral {
    pub via_infusao: ViaInfusao,
    pub tipo_equipo: TipoEquipo,
    pub porcoes_diarias: u32,
    pub quantidade_gramas_por_porcao: f64,
    pub total_gramas_diarias: f64,
    pub velocidade_ml_h: f64,
    pub volume_infundido_24h: f64,
    pub equipo_por_porcao: bool,
    pub equipo_unico_por_dia: bool,
}

#[derive(Clone, Debug)]
pub struct DietaEnteral {
    base: DietaBase,
    setor_clinico: String,
    via_infusao: ViaInfusao,
    velocidade_ml_h: f64,
    quantidade_gramas_por_porcao: f64,
    porcoes_diarias: u32,
    tipo_equipo: TipoEquipo,
}

fn validar_positivo(campo: &str, valor: f64) -> Result<()> {
    if !(valor > 0.0) || !valor.is_finite() {
        return Err(Error::validation(format!(
            "{} deve ser maior que 0, recebido: {}",
            campo, valor
        )));
    }
    Ok(())
}

fn validar_porcoes(porcoes_diarias: u32) -> Result<()> {
    if porcoes_diarias < 1 {
        return Err(Error::validation(
            "porcoes_diarias deve ser inteiro maior ou igual a 1",
        ));
    }
    Ok(())
}

impl DietaEnteral {
    pub fn new(params: ParametrosEnteral) -> Result<Self> {
        validar_positivo("velocidade_ml_h", params.velocidade_ml_h)?;
        validar_positivo(
            "quantidade_gramas_por_porcao",
            params.quantidade_gramas_por_porcao,
        )?;
        validar_porcoes(params.porcoes_diarias)?;

        let descricao = if params.descricao.trim().is_empty() {
            format!("Dieta Enteral via {}", params.via_infusao)
        } else {
            params.descricao
        };

        Ok(Self {
            base: DietaBase::new(&descricao, &params.usuario_responsavel),
            setor_clinico: params.setor_clinico.trim().to_string(),
            via_infusao: params.via_infusao,
            velocidade_ml_h: params.velocidade_ml_h,
            quantidade_gramas_por_porcao: params.quantidade_gramas_por_porcao,
            porcoes_diarias: params.porcoes_diarias,
            tipo_equipo: params.tipo_equipo,
        })
    }

    pub fn setor_clinico(&self) -> &str {
        &self.setor_clinico
    }

    pub fn via_infusao(&self) -> ViaInfusao {
        self.via_infusao
    }

    pub fn velocidade_ml_h(&self) -> f64 {
        self.velocidade_ml_h
    }

    pub fn quantidade_gramas_por_porcao(&self) -> f64 {
        self.quantidade_gramas_por_porcao
    }

    pub fn porcoes_diarias(&self) -> u32 {
        self.porcoes_diarias
    }

    pub fn tipo_equipo(&self) -> TipoEquipo {
        self.tipo_equipo
    }

    /// Volume infused over 24 hours at the current rate
    pub fn volume_infundido_24h(&self) -> f64 {
        self.velocidade_ml_h * 24.0
    }

    pub fn total_gramas_diarias(&self) -> f64 {
        self.quantidade_gramas_por_porcao * f64::from(self.porcoes_diarias)
    }

    pub fn definir_via_infusao(&mut self, via: ViaInfusao) {
        self.via_infusao = via;
        self.base.registrar_atualizacao();
    }

    pub fn definir_velocidade_ml_h(&mut self, velocidade_ml_h: f64) -> Result<()> {
        validar_positivo("velocidade_ml_h", velocidade_ml_h)?;
        self.velocidade_ml_h = velocidade_ml_h;
        self.base.registrar_atualizacao();
        Ok(())
    }

    pub fn definir_quantidade_gramas_por_porcao(&mut self, gramas: f64) -> Result<()> {
        validar_positivo("quantidade_gramas_por_porcao", gramas)?;
        self.quantidade_gramas_por_porcao = gramas;
        self.base.registrar_atualizacao();
        Ok(())
    }

    pub fn definir_porcoes_diarias(&mut self, porcoes_diarias: u32) -> Result<()> {
        validar_porcoes(porcoes_diarias)?;
        self.porcoes_diarias = porcoes_diarias;
        self.base.registrar_atualizacao();
        Ok(())
    }

    pub fn definir_tipo_equipo(&mut self, tipo_equipo: TipoEquipo) {
        self.tipo_equipo = tipo_equipo;
        self.base.registrar_atualizacao();
    }

    fn verificar(&self) -> Result<()> {
        validar_positivo("velocidade_ml_h", self.velocidade_ml_h)?;
        validar_positivo(
            "quantidade_gramas_por_porcao",
            self.quantidade_gramas_por_porcao,
        )?;
        validar_porcoes(self.porcoes_diarias)
    }
}

impl Dieta for DietaEnteral {
    fn tipo(&self) -> TipoDieta {
        TipoDieta::Enteral
    }

    fn base(&self) -> &DietaBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DietaBase {
        &mut self.base
    }

    fn calcular_nutrientes(&self) -> ResumoNutricional {
        ResumoNutricional::Enteral(ResumoEnteral {
            via_infusao: self.via_infusao,
            tipo_equipo: self.tipo_equipo,
            porcoes_diarias: self.porcoes_diarias,
            quantidade_gramas_por_porcao: self.quantidade_gramas_por_porcao,
            total_gramas_diarias: self.total_gramas_diarias(),
            velocidade_ml_h: self.velocidade_ml_h,
            volume_infundido_24h: self.volume_infundido_24h(),
            equipo_por_porcao: self.tipo_equipo == TipoEquipo::Gravitacional,
            equipo_unico_por_dia: self.tipo_equipo == TipoEquipo::Bomba,
        })
    }

    fn validar_compatibilidade(&self) -> bool {
        self.verificar().is_ok()
    }
}
