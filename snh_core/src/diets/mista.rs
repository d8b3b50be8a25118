//! Mixed diet: a weighted composition of leaf diets.
//!
//! Components are shared handles to oral, enteral or parenteral diets. A mixed
//! diet never nests another mixed diet, never lists the same diet twice and
//! holds at most four components. It is considered valid when it has at least
//! two components whose percentages add up to 100% (±5%).

use crate::diet::{
    Dieta, DietaBase, DietaHandle, DietaSimples, ResumoNutricional, TipoDieta,
};
use crate::item::ItemCardapio;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub const MIN_COMPONENTES: usize = 2;
pub const MAX_COMPONENTES: usize = 4;
pub const PERCENTUAL_TOTAL_MIN: f64 = 95.0;
pub const PERCENTUAL_TOTAL_MAX: f64 = 105.0;

const DESCRICAO_PADRAO: &str = "Dieta Mista";

/// One weighted component of a [`DietaMista`]
#[derive(Clone, Debug)]
pub struct ComponenteMista {
    dieta: DietaHandle,
    percentual: f64,
}

impl ComponenteMista {
    /// Shared handle to the component diet
    pub fn dieta(&self) -> DietaHandle {
        Rc::clone(&self.dieta)
    }

    pub fn percentual(&self) -> f64 {
        self.percentual
    }

    fn referencia<T: ?Sized>(&self, dieta: &Rc<RefCell<T>>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.dieta), Rc::as_ptr(dieta))
    }
}

/// Per-component entry of [`ResumoMista`]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResumoComponente {
    pub tipo: TipoDieta,
    pub percentual: f64,
    pub descricao: String,
    pub ativo: bool,
    pub nutrientes: Box<ResumoNutricional>,
}

/// Operational summary of a mixed diet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResumoMista {
    pub componentes: Vec<ResumoComponente>,
    pub quantidade_componentes: usize,
    pub percentual_total: f64,
    pub esta_valida: bool,
    pub quantidade_itens: usize,
}

fn validar_percentual(percentual: f64) -> Result<()> {
    if !(percentual > 0.0 && percentual <= 100.0) {
        return Err(Error::validation(format!(
            "Percentual deve estar entre 0 e 100, recebido: {}",
            percentual
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub struct DietaMista {
    base: DietaBase,
    componentes: Vec<ComponenteMista>,
}

impl DietaMista {
    pub fn new(descricao: &str, usuario_responsavel: &str) -> Self {
        let descricao = if descricao.trim().is_empty() {
            DESCRICAO_PADRAO
        } else {
            descricao
        };
        Self {
            base: DietaBase::new(descricao, usuario_responsavel),
            componentes: Vec::new(),
        }
    }

    /// Components (independent list; the diets themselves stay shared)
    pub fn componentes(&self) -> Vec<ComponenteMista> {
        self.componentes.clone()
    }

    pub fn quantidade_componentes(&self) -> usize {
        self.componentes.len()
    }

    pub fn percentual_total(&self) -> f64 {
        self.componentes.iter().map(|c| c.percentual).sum()
    }

    pub fn esta_valida(&self) -> bool {
        self.validar_compatibilidade()
    }

    /// Add a leaf diet with its share of the plan.
    ///
    /// Only oral, enteral and parenteral diets are accepted here, so nesting
    /// a mixed diet is ruled out by the signature.
    pub fn adicionar_componente<D>(&mut self, dieta: Rc<RefCell<D>>, percentual: f64) -> Result<()>
    where
        D: DietaSimples + 'static,
    {
        self.inserir(dieta, percentual)
    }

    /// Add a diet known only through its type-erased handle.
    ///
    /// Fails with [`Error::TypeMismatch`] when the handle holds a mixed diet.
    pub fn adicionar_componente_handle(&mut self, dieta: DietaHandle, percentual: f64) -> Result<()> {
        let tipo = match dieta.try_borrow() {
            Ok(d) => d.tipo(),
            // Only the diet being mutated right now can be mutably borrowed: ourselves
            Err(_) => TipoDieta::Mista,
        };
        if tipo == TipoDieta::Mista {
            return Err(Error::TypeMismatch(
                "Não é permitido adicionar DietaMista como componente de DietaMista".into(),
            ));
        }
        self.inserir(dieta, percentual)
    }

    fn inserir(&mut self, dieta: DietaHandle, percentual: f64) -> Result<()> {
        validar_percentual(percentual)?;

        if self.componentes.len() >= MAX_COMPONENTES {
            return Err(Error::validation(format!(
                "Dieta mista já possui {} componentes (limite máximo). \
                 Remova um componente antes de adicionar outro.",
                MAX_COMPONENTES
            )));
        }

        if self.componentes.iter().any(|c| c.referencia(&dieta)) {
            return Err(Error::validation(
                "Esta dieta já foi adicionada como componente. \
                 Use atualizar_percentual() para alterar o percentual.",
            ));
        }

        self.componentes.push(ComponenteMista { dieta, percentual });
        self.base.registrar_atualizacao();
        tracing::debug!(
            "Added component ({}%) to mixed diet, total now {}%",
            percentual,
            self.percentual_total()
        );
        Ok(())
    }

    /// Remove the component referencing `dieta`; false if absent
    pub fn remover_componente<T: ?Sized>(&mut self, dieta: &Rc<RefCell<T>>) -> bool {
        match self.componentes.iter().position(|c| c.referencia(dieta)) {
            Some(pos) => {
                self.componentes.remove(pos);
                self.base.registrar_atualizacao();
                true
            }
            None => false,
        }
    }

    /// Change the share of an existing component; false if absent
    pub fn atualizar_percentual<T: ?Sized>(
        &mut self,
        dieta: &Rc<RefCell<T>>,
        novo_percentual: f64,
    ) -> Result<bool> {
        validar_percentual(novo_percentual)?;

        match self.componentes.iter_mut().find(|c| c.referencia(dieta)) {
            Some(componente) => {
                componente.percentual = novo_percentual;
                self.base.registrar_atualizacao();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every component, returning how many were removed
    pub fn limpar_componentes(&mut self) -> usize {
        let removidos = self.componentes.len();
        self.componentes.clear();
        self.base.registrar_atualizacao();
        removidos
    }

    pub fn componentes_por_tipo(&self, tipo: TipoDieta) -> Vec<ComponenteMista> {
        self.componentes
            .iter()
            .filter(|c| c.dieta.try_borrow().map(|d| d.tipo() == tipo).unwrap_or(false))
            .cloned()
            .collect()
    }

    /// Human-readable composition, e.g. "Dieta Mista: Oral (30%) + Enteral (70%)"
    pub fn obter_resumo(&self) -> String {
        if self.componentes.is_empty() {
            return format!("{} (vazia)", DESCRICAO_PADRAO);
        }
        let partes: Vec<String> = self
            .componentes
            .iter()
            .map(|c| {
                let tipo = c
                    .dieta
                    .try_borrow()
                    .map(|d| d.tipo().to_string())
                    .unwrap_or_else(|_| "?".into());
                format!("{} ({}%)", tipo, c.percentual)
            })
            .collect();
        format!("{}: {}", DESCRICAO_PADRAO, partes.join(" + "))
    }

    fn verificar(&self) -> Result<()> {
        let quantidade = self.componentes.len();
        if !(MIN_COMPONENTES..=MAX_COMPONENTES).contains(&quantidade) {
            return Err(Error::validation(format!(
                "Dieta mista precisa de {} a {} componentes, possui {}",
                MIN_COMPONENTES, MAX_COMPONENTES, quantidade
            )));
        }

        let total = self.percentual_total();
        if !(PERCENTUAL_TOTAL_MIN..=PERCENTUAL_TOTAL_MAX).contains(&total) {
            return Err(Error::validation(format!(
                "Soma dos percentuais deve ser 100% (±5%), atual: {}%",
                total
            )));
        }

        for componente in &self.componentes {
            validar_percentual(componente.percentual)?;
            let dieta = componente
                .dieta
                .try_borrow()
                .map_err(|_| Error::state("Componente em uso"))?;
            if dieta.tipo() == TipoDieta::Mista {
                return Err(Error::TypeMismatch("Componente aninhado".into()));
            }
        }
        Ok(())
    }

    fn resumir_componentes(&self) -> Vec<ResumoComponente> {
        self.componentes
            .iter()
            .filter_map(|c| match c.dieta.try_borrow() {
                Ok(dieta) => Some(ResumoComponente {
                    tipo: dieta.tipo(),
                    percentual: c.percentual,
                    descricao: dieta.descricao().to_string(),
                    ativo: dieta.ativo(),
                    nutrientes: Box::new(dieta.calcular_nutrientes()),
                }),
                Err(_) => {
                    tracing::warn!("Skipping component busy elsewhere in mixed diet summary");
                    None
                }
            })
            .collect()
    }
}

impl Dieta for DietaMista {
    fn tipo(&self) -> TipoDieta {
        TipoDieta::Mista
    }

    fn base(&self) -> &DietaBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DietaBase {
        &mut self.base
    }

    fn calcular_nutrientes(&self) -> ResumoNutricional {
        ResumoNutricional::Mista(ResumoMista {
            componentes: self.resumir_componentes(),
            quantidade_componentes: self.componentes.len(),
            percentual_total: self.percentual_total(),
            esta_valida: self.esta_valida(),
            quantidade_itens: self.base.quantidade_itens(),
        })
    }

    fn validar_compatibilidade(&self) -> bool {
        self.verificar().is_ok()
    }

    /// Items belong to the leaf components, never to the composite
    fn adicionar_item(&mut self, item: ItemCardapio) -> Result<()> {
        Err(Error::validation(format!(
            "DietaMista não deve ter itens próprios ('{}'). \
             Adicione itens aos componentes individuais.",
            item.nome()
        )))
    }
}

impl fmt::Display for DietaMista {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.obter_resumo())
    }
}
