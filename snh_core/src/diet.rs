//! The diet capability set shared by every delivery mode.
//!
//! Concrete diets live in [`crate::diets`]. Each one embeds a [`DietaBase`]
//! (description, menu items, audit block, status block) and implements the
//! [`Dieta`] trait. Diets are shared between prescriptions and composites
//! through [`DietaHandle`], a single-threaded shared cell.

use crate::audit::{Auditoria, StatusDieta};
use crate::diets::enteral::ResumoEnteral;
use crate::diets::mista::ResumoMista;
use crate::diets::oral::ResumoOral;
use crate::diets::parenteral::ResumoParenteral;
use crate::item::ItemCardapio;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable reference to any diet
pub type DietaHandle = Rc<RefCell<dyn Dieta>>;

/// Wrap a diet into a [`DietaHandle`]
pub fn compartilhar<D: Dieta + 'static>(dieta: D) -> DietaHandle {
    Rc::new(RefCell::new(dieta))
}

/// Diet delivery mode
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TipoDieta {
    Oral,
    Enteral,
    Parenteral,
    Mista,
}

impl TipoDieta {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoDieta::Oral => "Oral",
            TipoDieta::Enteral => "Enteral",
            TipoDieta::Parenteral => "Parenteral",
            TipoDieta::Mista => "Mista",
        }
    }
}

impl fmt::Display for TipoDieta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational summary returned by [`Dieta::calcular_nutrientes`].
///
/// Despite the name this is descriptive metadata for the kitchen and the
/// nursing staff, not a macro-nutrient total.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tipo_dieta")]
pub enum ResumoNutricional {
    Oral(ResumoOral),
    Enteral(ResumoEnteral),
    Parenteral(ResumoParenteral),
    Mista(ResumoMista),
}

impl ResumoNutricional {
    pub fn tipo(&self) -> TipoDieta {
        match self {
            ResumoNutricional::Oral(_) => TipoDieta::Oral,
            ResumoNutricional::Enteral(_) => TipoDieta::Enteral,
            ResumoNutricional::Parenteral(_) => TipoDieta::Parenteral,
            ResumoNutricional::Mista(_) => TipoDieta::Mista,
        }
    }
}

/// State common to every diet
#[derive(Clone, Debug)]
pub struct DietaBase {
    descricao: String,
    itens: Vec<ItemCardapio>,
    auditoria: Auditoria,
    status: StatusDieta,
}

impl DietaBase {
    pub fn new(descricao: &str, usuario_responsavel: &str) -> Self {
        Self {
            descricao: descricao.trim().to_string(),
            itens: Vec::new(),
            auditoria: Auditoria::new(usuario_responsavel),
            status: StatusDieta::default(),
        }
    }

    pub fn descricao(&self) -> &str {
        &self.descricao
    }

    pub fn definir_descricao(&mut self, descricao: &str) {
        self.descricao = descricao.trim().to_string();
        self.auditoria.registrar_atualizacao();
    }

    /// Menu items (independent copy)
    pub fn itens(&self) -> Vec<ItemCardapio> {
        self.itens.clone()
    }

    pub(crate) fn itens_ref(&self) -> &[ItemCardapio] {
        &self.itens
    }

    pub fn quantidade_itens(&self) -> usize {
        self.itens.len()
    }

    pub fn auditoria(&self) -> &Auditoria {
        &self.auditoria
    }

    pub fn status(&self) -> &StatusDieta {
        &self.status
    }

    pub fn registrar_atualizacao(&mut self) {
        self.auditoria.registrar_atualizacao();
    }

    pub fn adicionar_item(&mut self, item: ItemCardapio) {
        tracing::debug!("Adding item '{}' to diet", item.nome());
        self.itens.push(item);
        self.auditoria.registrar_atualizacao();
    }

    /// Remove the first item named `nome`
    pub fn remover_item(&mut self, nome: &str) -> bool {
        let nome = nome.trim();
        match self.itens.iter().position(|item| item.nome() == nome) {
            Some(pos) => {
                self.itens.remove(pos);
                self.auditoria.registrar_atualizacao();
                true
            }
            None => false,
        }
    }

    pub fn obter_item(&self, nome: &str) -> Option<ItemCardapio> {
        let nome = nome.trim();
        self.itens.iter().find(|item| item.nome() == nome).cloned()
    }

    /// Remove every item, returning how many were removed
    pub fn limpar_itens(&mut self) -> usize {
        let removidos = self.itens.len();
        self.itens.clear();
        self.auditoria.registrar_atualizacao();
        removidos
    }

    pub fn encerrar(&mut self) -> Result<()> {
        self.status.encerrar()?;
        self.auditoria.registrar_atualizacao();
        Ok(())
    }
}

/// Capability set of a diet
pub trait Dieta: fmt::Debug {
    fn tipo(&self) -> TipoDieta;

    fn base(&self) -> &DietaBase;

    fn base_mut(&mut self) -> &mut DietaBase;

    /// Variant-specific operational summary
    fn calcular_nutrientes(&self) -> ResumoNutricional;

    /// Whether the current configuration is consistent. Never fails: any
    /// internal validation error reads as `false`.
    fn validar_compatibilidade(&self) -> bool;

    fn adicionar_item(&mut self, item: ItemCardapio) -> Result<()> {
        self.base_mut().adicionar_item(item);
        Ok(())
    }

    fn remover_item(&mut self, nome: &str) -> bool {
        self.base_mut().remover_item(nome)
    }

    fn obter_item(&self, nome: &str) -> Option<ItemCardapio> {
        self.base().obter_item(nome)
    }

    fn limpar_itens(&mut self) -> usize {
        self.base_mut().limpar_itens()
    }

    fn itens(&self) -> Vec<ItemCardapio> {
        self.base().itens()
    }

    fn descricao(&self) -> &str {
        self.base().descricao()
    }

    fn ativo(&self) -> bool {
        self.base().status().ativo()
    }

    fn auditoria(&self) -> &Auditoria {
        self.base().auditoria()
    }

    fn status(&self) -> &StatusDieta {
        self.base().status()
    }

    /// Close the diet; fails with a state conflict if it is already closed
    fn encerrar_dieta(&mut self) -> Result<()> {
        self.base_mut().encerrar()
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for crate::diets::DietaOral {}
    impl Sealed for crate::diets::DietaEnteral {}
    impl Sealed for crate::diets::DietaParenteral {}
}

/// Leaf diets: the only kinds a [`DietaMista`](crate::diets::DietaMista)
/// accepts as components.
pub trait DietaSimples: Dieta + sealed::Sealed {}

impl DietaSimples for crate::diets::DietaOral {}
impl DietaSimples for crate::diets::DietaEnteral {}
impl DietaSimples for crate::diets::DietaParenteral {}
