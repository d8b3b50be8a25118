//! Oral diet: regular feeding by mouth.

use crate::diet::{Dieta, DietaBase, ResumoNutricional, TipoDieta};
use crate::item::{normalizar_restricao, ItemCardapio};
use crate::vocab::{Textura, TipoRefeicao};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Construction parameters for [`DietaOral`]
#[derive(Clone, Debug)]
pub struct ParametrosOral {
    pub textura: Textura,
    pub numero_refeicoes: u32,
    pub tipo_refeicao: TipoRefeicao,
    pub descricao: String,
    pub usuario_responsavel: String,
}

/// Operational summary of an oral diet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResumoOral {
    pub textura: Textura,
    pub numero_refeicoes: u32,
    pub tipo_refeicao: TipoRefeicao,
    pub restricoes_proibidas: Vec<String>,
    pub quantidade_itens: usize,
}

#[derive(Clone, Debug)]
pub struct DietaOral {
    base: DietaBase,
    textura: Textura,
    numero_refeicoes: u32,
    tipo_refeicao: TipoRefeicao,
    restricoes_proibidas: BTreeSet<String>,
}

fn validar_refeicoes(numero_refeicoes: u32) -> Result<()> {
    if numero_refeicoes == 0 {
        return Err(Error::validation("Número de refeições deve ser maior que 0"));
    }
    Ok(())
}

impl DietaOral {
    pub fn new(params: ParametrosOral) -> Result<Self> {
        validar_refeicoes(params.numero_refeicoes)?;

        Ok(Self {
            base: DietaBase::new(&params.descricao, &params.usuario_responsavel),
            textura: params.textura,
            numero_refeicoes: params.numero_refeicoes,
            tipo_refeicao: params.tipo_refeicao,
            restricoes_proibidas: BTreeSet::new(),
        })
    }

    pub fn textura(&self) -> Textura {
        self.textura
    }

    pub fn numero_refeicoes(&self) -> u32 {
        self.numero_refeicoes
    }

    pub fn tipo_refeicao(&self) -> TipoRefeicao {
        self.tipo_refeicao
    }

    pub fn definir_textura(&mut self, textura: Textura) {
        self.textura = textura;
        self.base.registrar_atualizacao();
    }

    pub fn definir_numero_refeicoes(&mut self, numero_refeicoes: u32) -> Result<()> {
        validar_refeicoes(numero_refeicoes)?;
        self.numero_refeicoes = numero_refeicoes;
        self.base.registrar_atualizacao();
        Ok(())
    }

    pub fn definir_tipo_refeicao(&mut self, tipo_refeicao: TipoRefeicao) {
        self.tipo_refeicao = tipo_refeicao;
        self.base.registrar_atualizacao();
    }

    /// Forbid a restriction tag (e.g. "gluten", "lactose") for this diet
    pub fn adicionar_restricao_proibida(&mut self, restricao: &str) -> Result<()> {
        let chave = normalizar_restricao(restricao);
        if chave.is_empty() {
            return Err(Error::validation("Restrição inválida"));
        }
        self.restricoes_proibidas.insert(chave);
        self.base.registrar_atualizacao();
        Ok(())
    }

    pub fn remover_restricao_proibida(&mut self, restricao: &str) -> bool {
        let removida = self
            .restricoes_proibidas
            .remove(&normalizar_restricao(restricao));
        if removida {
            self.base.registrar_atualizacao();
        }
        removida
    }

    /// Forbidden tags, sorted
    pub fn listar_restricoes_proibidas(&self) -> Vec<String> {
        self.restricoes_proibidas.iter().cloned().collect()
    }

    pub fn tem_restricao_proibida(&self, restricao: &str) -> bool {
        self.restricoes_proibidas
            .contains(&normalizar_restricao(restricao))
    }

    /// Tags of `item` that this diet forbids, sorted and deduplicated
    fn conflitos(&self, item: &ItemCardapio) -> Vec<String> {
        item.restricoes_ref()
            .iter()
            .filter(|tag| self.restricoes_proibidas.contains(*tag))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Dieta for DietaOral {
    fn tipo(&self) -> TipoDieta {
        TipoDieta::Oral
    }

    fn base(&self) -> &DietaBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DietaBase {
        &mut self.base
    }

    fn calcular_nutrientes(&self) -> ResumoNutricional {
        ResumoNutricional::Oral(ResumoOral {
            textura: self.textura,
            numero_refeicoes: self.numero_refeicoes,
            tipo_refeicao: self.tipo_refeicao,
            restricoes_proibidas: self.listar_restricoes_proibidas(),
            quantidade_itens: self.base.quantidade_itens(),
        })
    }

    fn validar_compatibilidade(&self) -> bool {
        if validar_refeicoes(self.numero_refeicoes).is_err() {
            return false;
        }
        // A restriction forbidden after an item was added makes the plan inconsistent
        self.base
            .itens_ref()
            .iter()
            .all(|item| self.conflitos(item).is_empty())
    }

    fn adicionar_item(&mut self, item: ItemCardapio) -> Result<()> {
        let conflitantes = self.conflitos(&item);
        if !conflitantes.is_empty() {
            tracing::warn!(
                "Rejected item '{}' for oral diet: forbidden {:?}",
                item.nome(),
                conflitantes
            );
            return Err(Error::validation(format!(
                "Item '{}' conflita com restrições da dieta: {}",
                item.nome(),
                conflitantes.join(", ")
            )));
        }
        self.base.adicionar_item(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dieta_oral() -> DietaOral {
        DietaOral::new(ParametrosOral {
            textura: Textura::Pastosa,
            numero_refeicoes: 6,
            tipo_refeicao: TipoRefeicao::Janta,
            descricao: "Pós-operatório".into(),
            usuario_responsavel: "Nutri Ana".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_new_oral_diet() {
        let dieta = dieta_oral();
        assert_eq!(dieta.tipo(), TipoDieta::Oral);
        assert_eq!(dieta.textura(), Textura::Pastosa);
        assert_eq!(dieta.numero_refeicoes(), 6);
        assert_eq!(dieta.tipo_refeicao(), TipoRefeicao::Janta);
        assert_eq!(dieta.descricao(), "Pós-operatório");
        assert_eq!(dieta.auditoria().usuario_responsavel(), "Nutri Ana");
        assert!(dieta.ativo());
    }

    #[test]
    fn test_zero_meals_rejected() {
        let result = DietaOral::new(ParametrosOral {
            textura: Textura::Normal,
            numero_refeicoes: 0,
            tipo_refeicao: TipoRefeicao::Almoco,
            descricao: String::new(),
            usuario_responsavel: String::new(),
        });
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_forbidden_item_is_rejected_without_mutation() {
        let mut dieta = dieta_oral();
        dieta.adicionar_restricao_proibida("Lactose").unwrap();
        dieta
            .adicionar_item(ItemCardapio::new("Arroz", 100.0).unwrap())
            .unwrap();

        let leite = ItemCardapio::with_restricoes("Leite", 200.0, ["lactose"]).unwrap();
        let err = dieta.adicionar_item(leite).unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("lactose"));
        assert_eq!(dieta.itens().len(), 1);
    }

    #[test]
    fn test_deserialized_item_hits_forbidden_guard() {
        let mut dieta = dieta_oral();
        dieta.adicionar_restricao_proibida("lactose").unwrap();

        let iogurte: ItemCardapio = serde_json::from_str(
            r#"{"nome":"Iogurte","quantidade_gramas":170.0,"restricoes":[" LACTOSE "]}"#,
        )
        .unwrap();
        assert!(matches!(dieta.adicionar_item(iogurte), Err(Error::Validation(_))));
        assert_eq!(dieta.itens().len(), 0);
    }

    #[test]
    fn test_allowed_item_touches_audit() {
        let mut dieta = dieta_oral();
        let antes = dieta.auditoria().atualizado_em();
        dieta
            .adicionar_item(ItemCardapio::with_restricoes("Pão", 50.0, ["gluten"]).unwrap())
            .unwrap();
        assert_eq!(dieta.itens().len(), 1);
        assert!(dieta.auditoria().atualizado_em() >= antes);
    }

    #[test]
    fn test_restriction_management() {
        let mut dieta = dieta_oral();
        dieta.adicionar_restricao_proibida(" GLUTEN ").unwrap();
        dieta.adicionar_restricao_proibida("lactose").unwrap();
        assert!(dieta.adicionar_restricao_proibida("  ").is_err());

        assert!(dieta.tem_restricao_proibida("Gluten"));
        assert_eq!(dieta.listar_restricoes_proibidas(), vec!["gluten", "lactose"]);

        assert!(dieta.remover_restricao_proibida("gluten"));
        assert!(!dieta.remover_restricao_proibida("gluten"));
        assert_eq!(dieta.listar_restricoes_proibidas(), vec!["lactose"]);
    }

    #[test]
    fn test_summary_is_operational_metadata() {
        let mut dieta = dieta_oral();
        dieta.adicionar_restricao_proibida("gluten").unwrap();

        match dieta.calcular_nutrientes() {
            ResumoNutricional::Oral(resumo) => {
                assert_eq!(resumo.textura, Textura::Pastosa);
                assert_eq!(resumo.numero_refeicoes, 6);
                assert_eq!(resumo.tipo_refeicao, TipoRefeicao::Janta);
                assert_eq!(resumo.restricoes_proibidas, vec!["gluten"]);
                assert_eq!(resumo.quantidade_itens, 0);
            }
            other => panic!("unexpected summary {:?}", other),
        }
    }

    #[test]
    fn test_summary_serializes_with_tag() {
        let json = serde_json::to_value(dieta_oral().calcular_nutrientes()).unwrap();
        assert_eq!(json["tipo_dieta"], "Oral");
        assert_eq!(json["textura"], "pastosa");
        assert_eq!(json["tipo_refeicao"], "janta");
    }

    #[test]
    fn test_late_restriction_breaks_compatibility() {
        let mut dieta = dieta_oral();
        dieta
            .adicionar_item(ItemCardapio::with_restricoes("Queijo", 30.0, ["lactose"]).unwrap())
            .unwrap();
        assert!(dieta.validar_compatibilidade());

        dieta.adicionar_restricao_proibida("lactose").unwrap();
        assert!(!dieta.validar_compatibilidade());
    }

    #[test]
    fn test_setters_validate() {
        let mut dieta = dieta_oral();
        assert!(dieta.definir_numero_refeicoes(0).is_err());
        assert_eq!(dieta.numero_refeicoes(), 6);

        dieta.definir_numero_refeicoes(4).unwrap();
        dieta.definir_textura(Textura::Liquida);
        dieta.definir_tipo_refeicao(TipoRefeicao::Ceia);
        assert_eq!(dieta.numero_refeicoes(), 4);
        assert_eq!(dieta.textura(), Textura::Liquida);
        assert_eq!(dieta.tipo_refeicao(), TipoRefeicao::Ceia);
    }

    #[test]
    fn test_close_twice_conflicts() {
        let mut dieta = dieta_oral();
        dieta.encerrar_dieta().unwrap();
        assert!(!dieta.ativo());
        assert!(matches!(
            dieta.encerrar_dieta(),
            Err(Error::StateConflict(_))
        ));
    }
}
