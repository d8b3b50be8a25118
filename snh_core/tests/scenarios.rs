//! End-to-end scenarios across the diet, ward, prescription and
//! notification modules.

use chrono::Utc;
use serde_json::json;
use snh_core::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Counts calls; fails with an error for one recipient
#[derive(Debug, Default)]
struct FlakyGateway {
    chamadas: Rc<Cell<usize>>,
    quebrado: String,
}

impl EstrategiaNotificacao for FlakyGateway {
    fn enviar(&self, _mensagem: &str, destinatario: &str) -> Result<bool> {
        self.chamadas.set(self.chamadas.get() + 1);
        if destinatario == self.quebrado {
            return Err(Error::Delivery("connection reset".into()));
        }
        Ok(true)
    }
}

fn params(v: serde_json::Value) -> ParametrosDieta {
    v.as_object().cloned().unwrap()
}

fn oral_params() -> ParametrosDieta {
    params(json!({
        "textura": "pastosa",
        "numero_refeicoes": "6",
        "tipo_refeicao": "janta"
    }))
}

fn enteral_params() -> ParametrosDieta {
    params(json!({
        "setor_clinico": "UTI",
        "via_infusao": "gastrostomia",
        "velocidade_ml_h": "45",
        "quantidade_gramas_por_porcao": "250",
        "porcoes_diarias": "4",
        "tipo_equipo": "gravitacional"
    }))
}

fn admitir(setor: &mut SetorClinico, nome: &str, leito: u32) -> Result<Rc<Paciente>> {
    Paciente::internar(
        DadosPaciente {
            nome: nome.into(),
            data_nascimento: None,
            leito,
            data_internacao: Utc::now(),
            risco: false,
        },
        setor,
    )
}

#[test]
fn test_prescription_full_lifecycle() {
    let chamadas = Rc::new(Cell::new(0));
    let mut servico = NotificationService::new();
    servico
        .register("email", Box::new(EmailStrategy), ["nutricao@hospital.org"])
        .unwrap();
    servico
        .register(
            "push",
            Box::new(FlakyGateway {
                chamadas: Rc::clone(&chamadas),
                quebrado: "tablet-2".into(),
            }),
            ["tablet-1", "tablet-2"],
        )
        .unwrap();
    let servico = Rc::new(servico);

    let mut uti = SetorClinico::new("UTI").unwrap();
    let maria = admitir(&mut uti, "Maria", 1).unwrap();
    assert!(maria.risco());

    let oral = DietFactory::criar_dieta("oral", &oral_params()).unwrap();
    let mut prescricao = Prescricao::new(maria, Rc::clone(&oral), Rc::clone(&servico), "Dr. Silva").unwrap();
    assert_eq!(
        prescricao.ultimo_envio(),
        DispatchReport {
            total_attempted: 3,
            succeeded: 2,
            failed: 1
        }
    );

    let enteral = DietFactory::criar_dieta("enteral", &enteral_params()).unwrap();
    let relatorio = prescricao.alterar_dieta(enteral, "Nutri Ana").unwrap();
    assert_eq!(relatorio.failed, 1);

    let relatorio = prescricao.encerrar("Dr. Silva").unwrap();
    assert_eq!(relatorio.total_attempted, 3);
    assert_eq!(chamadas.get(), 6);

    assert!(!prescricao.ativa());
    assert!(!prescricao.dieta().borrow().ativo());
    // The replaced diet is left untouched
    assert!(oral.borrow().ativo());

    let tipos: Vec<TipoMudanca> = prescricao
        .historico()
        .iter()
        .map(|h| h.tipo_alteracao())
        .collect();
    assert_eq!(
        tipos,
        vec![
            TipoMudanca::Criacao,
            TipoMudanca::AlteracaoDieta,
            TipoMudanca::Encerramento
        ]
    );

    let resumo = prescricao.obter_resumo();
    assert_eq!(resumo.tipo_dieta, TipoDieta::Enteral);
    assert_eq!(resumo.total_alteracoes, 3);
    assert!(!resumo.ativa);
}

#[test]
fn test_closed_prescription_rejects_everything() {
    let mut setor = SetorClinico::new("Enfermaria").unwrap();
    let paciente = admitir(&mut setor, "João", 2).unwrap();
    let original = DietFactory::criar_dieta("oral", &oral_params()).unwrap();
    let mut prescricao = Prescricao::new(
        paciente,
        Rc::clone(&original),
        Rc::new(NotificationService::new()),
        "",
    )
    .unwrap();

    prescricao.encerrar("").unwrap();
    let tamanho = prescricao.historico().len();

    assert!(matches!(prescricao.encerrar(""), Err(Error::StateConflict(_))));
    let nova = DietFactory::criar_dieta("enteral", &enteral_params()).unwrap();
    assert!(matches!(
        prescricao.alterar_dieta(nova, ""),
        Err(Error::StateConflict(_))
    ));

    assert_eq!(prescricao.historico().len(), tamanho);
    assert!(Rc::ptr_eq(&prescricao.dieta(), &original));
}

#[test]
fn test_bed_conflict_keeps_first_patient() {
    let mut setor = SetorClinico::new("Enfermaria").unwrap();
    admitir(&mut setor, "Maria", 1).unwrap();

    let err = admitir(&mut setor, "Pedro", 1).unwrap_err();
    assert_eq!(err.to_string(), "Leito 1 já ocupado por Maria.");
    assert_eq!(setor.paciente_no_leito(1).unwrap().nome(), "Maria");
    assert_eq!(setor.leitos_ocupados().len(), 1);
}

#[test]
fn test_mixed_diet_from_factory_components() {
    let oral = Rc::new(RefCell::new(
        DietFactory::criar_oral(&oral_params()).unwrap(),
    ));
    let enteral = Rc::new(RefCell::new(
        DietFactory::criar_enteral(&enteral_params()).unwrap(),
    ));

    let mut mista = DietaMista::new("", "Nutri Ana");
    mista.adicionar_componente(Rc::clone(&oral), 40.0).unwrap();
    mista.adicionar_componente(Rc::clone(&enteral), 50.0).unwrap();
    assert!(!mista.validar_compatibilidade());

    mista.atualizar_percentual(&enteral, 62.0).unwrap();
    assert!(mista.validar_compatibilidade());
    assert_eq!(mista.obter_resumo(), "Dieta Mista: Oral (40%) + Enteral (62%)");

    // A composite can never be one of its own kind's components
    let outra: DietaHandle = compartilhar(DietaMista::new("", ""));
    assert!(matches!(
        mista.adicionar_componente_handle(outra, 10.0),
        Err(Error::TypeMismatch(_))
    ));

    let json = serde_json::to_value(mista.calcular_nutrientes()).unwrap();
    assert_eq!(json["tipo_dieta"], "Mista");
    assert_eq!(json["esta_valida"], true);
    assert_eq!(json["componentes"][1]["nutrientes"]["tipo_dieta"], "Enteral");
    assert_eq!(json["componentes"][1]["nutrientes"]["total_gramas_diarias"], 1000.0);
}

#[test]
fn test_forbidden_restriction_blocks_item() {
    let mut oral = DietFactory::criar_oral(&oral_params()).unwrap();
    oral.adicionar_restricao_proibida("lactose").unwrap();

    let iogurte = ItemCardapio::with_restricoes("Iogurte", 170.0, ["Lactose"]).unwrap();
    assert!(oral.adicionar_item(iogurte).is_err());
    assert_eq!(oral.itens().len(), 0);

    let arroz = ItemCardapio::new("Arroz", 100.0).unwrap();
    assert_eq!(arroz, ItemCardapio::new("Arroz", 999.0).unwrap());
    oral.adicionar_item(arroz).unwrap();
    assert_eq!(oral.itens().len(), 1);
}
