//! Prescriptions: a patient, the diet currently prescribed and an
//! append-only change history.
//!
//! A prescription starts active and is closed exactly once. Every
//! transition is recorded in the history and broadcast through the shared
//! [`NotificationService`].

use crate::audit::{normalizar_usuario, Auditoria};
use crate::diet::{DietaHandle, TipoDieta};
use crate::notify::{DispatchReport, NotificationEvent, NotificationService, TipoMudanca};
use crate::ward::Paciente;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use uuid::Uuid;

/// One immutable history record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoricoAlteracao {
    data_hora: DateTime<Utc>,
    tipo_alteracao: TipoMudanca,
    descricao: String,
    usuario: String,
}

impl HistoricoAlteracao {
    fn new(tipo_alteracao: TipoMudanca, descricao: String, usuario: &str) -> Self {
        Self {
            data_hora: Utc::now(),
            tipo_alteracao,
            descricao,
            usuario: normalizar_usuario(usuario),
        }
    }

    pub fn data_hora(&self) -> DateTime<Utc> {
        self.data_hora
    }

    pub fn tipo_alteracao(&self) -> TipoMudanca {
        self.tipo_alteracao
    }

    pub fn descricao(&self) -> &str {
        &self.descricao
    }

    pub fn usuario(&self) -> &str {
        &self.usuario
    }
}

/// Read-only projection returned by [`Prescricao::obter_resumo`]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResumoPrescricao {
    pub id: Uuid,
    pub paciente: String,
    pub setor: String,
    pub tipo_dieta: TipoDieta,
    pub ativa: bool,
    pub total_alteracoes: usize,
    pub criado_em: DateTime<Utc>,
    pub usuario_responsavel: String,
}

#[derive(Debug)]
pub struct Prescricao {
    id: Uuid,
    paciente: Rc<Paciente>,
    dieta: DietaHandle,
    tipo_dieta: TipoDieta,
    notificador: Rc<NotificationService>,
    historico: Vec<HistoricoAlteracao>,
    ativa: bool,
    auditoria: Auditoria,
    ultimo_envio: DispatchReport,
}

/// Kind of the diet behind a handle; an unreadable handle is a type mismatch
fn tipo_de(dieta: &DietaHandle) -> Result<TipoDieta> {
    dieta
        .try_borrow()
        .map(|d| d.tipo())
        .map_err(|_| Error::TypeMismatch("Dieta indisponível: referência em uso".into()))
}

impl Prescricao {
    /// Open a prescription and notify every registered channel
    pub fn new(
        paciente: Rc<Paciente>,
        dieta: DietaHandle,
        notificador: Rc<NotificationService>,
        usuario: &str,
    ) -> Result<Self> {
        let tipo_dieta = tipo_de(&dieta)?;

        let mut prescricao = Self {
            id: Uuid::new_v4(),
            paciente,
            dieta,
            tipo_dieta,
            notificador,
            historico: Vec::new(),
            ativa: true,
            auditoria: Auditoria::new(usuario),
            ultimo_envio: DispatchReport::default(),
        };

        let detalhes = format!("Prescrição criada com dieta {}", tipo_dieta);
        prescricao.registrar(TipoMudanca::Criacao, detalhes.clone(), usuario);
        prescricao.notificar(TipoMudanca::Criacao, detalhes);

        tracing::info!(
            "Opened prescription {} for {} ({} diet)",
            prescricao.id,
            prescricao.paciente.nome(),
            tipo_dieta
        );
        Ok(prescricao)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn paciente(&self) -> &Rc<Paciente> {
        &self.paciente
    }

    /// Shared handle to the current diet
    pub fn dieta(&self) -> DietaHandle {
        Rc::clone(&self.dieta)
    }

    pub fn ativa(&self) -> bool {
        self.ativa
    }

    pub fn auditoria(&self) -> &Auditoria {
        &self.auditoria
    }

    /// History records, oldest first (independent copy)
    pub fn historico(&self) -> Vec<HistoricoAlteracao> {
        self.historico.clone()
    }

    /// Report of the most recent notification round
    pub fn ultimo_envio(&self) -> DispatchReport {
        self.ultimo_envio
    }

    /// Swap the prescribed diet.
    ///
    /// Fails without touching history or the current diet when the
    /// prescription is closed or the new diet cannot be read.
    pub fn alterar_dieta(&mut self, nova_dieta: DietaHandle, usuario: &str) -> Result<DispatchReport> {
        if !self.ativa {
            return Err(Error::state("Não é possível alterar dieta de prescrição encerrada"));
        }
        let tipo_novo = tipo_de(&nova_dieta)?;
        let tipo_antigo = self.tipo_dieta;

        let detalhes = format!("Dieta alterada de {} para {}", tipo_antigo, tipo_novo);
        self.registrar(TipoMudanca::AlteracaoDieta, detalhes.clone(), usuario);
        self.dieta = nova_dieta;
        self.tipo_dieta = tipo_novo;

        tracing::info!(
            "Prescription {} diet changed: {} -> {}",
            self.id,
            tipo_antigo,
            tipo_novo
        );
        let relatorio = self.notificar(TipoMudanca::AlteracaoDieta, detalhes);
        self.auditoria.registrar_atualizacao();
        Ok(relatorio)
    }

    /// Close the prescription and its diet.
    ///
    /// The prescription is marked closed and the record appended before the
    /// diet is closed; if the diet was already closed that error is returned
    /// and the prescription stays closed.
    pub fn encerrar(&mut self, usuario: &str) -> Result<DispatchReport> {
        if !self.ativa {
            return Err(Error::state("Prescrição já está encerrada"));
        }

        self.ativa = false;
        let detalhes = format!("Prescrição encerrada (dieta {})", self.tipo_dieta);
        self.registrar(TipoMudanca::Encerramento, detalhes.clone(), usuario);

        self.dieta
            .try_borrow_mut()
            .map_err(|_| Error::state("Dieta em uso, não foi possível encerrá-la"))?
            .encerrar_dieta()?;

        tracing::info!("Closed prescription {}", self.id);
        let relatorio = self.notificar(TipoMudanca::Encerramento, detalhes);
        self.auditoria.registrar_atualizacao();
        Ok(relatorio)
    }

    pub fn obter_resumo(&self) -> ResumoPrescricao {
        ResumoPrescricao {
            id: self.id,
            paciente: self.paciente.nome().to_string(),
            setor: self.paciente.setor_nome().to_string(),
            tipo_dieta: self.tipo_dieta,
            ativa: self.ativa,
            total_alteracoes: self.historico.len(),
            criado_em: self.auditoria.criado_em(),
            usuario_responsavel: self.auditoria.usuario_responsavel().to_string(),
        }
    }

    fn registrar(&mut self, tipo: TipoMudanca, descricao: String, usuario: &str) {
        self.historico
            .push(HistoricoAlteracao::new(tipo, descricao, usuario));
    }

    fn notificar(&mut self, tipo_mudanca: TipoMudanca, detalhes: String) -> DispatchReport {
        let evento = NotificationEvent {
            prescricao_id: self.id,
            tipo_mudanca,
            detalhes,
            paciente: self.paciente.nome().to_string(),
            setor: self.paciente.setor_nome().to_string(),
        };
        self.ultimo_envio = self.notificador.dispatch(&evento);
        self.ultimo_envio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::compartilhar;
    use crate::diets::{DietaEnteral, DietaOral, ParametrosEnteral, ParametrosOral};
    use crate::notify::EstrategiaNotificacao;
    use crate::vocab::{Textura, TipoEquipo, TipoRefeicao, ViaInfusao};
    use crate::ward::{DadosPaciente, SetorClinico};
    use std::cell::RefCell;
    use std::thread::sleep;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct Caixa {
        mensagens: Rc<RefCell<Vec<String>>>,
    }

    impl EstrategiaNotificacao for Caixa {
        fn enviar(&self, mensagem: &str, _destinatario: &str) -> Result<bool> {
            self.mensagens.borrow_mut().push(mensagem.to_string());
            Ok(true)
        }
    }

    fn paciente() -> Rc<Paciente> {
        let mut setor = SetorClinico::new("UTI").unwrap();
        Paciente::internar(
            DadosPaciente {
                nome: "Maria".into(),
                data_nascimento: None,
                leito: 1,
                data_internacao: Utc::now(),
                risco: false,
            },
            &mut setor,
        )
        .unwrap()
    }

    fn oral() -> DietaHandle {
        compartilhar(
            DietaOral::new(ParametrosOral {
                textura: Textura::Mole,
                numero_refeicoes: 5,
                tipo_refeicao: TipoRefeicao::Almoco,
                descricao: String::new(),
                usuario_responsavel: String::new(),
            })
            .unwrap(),
        )
    }

    fn enteral() -> DietaHandle {
        compartilhar(
            DietaEnteral::new(ParametrosEnteral {
                setor_clinico: "UTI".into(),
                via_infusao: ViaInfusao::Sng,
                velocidade_ml_h: 50.0,
                quantidade_gramas_por_porcao: 100.0,
                porcoes_diarias: 3,
                tipo_equipo: TipoEquipo::Bomba,
                descricao: String::new(),
                usuario_responsavel: String::new(),
            })
            .unwrap(),
        )
    }

    fn servico() -> (Rc<NotificationService>, Rc<RefCell<Vec<String>>>) {
        let mensagens = Rc::new(RefCell::new(Vec::new()));
        let mut servico = NotificationService::new();
        servico
            .register(
                "caixa",
                Box::new(Caixa {
                    mensagens: Rc::clone(&mensagens),
                }),
                ["enfermagem"],
            )
            .unwrap();
        (Rc::new(servico), mensagens)
    }

    #[test]
    fn test_creation_records_and_notifies() {
        crate::logging::init_test();
        let (servico, mensagens) = servico();
        let p = Prescricao::new(paciente(), oral(), servico, "  ").unwrap();

        assert!(p.ativa());
        let historico = p.historico();
        assert_eq!(historico.len(), 1);
        assert_eq!(historico[0].tipo_alteracao(), TipoMudanca::Criacao);
        assert_eq!(historico[0].usuario(), "sistema");
        assert_eq!(p.ultimo_envio().succeeded, 1);
        assert!(mensagens.borrow()[0].starts_with("[criacao]"));
    }

    #[test]
    fn test_change_diet_swaps_and_records() {
        let (servico, mensagens) = servico();
        let mut p = Prescricao::new(paciente(), oral(), servico, "Dr. Silva").unwrap();
        let nova = enteral();

        let relatorio = p.alterar_dieta(Rc::clone(&nova), "Nutri Ana").unwrap();

        assert_eq!(relatorio.succeeded, 1);
        assert!(Rc::ptr_eq(&p.dieta(), &nova));
        let ultimo = p.historico().pop().unwrap();
        assert_eq!(ultimo.tipo_alteracao(), TipoMudanca::AlteracaoDieta);
        assert_eq!(ultimo.descricao(), "Dieta alterada de Oral para Enteral");
        assert_eq!(ultimo.usuario(), "Nutri Ana");
        assert_eq!(p.obter_resumo().tipo_dieta, TipoDieta::Enteral);
        assert!(mensagens.borrow()[1].contains("Dieta alterada de Oral para Enteral"));
    }

    #[test]
    fn test_close_twice_keeps_history_length() {
        let (servico, _) = servico();
        let mut p = Prescricao::new(paciente(), oral(), servico, "Dr. Silva").unwrap();
        p.encerrar("Dr. Silva").unwrap();
        assert!(!p.ativa());
        assert!(!p.dieta().borrow().ativo());

        let antes = p.historico().len();
        let err = p.encerrar("Dr. Silva").unwrap_err();
        assert!(matches!(err, Error::StateConflict(_)));
        assert_eq!(p.historico().len(), antes);
    }

    #[test]
    fn test_change_after_close_keeps_diet() {
        let (servico, _) = servico();
        let original = oral();
        let mut p = Prescricao::new(paciente(), Rc::clone(&original), servico, "").unwrap();
        p.encerrar("").unwrap();
        let antes = p.historico().len();

        let err = p.alterar_dieta(enteral(), "").unwrap_err();
        assert!(matches!(err, Error::StateConflict(_)));
        assert!(Rc::ptr_eq(&p.dieta(), &original));
        assert_eq!(p.historico().len(), antes);
    }

    #[test]
    fn test_transitions_touch_audit_timestamp() {
        let (servico, _) = servico();
        let mut p = Prescricao::new(paciente(), oral(), servico, "Dr. Silva").unwrap();
        let criado = p.auditoria().criado_em();
        assert_eq!(p.auditoria().atualizado_em(), criado);

        sleep(Duration::from_millis(5));
        p.alterar_dieta(enteral(), "Nutri Ana").unwrap();
        let apos_troca = p.auditoria().atualizado_em();
        assert!(apos_troca > criado);

        sleep(Duration::from_millis(5));
        p.encerrar("Dr. Silva").unwrap();
        let apos_encerrar = p.auditoria().atualizado_em();
        assert!(apos_encerrar > apos_troca);

        sleep(Duration::from_millis(5));
        assert!(p.alterar_dieta(oral(), "").is_err());
        assert_eq!(p.auditoria().atualizado_em(), apos_encerrar);
        assert_eq!(p.auditoria().criado_em(), criado);
        assert_eq!(p.obter_resumo().criado_em, criado);
    }

    #[test]
    fn test_closing_with_closed_diet_propagates() {
        let (servico, mensagens) = servico();
        let dieta = oral();
        let mut p = Prescricao::new(paciente(), Rc::clone(&dieta), servico, "").unwrap();
        dieta.borrow_mut().encerrar_dieta().unwrap();

        let err = p.encerrar("Dr. Silva").unwrap_err();
        assert!(matches!(err, Error::StateConflict(_)));
        assert!(!p.ativa());
        assert_eq!(p.historico().len(), 2);
        assert_eq!(mensagens.borrow().len(), 1);
    }

    #[test]
    fn test_unreadable_diet_rejected_without_effect() {
        let (servico, _) = servico();
        let mut p = Prescricao::new(paciente(), oral(), servico, "").unwrap();
        let nova = enteral();
        let _guarda = nova.borrow_mut();

        let err = p.alterar_dieta(Rc::clone(&nova), "").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
        assert_eq!(p.historico().len(), 1);
        assert_eq!(p.obter_resumo().tipo_dieta, TipoDieta::Oral);
    }

    #[test]
    fn test_summary_projection() {
        let (servico, _) = servico();
        let p = Prescricao::new(paciente(), oral(), servico, "Dr. Silva").unwrap();
        let resumo = p.obter_resumo();

        assert_eq!(resumo.id, p.id());
        assert_eq!(resumo.paciente, "Maria");
        assert_eq!(resumo.setor, "UTI");
        assert_eq!(resumo.tipo_dieta, TipoDieta::Oral);
        assert!(resumo.ativa);
        assert_eq!(resumo.total_alteracoes, 1);
        assert_eq!(resumo.usuario_responsavel, "Dr. Silva");

        let json = serde_json::to_value(&resumo).unwrap();
        assert_eq!(json["tipo_dieta"], "Oral");
    }

    #[test]
    fn test_history_is_a_copy() {
        let (servico, _) = servico();
        let p = Prescricao::new(paciente(), oral(), servico, "").unwrap();
        let mut copia = p.historico();
        copia.clear();
        assert_eq!(p.historico().len(), 1);
    }
}
