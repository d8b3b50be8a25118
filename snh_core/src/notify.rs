//! Prescription change notifications.
//!
//! [`NotificationService`] keeps a registry of named channels, each pairing a
//! delivery strategy with its recipients, and fans every change event out to
//! all of them. Delivery failures are counted, never propagated.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use uuid::Uuid;

/// A delivery mechanism for one message to one recipient.
///
/// `Ok(false)` and `Err(_)` both count as a failed delivery. Report failures
/// through `Err`: a panic is not caught by [`NotificationService::dispatch`]
/// and unwinds through the caller's transition.
pub trait EstrategiaNotificacao: Debug {
    fn enviar(&self, mensagem: &str, destinatario: &str) -> Result<bool>;
}

/// Kind of lifecycle change carried by a [`NotificationEvent`]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TipoMudanca {
    Criacao,
    AlteracaoDieta,
    Encerramento,
}

impl TipoMudanca {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoMudanca::Criacao => "criacao",
            TipoMudanca::AlteracaoDieta => "alteracao_dieta",
            TipoMudanca::Encerramento => "encerramento",
        }
    }
}

impl fmt::Display for TipoMudanca {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prescription change to broadcast
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NotificationEvent {
    pub prescricao_id: Uuid,
    pub tipo_mudanca: TipoMudanca,
    pub detalhes: String,
    pub paciente: String,
    pub setor: String,
}

impl NotificationEvent {
    /// Text handed to every strategy
    pub fn mensagem(&self) -> String {
        format!(
            "[{}] Prescrição {} - Paciente {} ({}): {}",
            self.tipo_mudanca, self.prescricao_id, self.paciente, self.setor, self.detalhes
        )
    }
}

/// Outcome of one [`NotificationService::dispatch`] call
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub total_attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug)]
struct Canal {
    estrategia: Box<dyn EstrategiaNotificacao>,
    destinatarios: Vec<String>,
}

/// Registry of delivery channels keyed by normalized name
#[derive(Debug, Default)]
pub struct NotificationService {
    canais: BTreeMap<String, Canal>,
}

fn normalizar_canal(canal: &str) -> String {
    canal.trim().to_lowercase()
}

impl NotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a channel. Nothing changes on error.
    pub fn register<I, S>(
        &mut self,
        canal: &str,
        estrategia: Box<dyn EstrategiaNotificacao>,
        destinatarios: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nome = normalizar_canal(canal);
        if nome.is_empty() {
            return Err(Error::validation("Nome do canal não pode ser vazio"));
        }

        let destinatarios: Vec<String> = destinatarios
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .collect();
        if destinatarios.is_empty() {
            return Err(Error::validation(format!(
                "Canal '{}' precisa de ao menos um destinatário",
                nome
            )));
        }
        if destinatarios.iter().any(String::is_empty) {
            return Err(Error::validation(format!(
                "Destinatário inválido no canal '{}'",
                nome
            )));
        }

        tracing::info!(
            "Registered channel '{}' with {} recipient(s)",
            nome,
            destinatarios.len()
        );
        self.canais.insert(
            nome,
            Canal {
                estrategia,
                destinatarios,
            },
        );
        Ok(())
    }

    /// Remove a channel; returns whether it was registered
    pub fn unregister(&mut self, canal: &str) -> bool {
        let removido = self.canais.remove(&normalizar_canal(canal)).is_some();
        if removido {
            tracing::info!("Unregistered channel '{}'", canal.trim());
        }
        removido
    }

    /// Deliver `evento` to every recipient of every channel
    pub fn dispatch(&self, evento: &NotificationEvent) -> DispatchReport {
        let mensagem = evento.mensagem();
        let mut relatorio = DispatchReport::default();

        for (nome, canal) in &self.canais {
            for destinatario in &canal.destinatarios {
                relatorio.total_attempted += 1;
                match canal.estrategia.enviar(&mensagem, destinatario) {
                    Ok(true) => relatorio.succeeded += 1,
                    Ok(false) => {
                        relatorio.failed += 1;
                        tracing::warn!("Channel '{}' refused delivery to {}", nome, destinatario);
                    }
                    Err(e) => {
                        relatorio.failed += 1;
                        tracing::warn!("Channel '{}' failed for {}: {}", nome, destinatario, e);
                    }
                }
            }
        }

        tracing::info!(
            "Dispatched {} event for prescription {}: {}/{} delivered",
            evento.tipo_mudanca,
            evento.prescricao_id,
            relatorio.succeeded,
            relatorio.total_attempted
        );
        relatorio
    }

    /// Registered channel names, sorted
    pub fn canais_ativos(&self) -> Vec<String> {
        self.canais.keys().cloned().collect()
    }

    /// Recipients of `canal` (copy); empty for an unknown channel
    pub fn destinatarios(&self, canal: &str) -> Vec<String> {
        self.canais
            .get(&normalizar_canal(canal))
            .map(|c| c.destinatarios.clone())
            .unwrap_or_default()
    }

    pub fn total_canais(&self) -> usize {
        self.canais.len()
    }
}

/// E-mail delivery (logged; no SMTP transport)
#[derive(Debug, Default)]
pub struct EmailStrategy;

impl EstrategiaNotificacao for EmailStrategy {
    fn enviar(&self, mensagem: &str, destinatario: &str) -> Result<bool> {
        tracing::info!(target: "snh::email", "To {}: {}", destinatario, mensagem);
        Ok(true)
    }
}

/// Mobile push delivery (logged; no push gateway)
#[derive(Debug, Default)]
pub struct PushStrategy;

impl EstrategiaNotificacao for PushStrategy {
    fn enviar(&self, mensagem: &str, destinatario: &str) -> Result<bool> {
        tracing::info!(target: "snh::push", "Device {}: {}", destinatario, mensagem);
        Ok(true)
    }
}

#[derive(Debug, Default)]
pub struct LogStrategy;

impl EstrategiaNotificacao for LogStrategy {
    fn enviar(&self, mensagem: &str, destinatario: &str) -> Result<bool> {
        tracing::info!(target: "snh::notificacao", "[{}] {}", destinatario, mensagem);
        Ok(true)
    }
}

/// Labels accepted by [`estrategia_embutida`]
pub const ESTRATEGIAS_EMBUTIDAS: &[&str] = &["email", "push", "log"];

/// Built-in strategy for a label ("email", "push", "log")
pub fn estrategia_embutida(tipo: &str) -> Result<Box<dyn EstrategiaNotificacao>> {
    match tipo.trim().to_lowercase().as_str() {
        "email" => Ok(Box::new(EmailStrategy)),
        "push" => Ok(Box::new(PushStrategy)),
        "log" => Ok(Box::new(LogStrategy)),
        _ => Err(Error::TypeMismatch(format!(
            "Estratégia de notificação desconhecida: '{}'. Opções válidas: {}",
            tipo,
            ESTRATEGIAS_EMBUTIDAS.join(", ")
        ))),
    }
}
