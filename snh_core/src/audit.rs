//! Audit and lifecycle-status blocks embedded in every diet.
//!
//! The two blocks are independent values; each concrete diet owns one of each
//! through its [`DietaBase`](crate::diet::DietaBase).

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default responsible user when none (or a blank one) is given
pub const USUARIO_PADRAO: &str = "sistema";

/// Fall back to [`USUARIO_PADRAO`] for blank user names
pub(crate) fn normalizar_usuario(usuario: &str) -> String {
    let usuario = usuario.trim();
    if usuario.is_empty() {
        USUARIO_PADRAO.to_string()
    } else {
        usuario.to_string()
    }
}

/// Creation/update tracking
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Auditoria {
    criado_em: DateTime<Utc>,
    atualizado_em: DateTime<Utc>,
    usuario_responsavel: String,
}

impl Auditoria {
    pub fn new(usuario_responsavel: &str) -> Self {
        let agora = Utc::now();
        Self {
            criado_em: agora,
            atualizado_em: agora,
            usuario_responsavel: normalizar_usuario(usuario_responsavel),
        }
    }

    pub fn criado_em(&self) -> DateTime<Utc> {
        self.criado_em
    }

    pub fn atualizado_em(&self) -> DateTime<Utc> {
        self.atualizado_em
    }

    pub fn usuario_responsavel(&self) -> &str {
        &self.usuario_responsavel
    }

    /// Touch `atualizado_em`
    pub fn registrar_atualizacao(&mut self) {
        self.atualizado_em = Utc::now();
    }
}

/// Active/closed status of a diet
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusDieta {
    ativo: bool,
    data_inicio: DateTime<Utc>,
    data_fim: Option<DateTime<Utc>>,
}

impl Default for StatusDieta {
    fn default() -> Self {
        Self {
            ativo: true,
            data_inicio: Utc::now(),
            data_fim: None,
        }
    }
}

impl StatusDieta {
    pub fn ativo(&self) -> bool {
        self.ativo
    }

    pub fn data_inicio(&self) -> DateTime<Utc> {
        self.data_inicio
    }

    pub fn data_fim(&self) -> Option<DateTime<Utc>> {
        self.data_fim
    }

    /// Close the diet. A closed diet cannot be closed again.
    pub fn encerrar(&mut self) -> Result<()> {
        if !self.ativo {
            return Err(Error::state("Dieta já foi encerrada"));
        }
        self.ativo = false;
        self.data_fim = Some(Utc::now());
        Ok(())
    }
}
