//! Clinical sector bed registry and admitted patients.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Sector whose patients are always flagged as at risk
pub const SETOR_RISCO: &str = "UTI";

/// A hospital ward acting as the bed registry
#[derive(Debug)]
pub struct SetorClinico {
    nome: String,
    leitos: BTreeMap<u32, Rc<Paciente>>,
}

impl SetorClinico {
    pub fn new(nome: &str) -> Result<Self> {
        let nome = nome.trim();
        if nome.is_empty() {
            return Err(Error::validation("Nome do setor não pode ser vazio"));
        }
        Ok(Self {
            nome: nome.to_string(),
            leitos: BTreeMap::new(),
        })
    }

    pub fn nome(&self) -> &str {
        &self.nome
    }

    /// Place `paciente` in bed `leito`. An occupied bed keeps its occupant
    /// and yields [`Error::BedOccupied`].
    pub fn adicionar_paciente(&mut self, paciente: Rc<Paciente>, leito: u32) -> Result<()> {
        if leito == 0 {
            return Err(Error::validation(format!(
                "Leito deve ser inteiro positivo, recebido: {}",
                leito
            )));
        }
        if let Some(ocupante) = self.leitos.get(&leito) {
            tracing::warn!("Bed {} in '{}' already taken", leito, self.nome);
            return Err(Error::BedOccupied {
                bed: leito,
                occupant: ocupante.nome().to_string(),
            });
        }
        tracing::debug!("Bed {} in '{}' assigned to {}", leito, self.nome, paciente.nome());
        self.leitos.insert(leito, paciente);
        Ok(())
    }

    /// Free a bed, returning the patient that occupied it
    pub fn liberar_leito(&mut self, leito: u32) -> Option<Rc<Paciente>> {
        self.leitos.remove(&leito)
    }

    pub fn paciente_no_leito(&self, leito: u32) -> Option<Rc<Paciente>> {
        self.leitos.get(&leito).cloned()
    }

    /// Bed number to occupant name (independent copy)
    pub fn leitos_ocupados(&self) -> BTreeMap<u32, String> {
        self.leitos
            .iter()
            .map(|(leito, paciente)| (*leito, paciente.nome().to_string()))
            .collect()
    }

    pub fn quantidade_pacientes(&self) -> usize {
        self.leitos.len()
    }

    fn eh_setor_de_risco(&self) -> bool {
        self.nome.eq_ignore_ascii_case(SETOR_RISCO)
    }
}

/// Admission data for [`Paciente::internar`]
#[derive(Clone, Debug)]
pub struct DadosPaciente {
    pub nome: String,
    pub data_nascimento: Option<NaiveDate>,
    pub leito: u32,
    pub data_internacao: DateTime<Utc>,
    pub risco: bool,
}

#[derive(Debug)]
pub struct Paciente {
    nome: String,
    data_nascimento: Option<NaiveDate>,
    setor_nome: String,
    leito: u32,
    data_internacao: DateTime<Utc>,
    risco: bool,
}

impl Paciente {
    /// Admit a patient into `setor`, registering its bed.
    ///
    /// Nothing is registered when validation fails, and an occupancy
    /// conflict is returned unchanged.
    pub fn internar(dados: DadosPaciente, setor: &mut SetorClinico) -> Result<Rc<Paciente>> {
        let nome = dados.nome.trim();
        if nome.is_empty() {
            return Err(Error::validation("Nome do paciente não pode ser vazio"));
        }

        let paciente = Rc::new(Paciente {
            nome: nome.to_string(),
            data_nascimento: dados.data_nascimento,
            setor_nome: setor.nome().to_string(),
            leito: dados.leito,
            data_internacao: dados.data_internacao,
            risco: dados.risco || setor.eh_setor_de_risco(),
        });
        setor.adicionar_paciente(Rc::clone(&paciente), dados.leito)?;

        tracing::info!(
            "Admitted {} to '{}' bed {}",
            paciente.nome,
            paciente.setor_nome,
            paciente.leito
        );
        Ok(paciente)
    }

    pub fn nome(&self) -> &str {
        &self.nome
    }

    /// Move this patient from `origem` to bed `novo_leito` in `destino`.
    ///
    /// Returns the patient as registered in `destino`; its risk flag is
    /// re-derived from the destination sector. On error neither registry
    /// changes.
    pub fn transferir(
        &self,
        origem: &mut SetorClinico,
        destino: &mut SetorClinico,
        novo_leito: u32,
    ) -> Result<Rc<Paciente>> {
        let registrado = origem
            .leitos
            .get(&self.leito)
            .is_some_and(|ocupante| std::ptr::eq(Rc::as_ptr(ocupante), self));
        if !registrado {
            return Err(Error::validation(format!(
                "Paciente {} não está no leito {} de {}",
                self.nome,
                self.leito,
                origem.nome()
            )));
        }

        let transferido = Rc::new(Paciente {
            nome: self.nome.clone(),
            data_nascimento: self.data_nascimento,
            setor_nome: destino.nome().to_string(),
            leito: novo_leito,
            data_internacao: self.data_internacao,
            risco: destino.eh_setor_de_risco(),
        });
        destino.adicionar_paciente(Rc::clone(&transferido), novo_leito)?;
        origem.liberar_leito(self.leito);

        tracing::info!(
            "Transferred {} from '{}' bed {} to '{}' bed {}",
            self.nome,
            self.setor_nome,
            self.leito,
            transferido.setor_nome,
            novo_leito
        );
        Ok(transferido)
    }

    pub fn data_nascimento(&self) -> Option<NaiveDate> {
        self.data_nascimento
    }

    pub fn setor_nome(&self) -> &str {
        &self.setor_nome
    }

    pub fn leito(&self) -> u32 {
        self.leito
    }

    pub fn data_internacao(&self) -> DateTime<Utc> {
        self.data_internacao
    }

    pub fn risco(&self) -> bool {
        self.risco
    }

    /// Whole days since admission
    pub fn dias_internado(&self) -> i64 {
        (Utc::now() - self.data_internacao).num_days()
    }
}

impl fmt::Display for Paciente {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} (Leito {})", self.nome, self.setor_nome, self.leito)
    }
}
