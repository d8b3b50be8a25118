#![forbid(unsafe_code)]

//! Core domain model for the SNH hospital diet system.
//!
//! This crate provides:
//! - Menu items and closed clinical vocabularies
//! - The diet hierarchy (oral, enteral, parenteral, mixed) and its factory
//! - Clinical sector bed registry and patients
//! - Prescription lifecycle with change history
//! - Change notifications over pluggable delivery strategies

pub mod audit;
pub mod config;
pub mod diet;
pub mod diets;
pub mod error;
pub mod factory;
pub mod item;
pub mod logging;
pub mod notify;
pub mod prescription;
pub mod vocab;
pub mod ward;

// Re-export commonly used types
pub use audit::{Auditoria, StatusDieta, USUARIO_PADRAO};
pub use config::Config;
pub use diet::{compartilhar, Dieta, DietaHandle, DietaSimples, ResumoNutricional, TipoDieta};
pub use diets::{
    DietaEnteral, DietaMista, DietaOral, DietaParenteral, ParametrosEnteral, ParametrosOral,
    ParametrosParenteral,
};
pub use error::{Error, Result};
pub use factory::{DietFactory, ParametrosDieta};
pub use item::ItemCardapio;
pub use notify::{
    DispatchReport, EmailStrategy, EstrategiaNotificacao, LogStrategy, NotificationEvent,
    NotificationService, PushStrategy, TipoMudanca,
};
pub use prescription::{HistoricoAlteracao, Prescricao, ResumoPrescricao};
pub use vocab::{Textura, TipoAcesso, TipoEquipo, TipoRefeicao, ViaInfusao};
pub use ward::{DadosPaciente, Paciente, SetorClinico};
