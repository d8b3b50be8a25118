use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use snh_core::*;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "snh")]
#[command(about = "Hospital diet prescription system", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a diet through the factory and print its summary
    Dieta {
        /// Diet type (oral, enteral)
        tipo: String,

        /// Factory parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Admit a patient and open a prescription for it
    Prescricao {
        /// Patient name
        #[arg(long)]
        paciente: String,

        /// Clinical sector name
        #[arg(long)]
        setor: String,

        /// Bed number
        #[arg(long)]
        leito: u32,

        /// Diet type (oral, enteral)
        #[arg(long)]
        tipo: String,

        /// Factory parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Close the prescription right after opening it
        #[arg(long)]
        encerrar: bool,

        /// Responsible user (defaults to the configured user)
        #[arg(long)]
        usuario: Option<String>,
    },
}

fn parse_param(s: &str) -> std::result::Result<(String, String), String> {
    let (chave, valor) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let chave = chave.trim();
    if chave.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((chave.to_string(), valor.to_string()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    snh_core::logging::init_with_level(&config.logging.nivel);

    match cli.command {
        Commands::Dieta { tipo, params } => cmd_dieta(&tipo, params),
        Commands::Prescricao {
            paciente,
            setor,
            leito,
            tipo,
            params,
            encerrar,
            usuario,
        } => {
            let usuario = usuario.unwrap_or_else(|| config.auditoria.usuario_padrao.clone());
            cmd_prescricao(
                &config,
                &paciente,
                &setor,
                leito,
                &tipo,
                params,
                encerrar,
                &usuario,
            )
        }
    }
}

fn to_dados(params: Vec<(String, String)>) -> ParametrosDieta {
    params
        .into_iter()
        .map(|(chave, valor)| (chave, Value::String(valor)))
        .collect()
}

fn print_json(valor: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(valor)?);
    Ok(())
}

fn cmd_dieta(tipo: &str, params: Vec<(String, String)>) -> Result<()> {
    let handle = DietFactory::criar_dieta(tipo, &to_dados(params))?;
    let dieta = handle.borrow();

    print_json(&json!({
        "tipo": dieta.tipo(),
        "descricao": dieta.descricao(),
        "valida": dieta.validar_compatibilidade(),
        "nutrientes": dieta.calcular_nutrientes(),
    }))
}

#[allow(clippy::too_many_arguments)]
fn cmd_prescricao(
    config: &Config,
    paciente: &str,
    setor: &str,
    leito: u32,
    tipo: &str,
    params: Vec<(String, String)>,
    encerrar: bool,
    usuario: &str,
) -> Result<()> {
    let servico = Rc::new(config.notification_service()?);

    let mut setor = SetorClinico::new(setor)?;
    let paciente = Paciente::internar(
        DadosPaciente {
            nome: paciente.to_string(),
            data_nascimento: None,
            leito,
            data_internacao: Utc::now(),
            risco: false,
        },
        &mut setor,
    )?;

    let mut dados = to_dados(params);
    dados
        .entry("usuario_responsavel")
        .or_insert_with(|| Value::String(usuario.to_string()));
    let dieta = DietFactory::criar_dieta(tipo, &dados)?;

    let mut prescricao = Prescricao::new(Rc::clone(&paciente), dieta, servico, usuario)?;
    let mut envios = vec![json!({
        "evento": TipoMudanca::Criacao,
        "relatorio": prescricao.ultimo_envio(),
    })];

    if encerrar {
        let relatorio = prescricao.encerrar(usuario)?;
        envios.push(json!({
            "evento": TipoMudanca::Encerramento,
            "relatorio": relatorio,
        }));
    }

    tracing::debug!("Prescription {} ready for output", prescricao.id());
    print_json(&json!({
        "resumo": prescricao.obter_resumo(),
        "risco": paciente.risco(),
        "historico": prescricao.historico(),
        "envios": envios,
    }))
}
