//! 命令行前端
//!
//! 扮演"界面"的角色：持有取消标志，在自己的任务里消费运行事件

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::browser::{launch_login_browser, BrowserSession, ChromeConnector};
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::logger;
use crate::models::{format_amount, RunState};
use crate::orchestrator::{lookup_detail, BatchProcessor};
use crate::workflow::{ChannelObserver, RunEvent, RunObserver};

const HELP: &str = "\
Uso: despachos <comando> [opciones]

Comandos:
  login                 Abre Chrome con el perfil ml_profile para iniciar sesion
  procesar <archivo>    Procesa el Excel (hoja 'Reporte') y guarda <archivo>_con_envios.xlsx
  detalle <codigo>      Lee Envios / Bonificaciones de una venta

Opciones:
  --port <n>            Puerto de depuracion de Chrome (tambien BROWSER_DEBUG_PORT)
  --config <archivo>    Archivo de configuracion TOML
  --verbose             Log detallado
  -h, --help            Muestra esta ayuda";

/// 子命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Process(Option<PathBuf>),
    Detail(String),
    Help,
}

/// 解析后的命令行参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// 解析命令行参数（不含程序名）
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> AppResult<CliArgs> {
    let invalid = |msg: String| AppError::Config(ConfigError::InvalidArgument(msg));

    let mut command = None;
    let mut positional: Option<String> = None;
    let mut port = None;
    let mut config = None;
    let mut verbose = false;

    let mut args = args.into_iter();
    while let Some(a) = args.next() {
        match a.as_str() {
            "--port" => {
                let v = args.next().ok_or_else(|| invalid("falta valor para --port".into()))?;
                port = Some(
                    v.parse::<u16>()
                        .map_err(|_| invalid(format!("puerto invalido: {}", v)))?,
                );
            }
            "--config" => {
                let v = args
                    .next()
                    .ok_or_else(|| invalid("falta valor para --config".into()))?;
                config = Some(PathBuf::from(v));
            }
            "--verbose" | "-v" => verbose = true,
            "-h" | "--help" => command = Some("help".to_string()),
            flag if flag.starts_with('-') => {
                return Err(invalid(format!("opcion desconocida: {}", flag)))
            }
            _ if command.is_none() => command = Some(a),
            _ if positional.is_none() => positional = Some(a),
            _ => return Err(invalid(format!("argumento de sobra: {}", a))),
        }
    }

    let command = match command.as_deref() {
        None | Some("help") => Command::Help,
        Some("login") => Command::Login,
        Some("procesar") => Command::Process(positional.map(PathBuf::from)),
        Some("detalle") => Command::Detail(positional.unwrap_or_default()),
        Some(other) => return Err(invalid(format!("comando desconocido: {}", other))),
    };

    Ok(CliArgs {
        command,
        port,
        config,
        verbose,
    })
}

/// 执行命令
pub async fn run(args: CliArgs) -> Result<()> {
    if args.command == Command::Help {
        eprintln!("{}", HELP);
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref()).context("无法加载配置")?;
    if args.port.is_some() {
        config.browser_debug_port = args.port;
    }
    config.verbose_logging |= args.verbose;

    logger::init_with(&config).context("无法初始化日志")?;
    logger::log_startup(&config);

    let session = config.browser_debug_port.map(BrowserSession::attach);

    match args.command {
        Command::Login => login(&config).await,
        Command::Process(path) => process(&config, path, session).await,
        Command::Detail(code) => detail(&config, &code, session).await,
        Command::Help => Ok(()),
    }
}

async fn login(config: &Config) -> Result<()> {
    let login = launch_login_browser(config)
        .await
        .map_err(|e| anyhow::anyhow!(e.status_message()))?;
    if !login.ready {
        bail!("No se pudo confirmar el puerto de depuracion. Reintenta.");
    }
    info!(
        "Inicia sesion en la ventana de Chrome y luego ejecuta: despachos procesar <archivo> --port {}",
        login.session.port()
    );
    Ok(())
}

async fn process(
    config: &Config,
    path: Option<PathBuf>,
    session: Option<BrowserSession>,
) -> Result<()> {
    let (observer, rx) = ChannelObserver::new();
    let renderer = spawn_renderer(rx);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        let observer = observer.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() && !cancel.is_cancelled() {
                cancel.cancel();
                observer.on_status("Cancelando proceso...");
            }
        })
    };

    let connector = ChromeConnector::new(config);
    let processor = BatchProcessor::new(config, &connector, &observer, cancel);
    let outcome = processor.start(path.as_deref(), session.as_ref()).await;

    ctrl_c.abort();
    drop(processor);
    drop(observer);
    let _ = renderer.await;

    match outcome {
        None => {
            eprintln!("{}", HELP);
            Ok(())
        }
        Some(outcome) if outcome.state == RunState::Failed => bail!(outcome.message),
        Some(_) => Ok(()),
    }
}

async fn detail(config: &Config, code: &str, session: Option<BrowserSession>) -> Result<()> {
    let connector = ChromeConnector::new(config);
    match lookup_detail(config, &connector, session.as_ref(), code).await {
        Ok(amount) => {
            info!("[{}] Envíos: {}", code.trim(), format_amount(amount));
            Ok(())
        }
        Err(e) => bail!(e.status_message()),
    }
}

/// 在独立任务里渲染事件（界面自己的执行上下文）
fn spawn_renderer(mut rx: UnboundedReceiver<RunEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Progress { done, total } => info!("Progreso: {}/{}", done, total),
                RunEvent::Status(message) => info!("{}", message),
                RunEvent::Finished { cancelled, started } => {
                    if !started {
                        info!("Listo para procesar.");
                    } else if cancelled {
                        warn!("Proceso cancelado.");
                    }
                }
            }
        }
    })
}
