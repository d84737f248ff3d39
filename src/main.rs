use clap::Parser;
use tokio::io::BufReader;
use vaheat::core::ConfigProvider;
use vaheat::utils::error::ErrorSeverity;
use vaheat::utils::{logger, validation::Validate};
use vaheat::{resolve, CliConfig, Repl, SerialConnector, TomlConfig, Vaheat, VaheatError};

fn exit_code(e: &VaheatError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: VaheatError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e).max(1));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入 TOML 配置
    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = TomlConfig::from_file(path).unwrap_or_else(|e| fail(e));
            if let Err(e) = config.validate() {
                fail(e);
            }
            config
        }
        None => TomlConfig::default(),
    };

    // 命令列參數優先於設定檔
    let layers: [&dyn ConfigProvider; 2] = [&cli, &file_config];
    let resolved = resolve(&layers).unwrap_or_else(|e| fail(e));

    let has_port = resolved.device.port.is_some();
    let device = Vaheat::new(SerialConnector, resolved.device);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut repl = Repl::new(device, stdin, std::io::stdout(), resolved.show_raw);

    if repl.announce_devices()? == 0 && !has_port {
        repl.shutdown().await?;
        std::process::exit(exit_code(&VaheatError::DeviceNotFound));
    }

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let code = match repl.run_until(interrupt).await {
        Ok(()) => 0,
        Err(e) => exit_code(&e).max(1),
    };

    // stdin 的讀取佔用阻塞執行緒，runtime 結束時會等它讀完，所以直接結束行程
    std::process::exit(code);
}
