use anyhow::Result;
use clap::Parser;

use tailguard_core::TailguardConfig;
use tailguard_daemon::cli::DaemonCli;
use tailguard_daemon::logging::init_tracing;
use tailguard_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 파일 -> 환경변수 -> CLI 순서로 오버라이드
    let mut config = TailguardConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    init_tracing(&config.general)?;

    let orchestrator = Orchestrator::build_from_config(config, cli.dry_run).await?;

    if cli.once {
        let run = orchestrator.run_cycle().await;
        orchestrator.shutdown();
        println!("{}", serde_json::to_string_pretty(&run.report)?);
        return Ok(());
    }

    orchestrator.run().await
}
