use bsky_rss::utils::{logger, validation::Validate};
use bsky_rss::{BskyClient, CliConfig, EtlEngine, FeedPipeline, LocalStorage, RssError};
use clap::error::ErrorKind;
use clap::Parser;

fn exit_with(e: &RssError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match CliConfig::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    // 驗證配置（在任何網路請求之前）
    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed");
        exit_with(&e);
    }
    tracing::debug!("Resolved config: {:?}", config);

    let client = match BskyClient::new(&config.api_base, &config.user_agent, config.timeout()) {
        Ok(client) => client,
        Err(e) => exit_with(&e),
    };
    let storage = LocalStorage::new(std::env::current_dir()?);
    let pipeline = FeedPipeline::new(storage, config, client);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            println!(
                "Generated {} with {} item(s) for @{}",
                summary.output_path, summary.item_count, summary.handle
            );
            Ok(())
        }
        Err(e) => exit_with(&e),
    }
}
