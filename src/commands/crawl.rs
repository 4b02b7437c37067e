use crate::config::AppConfig;
use crate::error::Error;
use crate::services::Crawler;

pub fn run(resume: bool) {
    let config = AppConfig::from_env();

    if let Err(e) = config.init_directories() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    match run_crawl(&config, resume) {
        Ok(Some(outcome)) => {
            println!(
                "\n✅ Crawl finished: {} succeeded, {} failed, {} skipped",
                outcome.success, outcome.failed, outcome.skipped
            );
            if outcome.failed > 0 {
                println!("💡 Re-run with --resume to retry the failed symbols");
                std::process::exit(1);
            }
        }
        Ok(None) => {
            println!("⏭️  Not a trading day, nothing to crawl");
        }
        Err(e) => {
            eprintln!("❌ Crawl failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_crawl(
    config: &AppConfig,
    resume: bool,
) -> Result<Option<crate::services::BatchOutcome>, Error> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let crawler = Crawler::new(config)?;
        if resume {
            crawler.resume().await
        } else {
            crawler.run_daily().await
        }
    })
}
