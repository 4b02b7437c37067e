use crate::config::AppConfig;
use crate::error::Error;
use crate::models::ScoreRecord;
use crate::services::Pipeline;

pub fn run(symbol: &str) {
    let config = AppConfig::from_env();

    if let Err(e) = config.init_directories() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    match score(&config, symbol) {
        Ok(record) => {
            println!("📊 Score for {}\n", symbol);
            println!("   Liquidity: {:>5.1}", record.liquidity);
            println!("   Risk:      {:>5.1}", record.risk);
            println!("   Return:    {:>5.1}", record.returns);
            println!("   Premium:   {:>5.1}", record.premium);
            println!("   Sentiment: {:>5.1}", record.sentiment);
            println!("   ─────────────────");
            println!("   Total:     {:>5.1}", record.total);
        }
        Err(e) => {
            eprintln!("❌ Could not score {}: {}", symbol, e);
            std::process::exit(1);
        }
    }
}

fn score(config: &AppConfig, symbol: &str) -> Result<ScoreRecord, Error> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let pipeline = Pipeline::new(config)?;
        pipeline.score_symbol(symbol).await
    })
}
