use crate::config::AppConfig;
use crate::error::Error;
use crate::models::Pool;
use crate::services::Pipeline;

pub fn run() {
    let config = AppConfig::from_env();

    if let Err(e) = config.init_directories() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    println!(
        "🎯 Generating pool for {} symbols ({} per bucket)...",
        config.universe.len(),
        config.pool_size
    );

    match generate(&config) {
        Ok((pool, summary)) => {
            println!("\n{}", summary);
            println!(
                "💾 Snapshot saved to {}",
                config.pool_dir().join(pool.snapshot_filename()).display()
            );
        }
        Err(e) => {
            eprintln!("❌ Pool generation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn generate(config: &AppConfig) -> Result<(Pool, String), Error> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let pipeline = Pipeline::new(config)?;
        pipeline.generate_pool().await
    })
}
