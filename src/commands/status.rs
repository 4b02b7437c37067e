use crate::config::AppConfig;
use crate::models::CrawlState;
use crate::services::StatusTracker;

pub fn run() {
    let config = AppConfig::from_env();
    let tracker = StatusTracker::new(&config);

    println!("📊 Crawl Status\n");

    let status = tracker.snapshot();
    if status.is_empty() {
        println!("✅ No batch in progress (status file absent or empty)");
    } else {
        let mut symbols: Vec<_> = status.iter().collect();
        symbols.sort_by(|a, b| a.0.cmp(b.0));

        for (symbol, record) in &symbols {
            let marker = match record.state {
                CrawlState::Success => "✅",
                CrawlState::Failed => "❌",
                CrawlState::InProgress => "⏳",
                CrawlState::Pending => "•",
            };
            match &record.last_error {
                Some(error) => println!("   {} {} ({})", marker, symbol, error),
                None => println!("   {} {}", marker, symbol),
            }
        }

        let retriable = tracker.pending_or_failed().len();
        if retriable > 0 {
            println!("\n💡 {} symbol(s) pending, run 'crawl --resume'", retriable);
        }
    }

    println!("\n📁 Cache directory: {}", config.cache_dir().display());
    match std::fs::read_dir(config.cache_dir()) {
        Ok(entries) => {
            let count = entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    e.path()
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext == "csv")
                })
                .count();
            println!("   {} cached series", count);
        }
        Err(_) => println!("   (not created yet)"),
    }
}
