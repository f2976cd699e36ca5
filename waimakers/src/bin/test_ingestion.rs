use common::FetcherConfig;
use waimakers::feed_parser::parse_feed;
use waimakers::ingestion::{FeedFetcher, HttpFeedFetcher};
use waimakers::registry::FeedRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let fetcher = HttpFeedFetcher::new(&FetcherConfig::default())?;
    let registry = FeedRegistry::builtin();
    let sources = registry.primary.iter().chain(registry.backup.iter());

    for source in sources {
        println!("\n{}", "=".repeat(60));
        println!("Testing: {} ({})", source.name, source.url);
        println!("{}", "=".repeat(60));

        match fetcher.fetch(&source.url).await {
            Ok(content) => {
                let articles = parse_feed(&content, &source.name, &source.keywords);
                println!("✓ Success! {} bytes, {} articles", content.len(), articles.len());

                for (i, article) in articles.iter().take(3).enumerate() {
                    println!("    {}. {}", i + 1, article.title);
                    println!("       URL: {}", if article.link.is_empty() { "none" } else { article.link.as_str() });
                    println!("       Date: {}", article.date);
                    println!("       Highlights: {:?}", article.highlights);
                }
            }
            Err(e) => {
                println!("✗ Failed: {}", e);
            }
        }
    }

    Ok(())
}
