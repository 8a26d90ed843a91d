use docsearch_core::config::Config;
use docsearch_embed::TieredEmbedder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = TieredEmbedder::from_settings(&settings.embedding);
    println!("tiers: {:?}", embedder.tier_names());
    for text in ["hello world", "Q3 campaign performance report"] {
        let out = embedder.embed_traced(text).await;
        println!("{:<32} source={:<8} dim={}", text, out.source, out.vector.len());
    }
    Ok(())
}
