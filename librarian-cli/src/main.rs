use std::sync::Arc;

use tracing::info;

use librarian_core::Settings;
use librarian_knowledge::{Embedder, HashEmbedder, HttpEmbedder, KnowledgeEngine, RefreshSummary};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1).collect::<Vec<_>>();
    let offline = if let Some(pos) = args.iter().position(|a| a == "--offline") {
        args.remove(pos);
        true
    } else {
        false
    };

    let Some(command) = args.first().cloned() else {
        print_usage();
        return Ok(());
    };

    let settings = Settings::load()?.knowledge_settings();
    info!("Settings loaded, embedding model {}", settings.embedding_model);

    let embedder: Arc<dyn Embedder> = if offline {
        Arc::new(HashEmbedder::new())
    } else {
        Arc::new(HttpEmbedder::new(&settings)?)
    };

    let engine = KnowledgeEngine::open_with_embedder(settings.clone(), embedder).await?;

    match command.as_str() {
        "build" => {
            let summary = engine.rebuild().await?;
            print_summary("rebuild", &summary);
        }
        "refresh" => {
            let summary = engine.refresh().await?;
            print_summary("refresh", &summary);
        }
        "query" => {
            let Some(text) = args.get(1) else {
                print_usage();
                return Ok(());
            };
            let k = args
                .get(2)
                .and_then(|raw| raw.parse::<usize>().ok())
                .unwrap_or(settings.search.max_results);

            let hits = engine.query(text, k).await?;
            if hits.is_empty() {
                println!("no results");
            }
            for (rank, hit) in hits.iter().enumerate() {
                println!(
                    "{:>2}. [{:.4}] {}\n    {}",
                    rank + 1,
                    hit.score,
                    hit.source.display(),
                    hit.text.trim().replace('\n', " "),
                );
            }
        }
        "status" => {
            let status = engine.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        _ => print_usage(),
    }

    Ok(())
}

fn print_summary(operation: &str, summary: &RefreshSummary) {
    println!(
        "{operation}: {} added, {} changed, {} removed, {} unchanged",
        summary.added.len(),
        summary.changed.len(),
        summary.removed.len(),
        summary.unchanged,
    );
    for failure in &summary.failures {
        println!("  failed: {} ({})", failure.path.display(), failure.reason);
    }
}

fn print_usage() {
    println!("usage: librarian [--offline] <command>");
    println!();
    println!("commands:");
    println!("  build              rebuild the index from the documents directory");
    println!("  refresh            incrementally reconcile the index");
    println!("  query <text> [k]   search the knowledge base");
    println!("  status             show loaded index counts");
}
