use anyhow::Context;
use clap::Parser;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let registry = tracing_subscriber::Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target().contains("backend") || meta.target().contains("analysis")
        }));
    tracing::subscriber::set_global_default(registry)?;

    let config = backend::Config::parse();

    tracing::info!("Starting...");
    tracing::debug!(?config, "Loaded configuration");

    if let Some(output_dir) = config.output_dir.as_ref() {
        if !tokio::fs::try_exists(output_dir).await.unwrap_or(false) {
            tokio::fs::create_dir_all(output_dir)
                .await
                .with_context(|| format!("creating output folder {:?}", output_dir))?;
        }
    }

    let router = backend::app(&config);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!("Listening on {}", config.listen);

    axum::serve(listener, router).await?;

    Ok(())
}
