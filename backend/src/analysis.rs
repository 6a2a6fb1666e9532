use common::demo_events::GameEvents;

#[derive(Debug, Clone)]
pub enum AnalysisData {
    MemMapped(std::sync::Arc<memmap2::Mmap>),
    Preloaded(axum::body::Bytes),
}

impl AnalysisData {
    pub fn data(&self) -> &[u8] {
        match self {
            AnalysisData::MemMapped(v) => v,
            AnalysisData::Preloaded(v) => v,
        }
    }
}

/// Parses the demo on the blocking pool, the whole demo is decoded before
/// anything is returned.
#[tracing::instrument(skip(input), fields(size = input.data().len()))]
pub async fn analyse(input: AnalysisData) -> Result<GameEvents, crate::ApiError> {
    let result = tokio::task::spawn_blocking(move || ::analysis::parse(input.data())).await?;

    let events = result?;
    tracing::info!(
        "Collected {} kills over {} rounds",
        events.kills.len(),
        events.rounds.len()
    );

    Ok(events)
}
