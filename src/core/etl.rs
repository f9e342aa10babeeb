use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct ImportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ImportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs the stages strictly in sequence and returns the sink summary.
    pub async fn run(&self) -> Result<String> {
        self.pipeline.preflight().await?;

        tracing::info!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", raw_data.len());

        tracing::info!("Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Transformed {} records ({} duplicates removed)",
            transformed.rows.len(),
            transformed.duplicates_removed
        );

        tracing::info!("Loading data...");
        let summary = self.pipeline.load(transformed).await?;
        tracing::info!("{}", summary);

        Ok(summary)
    }
}
