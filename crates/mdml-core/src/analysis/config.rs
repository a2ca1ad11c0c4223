use bon::Builder;
use std::path::PathBuf;

/// Slow feature analysis settings.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct SfaConfig {
    #[builder(default = 2)]
    pub n_components: usize,
    /// Time lag, in frames.
    #[builder(default = 1)]
    pub tau: usize,
}

impl Default for SfaConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Cluster frame sampling settings.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct SampleConfig {
    /// Frames drawn per cluster.
    #[builder(default = 10)]
    pub samples_per_cluster: usize,
    #[builder(default = PathBuf::from("Clusters"), into)]
    pub output_dir: PathBuf,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
