use super::config::SampleConfig;
use super::services::TrajectorySource;
use crate::error::{MdmlError, Result};
use crate::residue::save_structure;
use ndarray::{s, Array2, ArrayView2};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Cluster id of every frame, grouped by trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignments {
    pub per_trajectory: Vec<Vec<usize>>,
}

impl ClusterAssignments {
    /// `(trajectory, frame)` members of each cluster, by ascending cluster id.
    pub fn members(&self) -> BTreeMap<usize, Vec<(usize, usize)>> {
        let mut clusters: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
        for (traj, labels) in self.per_trajectory.iter().enumerate() {
            for (frame, &cluster) in labels.iter().enumerate() {
                clusters.entry(cluster).or_default().push((traj, frame));
            }
        }
        clusters
    }
}

/// A cluster had fewer frames than requested; every member was taken instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientSamples {
    pub cluster: usize,
    pub requested: usize,
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSample {
    pub cluster: usize,
    /// `(trajectory, frame)` pairs drawn without replacement.
    pub frames: Vec<(usize, usize)>,
    pub shortfall: Option<InsufficientSamples>,
}

impl ClusterSample {
    pub fn file_name(cluster: usize, trajectory: usize, frame: usize) -> String {
        format!("cluster{cluster}-run{trajectory}-frame{frame}.pdb")
    }
}

/// Splits `frames x components` rows into consecutive per-trajectory views.
pub fn split_by_lengths<'a>(
    reduced: &'a Array2<f64>,
    lengths: &[usize],
) -> Result<Vec<ArrayView2<'a, f64>>> {
    let total: usize = lengths.iter().sum();
    if total != reduced.nrows() {
        return Err(MdmlError::dimension(
            "splitting reduced coordinates",
            format!(
                "trajectory lengths sum to {total} frames but there are {} rows",
                reduced.nrows()
            ),
        ));
    }
    let mut start = 0;
    let mut views = Vec::with_capacity(lengths.len());
    for &len in lengths {
        views.push(reduced.slice(s![start..start + len, ..]));
        start += len;
    }
    Ok(views)
}

/// Draws up to `samples_per_cluster` frames from every cluster.
pub fn sample_clusters<R: Rng + ?Sized>(
    assignments: &ClusterAssignments,
    samples_per_cluster: usize,
    rng: &mut R,
) -> Vec<ClusterSample> {
    assignments
        .members()
        .into_iter()
        .map(|(cluster, members)| {
            let shortfall = if members.len() < samples_per_cluster {
                let short = InsufficientSamples {
                    cluster,
                    requested: samples_per_cluster,
                    available: members.len(),
                };
                warn!(
                    "Cluster {} has {} frames, fewer than the {} requested; sampling all of them",
                    cluster, short.available, short.requested
                );
                Some(short)
            } else {
                None
            };
            let take = samples_per_cluster.min(members.len());
            let frames = members.choose_multiple(rng, take).copied().collect();
            ClusterSample {
                cluster,
                frames,
                shortfall,
            }
        })
        .collect()
}

/// Writes every sampled frame under `output_dir`, creating it if needed.
pub fn dump_clusters(
    samples: &[ClusterSample],
    source: &dyn TrajectorySource,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();
    for sample in samples {
        for &(trajectory, frame) in &sample.frames {
            let pdb = source.frame(trajectory, frame)?;
            let path = output_dir.join(ClusterSample::file_name(sample.cluster, trajectory, frame));
            save_structure(&pdb, &path)?;
            written.push(path);
        }
    }
    info!("Wrote {} cluster frames to {:?}", written.len(), output_dir);
    Ok(written)
}

/// Samples every cluster and writes the frames per `config`.
pub fn sample_and_dump<R: Rng + ?Sized>(
    assignments: &ClusterAssignments,
    source: &dyn TrajectorySource,
    config: &SampleConfig,
    rng: &mut R,
) -> Result<Vec<ClusterSample>> {
    let samples = sample_clusters(assignments, config.samples_per_cluster, rng);
    dump_clusters(&samples, source, &config.output_dir)?;
    Ok(samples)
}
