//! Turning a manifest comparison into a download plan

use crate::error::InstallResult;
use crate::service::{PatchLookup, PatchRequest};
use fuel_formats::manifest::Comparison;
use fuel_formats::patch_manifest::{HashPairs, PatchManifest};
use std::sync::Arc;
use tracing::{debug, info};

/// Plans one install or update pass of a game version
#[derive(Clone)]
pub struct PatchPlanner {
    lookup: Arc<dyn PatchLookup>,
    game_id: String,
    version_id: String,
}

impl PatchPlanner {
    /// Planner for `version_id` of `game_id`
    pub fn new(
        lookup: Arc<dyn PatchLookup>,
        game_id: impl Into<String>,
        version_id: impl Into<String>,
    ) -> Self {
        Self {
            lookup,
            game_id: game_id.into(),
            version_id: version_id.into(),
        }
    }

    /// Look up a body for every file to fetch and assemble the plan
    ///
    /// Batches are submitted one after another; the first failing request
    /// aborts planning.
    pub async fn plan(&self, comparison: &Comparison) -> InstallResult<PatchManifest> {
        let pairs = HashPairs::from_comparison(comparison);
        if pairs.is_empty() {
            return Ok(PatchManifest::default());
        }

        info!(
            game_id = %self.game_id,
            files = pairs.len(),
            requests = pairs.batch_count(),
            "Requesting patches"
        );

        let mut descriptors = Vec::with_capacity(pairs.len());
        for (index, batch) in pairs.batches().enumerate() {
            let request = PatchRequest {
                game_id: &self.game_id,
                version_id: &self.version_id,
                hashes: batch,
            };
            let answer = self.lookup.get_patches(&request).await?;
            debug!(
                batch = index,
                pairs = batch.len(),
                descriptors = answer.len(),
                "Patch batch done"
            );
            descriptors.extend(answer);
        }

        let plan = PatchManifest::build(comparison, &descriptors)?;
        debug!(
            dirs = plan.dirs.len(),
            files = plan.files.len(),
            bytes = plan.total_download_size(),
            "Patch plan assembled"
        );
        Ok(plan)
    }
}
