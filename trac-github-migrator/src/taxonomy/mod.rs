//! Milestone and label management.
//!
//! [`TaxonomyCache`] resolves milestone titles and label names to remote
//! objects, creating them on first use. A name is created at most once per
//! repository per run.

use crate::github::{Label, Milestone, TargetTracker, TrackerError};
use std::collections::HashMap;
use tracing::info;

/// Colour given to labels created during migration.
pub const DEFAULT_LABEL_COLOR: &str = "FFFFFF";

/// Milestones and labels known for one repository.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyCache {
    milestones: HashMap<String, Milestone>,
    labels: HashMap<String, Label>,
}

impl TaxonomyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the cache with every milestone and label the repository already has.
    pub fn preload(&mut self, milestones: Vec<Milestone>, labels: Vec<Label>) {
        self.milestones.extend(
            milestones
                .into_iter()
                .map(|milestone| (milestone.title.clone(), milestone)),
        );
        self.labels
            .extend(labels.into_iter().map(|label| (label.name.clone(), label)));
    }

    /// Returns the milestone called `name`, creating it as `actor` if needed.
    ///
    /// A blank name means "no milestone" and returns `None` without any
    /// remote call.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError`] if the milestone has to be created and creation fails.
    pub async fn get_or_create_milestone<T: TargetTracker + ?Sized>(
        &mut self,
        tracker: &T,
        repo: &str,
        actor: &str,
        name: &str,
    ) -> Result<Option<Milestone>, TrackerError> {
        if name.trim().is_empty() {
            return Ok(None);
        }

        if let Some(milestone) = self.milestones.get(name) {
            return Ok(Some(milestone.clone()));
        }

        let milestone = tracker.create_milestone(repo, actor, name).await?;
        info!(repo, milestone = name, number = milestone.number, "Created milestone");
        self.milestones.insert(name.to_string(), milestone.clone());
        Ok(Some(milestone))
    }

    /// Returns the label called `name`, creating it as `actor` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError`] if the label has to be created and creation fails.
    pub async fn get_or_create_label<T: TargetTracker + ?Sized>(
        &mut self,
        tracker: &T,
        repo: &str,
        actor: &str,
        name: &str,
    ) -> Result<Label, TrackerError> {
        if let Some(label) = self.labels.get(name) {
            return Ok(label.clone());
        }

        let label = tracker
            .create_label(repo, actor, name, DEFAULT_LABEL_COLOR)
            .await?;
        info!(repo, label = name, "Created label");
        self.labels.insert(name.to_string(), label.clone());
        Ok(label)
    }

    #[must_use]
    pub fn milestone_count(&self) -> usize {
        self.milestones.len()
    }

    #[must_use]
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}
