//! The loaded dashboard state.

use crate::error::Result;
use credence_cohort::NeighborFinder;
use credence_data::{ClientTable, DataError, FeatureTable, RawArtifacts};
use credence_model::{Attributions, Classifier, ModelError, TreeEnsemble, TreeExplainer};

/// Model, tables and attributions, loaded once and read-only afterwards.
///
/// Client table, feature table and attribution matrix share the same row
/// order; a row index is valid for all three.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    model: TreeEnsemble,
    clients: ClientTable,
    features: FeatureTable,
    attributions: Attributions,
    revision: Option<String>,
}

impl DashboardContext {
    /// Decode raw artifacts and build the context.
    pub fn from_artifacts(raw: &RawArtifacts) -> Result<Self> {
        let model = TreeEnsemble::from_json(&raw.model)?;
        let clients = ClientTable::from_csv(&raw.clients)?;
        let columns = (!model.feature_names().is_empty()).then(|| model.feature_names());
        let features = FeatureTable::from_csv(&raw.features, columns)?;
        Self::new(model, clients, features)
    }

    /// Check alignment and compute the attributions.
    pub fn new(model: TreeEnsemble, clients: ClientTable, features: FeatureTable) -> Result<Self> {
        if clients.len() != features.nrows() {
            return Err(DataError::RowCountMismatch {
                clients: clients.len(),
                features: features.nrows(),
            }
            .into());
        }
        if model.num_features() != features.ncols() {
            return Err(ModelError::FeatureCountMismatch {
                model: model.num_features(),
                table: features.ncols(),
            }
            .into());
        }

        let attributions = TreeExplainer::new(&model).explain(&features)?;
        tracing::info!(
            clients = clients.len(),
            features = features.ncols(),
            trees = model.trees().len(),
            "dashboard context ready"
        );

        Ok(Self {
            model,
            clients,
            features,
            attributions,
            revision: None,
        })
    }

    /// Record the artifact revision the context was loaded from.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Artifact revision, when loaded from a pinned remote.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// The tree ensemble.
    pub const fn model(&self) -> &TreeEnsemble {
        &self.model
    }

    /// The client table.
    pub const fn clients(&self) -> &ClientTable {
        &self.clients
    }

    /// The feature table.
    pub const fn features(&self) -> &FeatureTable {
        &self.features
    }

    /// The attribution matrix.
    pub const fn attributions(&self) -> &Attributions {
        &self.attributions
    }

    /// Expected margin the attributions are measured against.
    pub const fn baseline(&self) -> f64 {
        self.attributions.baseline()
    }

    /// Number of clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Row index of a client identifier.
    pub fn row_of(&self, client_id: i64) -> Result<usize> {
        Ok(self.clients.position(client_id)?)
    }

    /// Neighbour search over the feature table.
    pub fn neighbor_finder(&self) -> NeighborFinder<'_> {
        NeighborFinder::new(&self.features)
    }
}
