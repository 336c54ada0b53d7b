//! # Provisioning Collaborators
//!
//! `Provisioner` bundles the three I/O collaborators the pipeline phases
//! call into:
//!
//! - **[`Fetcher`]** downloads artifacts.
//! - **[`Extractor`]** unpacks archives.
//! - **[`TemplateEngine`]** renders templates against the data model.
//!
//! The phases only ever see the traits. A run normally uses
//! [`Provisioner::new`], which wires in the HTTP fetcher, the tar.gz
//! extractor and the Tera engine; tests swap any of them out through
//! [`Provisioner::with_operations`] to count calls or simulate failures
//! without a network.

use crate::config::ClusterConfig;
use crate::extract::{Extractor, TarGzExtractor};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::template::{TemplateEngine, TeraEngine};

/// The collaborators a pipeline run goes through.
pub struct Provisioner {
    fetcher: Box<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
    engine: Box<dyn TemplateEngine>,
}

impl Provisioner {
    /// Creates a provisioner with the real HTTP, tar.gz and Tera
    /// implementations.
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            fetcher: Box::new(HttpFetcher::new(config.download_timeout)),
            extractor: Box::new(TarGzExtractor),
            engine: Box::new(TeraEngine),
        }
    }

    /// Creates a provisioner with custom collaborators.
    pub fn with_operations(
        fetcher: Box<dyn Fetcher>,
        extractor: Box<dyn Extractor>,
        engine: Box<dyn TemplateEngine>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            engine,
        }
    }

    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    pub fn engine(&self) -> &dyn TemplateEngine {
        self.engine.as_ref()
    }
}
