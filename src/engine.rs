//! Engine façade wiring the lookup and indexing components together.
//!
//! A [`TranslationMemory`] is built from an explicit [`Config`] and a
//! [`Transport`]; nothing is read from process-wide state. It holds only
//! immutable data and can be shared between threads.
//!
//! ```rust,no_run
//! use tm_harness::config::Config;
//! use tm_harness::engine::TranslationMemory;
//!
//! let memory = TranslationMemory::connect(Config::default())?;
//! for m in memory.lookup("Save file", None)? {
//!     println!("{:>6.2}  {}  [{}]", m.similarity, m.target_text, m.label);
//! }
//! # Ok::<(), tm_harness::error::TmError>(())
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::backend::{HttpTransport, Transport};
use crate::config::Config;
use crate::document;
use crate::error::{Result, TmError};
use crate::format::format_matches;
use crate::import::{ImportOutcome, TmxImporter};
use crate::language::LanguageRegistry;
use crate::models::{ScoredMatch, TranslationUnit};
use crate::scoring::score_hits;
use crate::search::{LanguageFilter, SearchClient};
use crate::writer::{CancelToken, IndexWriter, WriteOutcome};

pub struct TranslationMemory {
    config: Config,
    registry: LanguageRegistry,
    search: SearchClient,
    writer: IndexWriter,
}

impl TranslationMemory {
    /// Build an engine on top of an arbitrary transport.
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        let registry = LanguageRegistry::from_config(&config.languages);
        let search = SearchClient::new(Arc::clone(&transport), config.backend.index.clone());
        let writer = IndexWriter::new(transport, &config.backend, config.import.batch_size);
        Self {
            config,
            registry,
            search,
            writer,
        }
    }

    /// Build an engine talking HTTP to `config.backend.url`.
    pub fn connect(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.backend).map_err(TmError::Backend)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn writer(&self) -> &IndexWriter {
        &self.writer
    }

    /// Look up stored translations for `text`.
    ///
    /// Hits keep the backend's order. Matches below
    /// `retrieval.min_similarity` are dropped after scoring.
    ///
    /// # Errors
    ///
    /// - [`TmError::SearchUnavailable`] / [`TmError::Schema`] from the search.
    /// - [`TmError::NoResults`] when the backend returned no hits.
    pub fn lookup(&self, text: &str, filter: Option<&LanguageFilter>) -> Result<Vec<ScoredMatch>> {
        let hits = self.search.search(text, filter)?;
        let similarities = score_hits(text, &hits)?;
        let min_similarity = self.config.retrieval.min_similarity;

        Ok(
            format_matches(&hits, &similarities, &self.config.retrieval.service_name)
                .into_iter()
                .filter(|m| m.similarity >= min_similarity)
                .collect(),
        )
    }

    /// Index a saved translation, keyed by the unit id.
    ///
    /// Best-effort: the returned [`WriteOutcome`] tells whether the backend
    /// accepted it, but failures never propagate as errors. A unit without
    /// source text is [`WriteOutcome::Skipped`] and nothing is sent.
    pub fn index_unit(&self, unit: &TranslationUnit) -> WriteOutcome {
        self.writer
            .upsert_one(&unit.id, &document::build_for_unit(unit))
    }

    /// Import a TMX file. Config `import.langmap` is used when `langmap` is `None`.
    pub fn import_tmx(
        &self,
        path: &Path,
        langmap: Option<&HashMap<String, String>>,
        cancel: &CancelToken,
    ) -> ImportOutcome {
        let configured = &self.config.import.langmap;
        let langmap = langmap.or((!configured.is_empty()).then_some(configured));
        TmxImporter::new(&self.registry, &self.writer).import_file(path, langmap, cancel)
    }

    /// Remove every entry imported from `origin`.
    pub fn delete_origin(&self, origin: &str) -> Result<u64> {
        self.writer.delete_origin(origin)
    }

    /// Remove every entry from the translation memory.
    pub fn empty(&self) -> Result<u64> {
        self.writer.empty()
    }

    pub fn origins(&self) -> Result<Vec<String>> {
        self.writer.origins()
    }

    pub fn count(&self) -> Result<u64> {
        self.writer.count()
    }
}
