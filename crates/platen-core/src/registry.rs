//! Document registry and compilation cache.
//!
//! Discovers template files, compiles each through the configured producer,
//! and maintains two consistent lookup indexes: by logical id and by
//! absolute path. The two indexes live inside a single `Arc<Indexes>` that
//! is swapped atomically, so a lookup never observes one index from an old
//! generation and the other from a new one.
//!
//! Population is lazy and de-duplicated: any number of concurrent callers
//! hitting an empty registry await one shared in-flight refresh instead of
//! each triggering independent compilation work.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::compiler::{CompiledDocument, TemplateCompiler};
use crate::discovery::discover_templates;
use crate::error::{Error, Result};

/// One compiled template known to the registry.
///
/// Entries are immutable after creation. A refresh produces wholly new
/// entries; no single entry is ever deleted in isolation.
pub struct DocumentEntry {
    /// Logical identifier: the source's explicit override when present,
    /// else the file's base name without extension
    pub id: String,
    /// Path relative to the template root, for display and diagnostics
    pub slug: String,
    /// Canonical path, the de-duplication key of the by-path index
    pub absolute_path: PathBuf,
    /// The compiled artifact, owned exclusively by this entry
    pub compiled: CompiledDocument,
    /// Default properties used when a caller supplies none
    pub preview_props: serde_json::Map<String, serde_json::Value>,
}

/// The registry's two lookup indexes, always replaced as a pair.
#[derive(Default)]
pub struct Indexes {
    by_id: HashMap<String, Arc<DocumentEntry>>,
    by_path: HashMap<PathBuf, Arc<DocumentEntry>>,
}

impl Indexes {
    pub fn get_by_id(&self, id: &str) -> Option<&Arc<DocumentEntry>> {
        self.by_id.get(id)
    }

    pub fn get_by_path(&self, path: &Path) -> Option<&Arc<DocumentEntry>> {
        self.by_path.get(path)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Result type of the shared in-flight refresh future. The error must be
/// cloneable so one failure can fan out to every waiter.
type SharedResult = std::result::Result<(), Arc<Error>>;
type SharedRefresh = Shared<BoxFuture<'static, SharedResult>>;

/// Population state machine: either nothing is happening, or exactly one
/// refresh is in flight and every interested caller holds a clone of it.
enum RefreshState {
    Idle,
    Refreshing(SharedRefresh),
}

struct Inner {
    templates_root: PathBuf,
    compiler: Arc<dyn TemplateCompiler>,
    /// Live indexes. The inner `Arc` is what gets swapped; readers clone it
    /// and keep a consistent generation for as long as they hold it.
    indexes: RwLock<Arc<Indexes>>,
    refresh_state: Mutex<RefreshState>,
}

/// The document registry.
///
/// Clone is cheap: the registry wraps an `Arc` around its shared state, the
/// same way request handlers expect to share it.
#[derive(Clone)]
pub struct DocumentRegistry {
    inner: Arc<Inner>,
}

impl DocumentRegistry {
    pub fn new(templates_root: impl Into<PathBuf>, compiler: Arc<dyn TemplateCompiler>) -> Self {
        DocumentRegistry {
            inner: Arc::new(Inner {
                templates_root: templates_root.into(),
                compiler,
                indexes: RwLock::new(Arc::new(Indexes::default())),
                refresh_state: Mutex::new(RefreshState::Idle),
            }),
        }
    }

    /// Re-discover and re-compile every template, then atomically replace
    /// both indexes.
    ///
    /// Any single file failing to compile abandons the whole refresh; the
    /// previously published indexes stay live untouched. There is no
    /// incremental recompilation: re-running against a populated registry
    /// still re-compiles everything.
    pub async fn refresh(&self) -> Result<()> {
        self.inner.rebuild().await
    }

    /// Populate the registry if it is empty.
    ///
    /// Returns immediately when the by-id index is non-empty. Otherwise
    /// joins the in-flight refresh if one exists, or starts one. A refresh
    /// failure is delivered to every waiter and the state machine drops
    /// back to idle so a later call can retry.
    pub async fn ensure_populated(&self) -> Result<()> {
        if !self.inner.indexes.read().await.is_empty() {
            return Ok(());
        }

        let shared = {
            let mut state = self.inner.refresh_state.lock().await;

            // Re-check under the lock: a refresh may have completed while
            // we waited for it.
            if !self.inner.indexes.read().await.is_empty() {
                return Ok(());
            }

            match &*state {
                RefreshState::Refreshing(shared) => shared.clone(),
                RefreshState::Idle => {
                    let inner = Arc::clone(&self.inner);
                    let shared = async move {
                        inner
                            .rebuild()
                            .await
                            .map_err(Error::into_shared)
                    }
                    .boxed()
                    .shared();
                    *state = RefreshState::Refreshing(shared.clone());
                    shared
                }
            }
        };

        let result = shared.clone().await;

        // Whichever waiter gets here first retires the completed future.
        // The ptr_eq guard keeps us from clobbering a newer refresh.
        let mut state = self.inner.refresh_state.lock().await;
        if let RefreshState::Refreshing(current) = &*state
            && current.ptr_eq(&shared)
        {
            *state = RefreshState::Idle;
        }
        drop(state);

        result.map_err(Error::from)
    }

    /// Look up an entry by logical id, populating the registry first if
    /// needed.
    pub async fn lookup_by_id(&self, id: &str) -> Result<Option<Arc<DocumentEntry>>> {
        self.ensure_populated().await?;
        Ok(self.inner.indexes.read().await.by_id.get(id).cloned())
    }

    /// Look up an entry by absolute source path.
    pub async fn lookup_by_path(&self, path: &Path) -> Result<Option<Arc<DocumentEntry>>> {
        self.ensure_populated().await?;
        Ok(self.inner.indexes.read().await.by_path.get(path).cloned())
    }

    /// All known logical ids, in no guaranteed order.
    pub async fn list_ids(&self) -> Result<Vec<String>> {
        self.ensure_populated().await?;
        Ok(self
            .inner
            .indexes
            .read()
            .await
            .by_id
            .keys()
            .cloned()
            .collect())
    }

    /// A consistent snapshot of both indexes from one generation.
    pub async fn snapshot(&self) -> Arc<Indexes> {
        Arc::clone(&*self.inner.indexes.read().await)
    }
}

impl Inner {
    async fn rebuild(&self) -> Result<()> {
        let files = discover_templates(&self.templates_root)?;

        let mut by_id: HashMap<String, Arc<DocumentEntry>> = HashMap::new();
        let mut by_path: HashMap<PathBuf, Arc<DocumentEntry>> = HashMap::new();

        for file in &files {
            let entry = Arc::new(self.compile_entry(file).await?);

            if let Some(displaced) = by_id.insert(entry.id.clone(), Arc::clone(&entry)) {
                warn!(
                    id = %entry.id,
                    kept = %entry.slug,
                    displaced = %displaced.slug,
                    "duplicate document id, later template wins"
                );
            }
            by_path.insert(entry.absolute_path.clone(), entry);
        }

        info!(
            count = by_id.len(),
            root = %self.templates_root.display(),
            "registry refreshed"
        );

        // Publish both indexes in one swap.
        *self.indexes.write().await = Arc::new(Indexes { by_id, by_path });

        Ok(())
    }

    async fn compile_entry(&self, file: &Path) -> Result<DocumentEntry> {
        let compiled = self.compiler.compile(file).await?;

        let id = compiled.document_id.clone().unwrap_or_else(|| {
            file.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let slug = file
            .strip_prefix(&self.templates_root)
            .unwrap_or(file)
            .to_string_lossy()
            .into_owned();

        let absolute_path = std::path::absolute(file)?;
        let preview_props = compiled.preview_props.clone();

        Ok(DocumentEntry {
            id,
            slug,
            absolute_path,
            compiled,
            preview_props,
        })
    }
}
