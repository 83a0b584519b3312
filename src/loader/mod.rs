// Component loader - fetches, mounts and initializes page components
//
// Each declared component is loaded concurrently: a non-blocking CSS
// fetch, a blocking HTML fetch into the component's container, then the
// registered initializer. Loads settle independently; one component's
// failure never aborts another's. A per-name map of shared in-flight
// futures guarantees at most one concurrent load per component.

mod fallback;
mod registry;

pub use fallback::fallback_fragment;
pub use registry::{ComponentInit, InitRegistry};

use crate::data::DataManager;
use crate::events::{AppEvent, LoadingStats};
use crate::faults::ErrorHandler;
use crate::fetch::{FetchError, ResourceFetcher};
use crate::page::{FeedbackKind, Page};
use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;

const COMPONENT: &str = "ComponentLoader";

/// Static description of one loadable component
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub name: &'static str,
    pub container_id: &'static str,
    pub html_path: String,
    pub css_path: Option<String>,
    pub required: bool,
}

impl ComponentSpec {
    fn standard(name: &'static str, container_id: &'static str, dir: &str, required: bool) -> Self {
        Self {
            name,
            container_id,
            html_path: format!("components/{dir}/{dir}.html"),
            css_path: Some(format!("components/{dir}/{dir}.css")),
            required,
        }
    }
}

/// The declared component set for the discussion page
pub fn default_components() -> Vec<ComponentSpec> {
    vec![
        ComponentSpec::standard("navbar", "navbar-container", "navbar", true),
        ComponentSpec::standard("topicInfo", "topic-info-container", "topic-info", true),
        ComponentSpec::standard("aiAssistant", "ai-assistant-container", "ai-assistant", false),
        ComponentSpec::standard("discussion", "discussion-container", "discussion", true),
    ]
}

/// Lifecycle state of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotStarted,
    Loading,
    Loaded,
    Error,
}

/// Bookkeeping for one component, owned exclusively by the loader
#[derive(Debug, Clone)]
pub struct ComponentRecord {
    pub spec: ComponentSpec,
    pub state: LoadState,
    pub error: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Why a component failed to load
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Required container '{container_id}' not found for component '{name}'")]
    MissingContainer {
        name: &'static str,
        container_id: &'static str,
    },

    #[error("Failed to load HTML: {0}")]
    Html(#[from] FetchError),

    #[error("Initializer for component '{name}' failed: {source}")]
    Init {
        name: &'static str,
        source: anyhow::Error,
    },
}

/// Settled result of a load attempt; cloneable so concurrent callers
/// can share one in-flight future
#[derive(Debug, Clone)]
enum LoadOutcome {
    Mounted,
    Skipped,
    Failed(String),
}

impl LoadOutcome {
    fn mounted(&self) -> bool {
        matches!(self, LoadOutcome::Mounted)
    }
}

type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;

#[derive(Default)]
struct LoaderState {
    loaded: HashSet<String>,
    failed: HashSet<String>,
    records: HashMap<String, ComponentRecord>,
    pending: HashMap<String, SharedLoad>,
    initialized: bool,
}

struct LoaderInner {
    page: Page,
    fetcher: Arc<dyn ResourceFetcher>,
    faults: ErrorHandler,
    data: DataManager,
    registry: InitRegistry,
    specs: Vec<ComponentSpec>,
    state: Mutex<LoaderState>,
    events: broadcast::Sender<AppEvent>,
}

/// Orchestrates loading of every declared component
#[derive(Clone)]
pub struct ComponentLoader {
    inner: Arc<LoaderInner>,
}

impl ComponentLoader {
    pub fn new(
        page: Page,
        fetcher: Arc<dyn ResourceFetcher>,
        faults: ErrorHandler,
        data: DataManager,
        registry: InitRegistry,
        specs: Vec<ComponentSpec>,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(LoaderInner {
                page,
                fetcher,
                faults,
                data,
                registry,
                specs,
                state: Mutex::new(LoaderState::default()),
                events,
            }),
        }
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: AppEvent) {
        // No receivers is fine; events are best-effort notifications
        let _ = self.inner.events.send(event);
    }

    /// Load every declared component, then load and render the fixture
    /// data, then announce completion. Idempotent: a second call warns
    /// and does nothing.
    pub async fn init(&self) {
        if self.inner.state.lock().unwrap().initialized {
            tracing::warn!(component = COMPONENT, "Already initialized");
            return;
        }

        tracing::info!(component = COMPONENT, "Initializing component loader");

        let this = self.clone();
        let ok = self
            .inner
            .faults
            .safe_async(
                COMPONENT,
                move || {
                    let this = this.clone();
                    async move {
                        this.load_all_components().await;
                        this.inner.data.load_and_render_all().await;
                        Ok(true)
                    }
                },
                false,
            )
            .await;

        if !ok {
            self.inner.page.push_feedback(
                "Component loading failed, some features may be unavailable",
                FeedbackKind::Error,
            );
            return;
        }

        self.inner.state.lock().unwrap().initialized = true;
        tracing::info!(component = COMPONENT, "Initialized successfully");

        let (loaded, failed) = {
            let state = self.inner.state.lock().unwrap();
            (sorted(&state.loaded), sorted(&state.failed))
        };
        self.emit(AppEvent::ComponentsLoaded { loaded, failed });
    }

    /// Load all declared components concurrently (independent settling)
    async fn load_all_components(&self) {
        tracing::info!(component = COMPONENT, "Loading all components");

        let loads = self
            .inner
            .specs
            .iter()
            .map(|spec| self.load_component(spec.name));
        let results = futures::future::join_all(loads).await;

        for (spec, mounted) in self.inner.specs.iter().zip(results) {
            if mounted {
                tracing::info!(
                    component = COMPONENT,
                    "Component '{}' loaded successfully",
                    spec.name
                );
            } else {
                tracing::error!(
                    component = COMPONENT,
                    "Component '{}' did not mount",
                    spec.name
                );
            }
        }

        let stats = self.loading_stats();
        tracing::info!(
            component = COMPONENT,
            "Loading complete: {}/{} components loaded ({:.1}% success rate)",
            stats.loaded,
            stats.total,
            stats.success_rate()
        );
    }

    /// Load one component by name. Concurrent calls for the same name
    /// share a single in-flight future; the entry is removed once it
    /// settles so later calls start a fresh load.
    pub async fn load_component(&self, name: &str) -> bool {
        let Some(spec) = self.inner.specs.iter().find(|s| s.name == name).cloned() else {
            tracing::warn!(component = COMPONENT, "Unknown component: {name}");
            return false;
        };

        let shared = {
            let mut state = self.inner.state.lock().unwrap();
            match state.pending.get(name) {
                Some(existing) => existing.clone(),
                None => {
                    let this = self.clone();
                    let load: SharedLoad =
                        async move { this.load_inner(&spec).await }.boxed().shared();
                    state.pending.insert(name.to_string(), load.clone());
                    load
                }
            }
        };

        let outcome = shared.clone().await;

        // Remove the pending entry only if it is still ours; a reload
        // may already have registered a fresh future under this name
        let mut state = self.inner.state.lock().unwrap();
        if state
            .pending
            .get(name)
            .is_some_and(|current| current.ptr_eq(&shared))
        {
            state.pending.remove(name);
        }

        outcome.mounted()
    }

    async fn load_inner(&self, spec: &ComponentSpec) -> LoadOutcome {
        tracing::debug!(component = COMPONENT, "Loading component: {}", spec.name);

        // Container first: a missing optional container skips the load
        // without touching any loader state
        if !self.inner.page.contains(spec.container_id) {
            if spec.required {
                return self.fail(
                    spec,
                    LoadError::MissingContainer {
                        name: spec.name,
                        container_id: spec.container_id,
                    },
                );
            }
            tracing::warn!(
                component = COMPONENT,
                "Optional container '{}' not found for component '{}', skipping",
                spec.container_id,
                spec.name
            );
            return LoadOutcome::Skipped;
        }

        self.record(
            spec,
            LoadState::Loading,
            None,
            None,
        );

        // CSS is best-effort and never blocks the component
        if let Some(css_path) = spec.css_path.clone() {
            let this = self.clone();
            let name = spec.name;
            tokio::spawn(async move {
                match this.inner.fetcher.fetch_text(&css_path).await {
                    Ok(_) => {
                        this.inner.page.add_stylesheet(&css_path, name);
                    }
                    Err(error) => {
                        tracing::warn!(
                            component = COMPONENT,
                            "Failed to load CSS for component '{name}': {error}"
                        );
                        this.inner.faults.handle_style_error(&css_path);
                    }
                }
            });
        }

        // HTML is fatal for this component
        let html = match self.inner.fetcher.fetch_text(&spec.html_path).await {
            Ok(html) => html,
            Err(error) => return self.fail(spec, LoadError::Html(error)),
        };
        self.inner.page.set_html(spec.container_id, &html);

        // Run the registered initializer; missing registrations only warn
        match self.inner.registry.get(spec.name) {
            Some(init) => {
                if let Err(source) = init.init(spec.container_id) {
                    return self.fail(
                        spec,
                        LoadError::Init {
                            name: spec.name,
                            source,
                        },
                    );
                }
            }
            None => {
                tracing::warn!(
                    component = COMPONENT,
                    "No initializer registered for component '{}'",
                    spec.name
                );
            }
        }

        self.record(spec, LoadState::Loaded, None, Some(Utc::now()));
        self.inner
            .state
            .lock()
            .unwrap()
            .loaded
            .insert(spec.name.to_string());
        self.emit(AppEvent::ComponentReady {
            name: spec.name.to_string(),
        });
        LoadOutcome::Mounted
    }

    /// Shared failure path: count and log the error, substitute the
    /// fallback fragment for required components, mark the record
    fn fail(&self, spec: &ComponentSpec, error: LoadError) -> LoadOutcome {
        let message = error.to_string();
        self.inner
            .faults
            .handle(COMPONENT, &anyhow::Error::new(error), Some(spec.name));

        // Required regions must never be blank; optional failures get
        // no fallback content
        if spec.required && self.inner.page.contains(spec.container_id) {
            self.inner
                .page
                .set_html(spec.container_id, &fallback_fragment(spec.name));
            tracing::info!(
                component = COMPONENT,
                "Fallback content created for component: {}",
                spec.name
            );
        }

        self.record(spec, LoadState::Error, Some(message.clone()), None);
        self.inner
            .state
            .lock()
            .unwrap()
            .failed
            .insert(spec.name.to_string());
        self.emit(AppEvent::ComponentFailed {
            name: spec.name.to_string(),
            message: message.clone(),
        });
        LoadOutcome::Failed(message)
    }

    fn record(
        &self,
        spec: &ComponentSpec,
        state: LoadState,
        error: Option<String>,
        loaded_at: Option<DateTime<Utc>>,
    ) {
        self.inner.state.lock().unwrap().records.insert(
            spec.name.to_string(),
            ComponentRecord {
                spec: spec.clone(),
                state,
                error,
                loaded_at,
            },
        );
    }

    /// Reload one component: membership is cleared, a transient
    /// placeholder shows while the load re-runs
    pub async fn reload_component(&self, name: &str) -> Result<bool> {
        let spec = self
            .inner
            .specs
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown component: {name}"))?;

        tracing::info!(component = COMPONENT, "Reloading component: {name}");
        {
            let mut state = self.inner.state.lock().unwrap();
            state.loaded.remove(name);
            state.failed.remove(name);
        }

        if self.inner.page.contains(spec.container_id) {
            self.inner.page.set_html(
                spec.container_id,
                r#"<div class="loading-placeholder"><p>Reloading...</p></div>"#,
            );
        }

        Ok(self.load_component(name).await)
    }

    /// Reload everything: loader state and data cache reset, all
    /// components reloaded, data re-rendered
    pub async fn reload_all(&self) {
        tracing::info!(component = COMPONENT, "Reloading all components");

        {
            let mut state = self.inner.state.lock().unwrap();
            state.loaded.clear();
            state.failed.clear();
            state.records.clear();
        }
        self.inner.data.clear_cache();

        self.load_all_components().await;
        self.inner.data.load_and_render_all().await;

        self.inner
            .page
            .push_feedback("All components reloaded", FeedbackKind::Success);
    }

    // ── Introspection ────────────────────────────────────────────────

    pub fn is_loaded(&self, name: &str) -> bool {
        self.inner.state.lock().unwrap().loaded.contains(name)
    }

    pub fn loaded_components(&self) -> Vec<String> {
        sorted(&self.inner.state.lock().unwrap().loaded)
    }

    pub fn failed_components(&self) -> Vec<String> {
        sorted(&self.inner.state.lock().unwrap().failed)
    }

    pub fn component_record(&self, name: &str) -> Option<ComponentRecord> {
        self.inner.state.lock().unwrap().records.get(name).cloned()
    }

    /// Lifecycle state for a component; components that never began a
    /// load report NotStarted
    pub fn component_state(&self, name: &str) -> LoadState {
        self.inner
            .state
            .lock()
            .unwrap()
            .records
            .get(name)
            .map(|r| r.state)
            .unwrap_or(LoadState::NotStarted)
    }

    /// Derived loading statistics; `pending` falls out of the identity
    /// `total - loaded - failed`
    pub fn loading_stats(&self) -> LoadingStats {
        let state = self.inner.state.lock().unwrap();
        LoadingStats::derive(self.inner.specs.len(), state.loaded.len(), state.failed.len())
    }

    /// Full teardown: registries cleared, injected stylesheets removed,
    /// initialized flag reset
    pub fn destroy(&self) {
        let mut state = self.inner.state.lock().unwrap();
        state.loaded.clear();
        state.failed.clear();
        state.records.clear();
        state.pending.clear();
        state.initialized = false;
        drop(state);

        self.inner.page.remove_component_stylesheets();
        tracing::info!(component = COMPONENT, "ComponentLoader destroyed");
    }
}

fn sorted(set: &HashSet<String>) -> Vec<String> {
    let mut names: Vec<String> = set.iter().cloned().collect();
    names.sort();
    names
}
