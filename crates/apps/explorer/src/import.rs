use std::cell::Cell;
use std::rc::Rc;

use foundation::GeoBounds;
use streaming::{RemoteResource, overpass_query};
use tracing::{debug, info};

use crate::error::ExplorerError;
use crate::host::ImportTrigger;

pub const IMPORTED_GROUP: &str = "Imported area";

pub const IDLE_LABEL: &str = "Import current view";
pub const FETCHING_LABEL: &str = "Downloading from Overpass...";
pub const BUILDING_LABEL: &str = "Importing OSM data...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Fetching,
    Building,
}

/// The "import current view" state machine: `Idle -> Fetching -> Building -> Idle`.
///
/// At most one import runs at a time. `try_begin` hands out an `ImportGuard`
/// only while idle; the guard owns the non-idle state and puts everything
/// back when dropped, whichever way the import ends.
pub struct ImportWorkflow {
    state: Rc<Cell<ImportState>>,
    trigger: Rc<dyn ImportTrigger>,
    source: Rc<dyn RemoteResource>,
}

impl ImportWorkflow {
    pub fn new(trigger: Rc<dyn ImportTrigger>, source: Rc<dyn RemoteResource>) -> Self {
        Self {
            state: Rc::new(Cell::new(ImportState::Idle)),
            trigger,
            source,
        }
    }

    pub fn state(&self) -> ImportState {
        self.state.get()
    }

    pub fn try_begin(&self) -> Option<ImportGuard> {
        if self.state.get() != ImportState::Idle {
            debug!("import already in progress ({:?}), ignoring request", self.state.get());
            return None;
        }
        self.state.set(ImportState::Fetching);
        self.trigger.set_enabled(false);
        self.trigger.set_label(FETCHING_LABEL);
        Some(ImportGuard {
            state: self.state.clone(),
            trigger: self.trigger.clone(),
        })
    }

    /// Downloads raw OSM XML for `bounds`. Requires a live guard.
    pub async fn fetch(&self, _guard: &ImportGuard, bounds: &GeoBounds) -> Result<String, ExplorerError> {
        info!("importing {bounds} from {}", self.source.describe());
        self.source
            .fetch(&overpass_query(bounds))
            .await
            .map_err(|source| ExplorerError::Fetch {
                what: "overpass data".to_string(),
                source,
            })
    }
}

/// Exclusive hold on the import workflow.
#[must_use = "dropping the guard ends the import"]
pub struct ImportGuard {
    state: Rc<Cell<ImportState>>,
    trigger: Rc<dyn ImportTrigger>,
}

impl ImportGuard {
    pub fn state(&self) -> ImportState {
        self.state.get()
    }

    /// Fetch done; the engine runs next.
    pub fn building(&mut self) {
        self.state.set(ImportState::Building);
        self.trigger.set_label(BUILDING_LABEL);
    }
}

impl Drop for ImportGuard {
    fn drop(&mut self) {
        debug!("import finished in state {:?}", self.state.get());
        self.state.set(ImportState::Idle);
        self.trigger.set_label(IDLE_LABEL);
        self.trigger.set_enabled(true);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use foundation::GeoBounds;
    use pretty_assertions::assert_eq;

    use super::{BUILDING_LABEL, FETCHING_LABEL, IDLE_LABEL, ImportState, ImportWorkflow};
    use crate::error::ExplorerError;
    use crate::testing::{RecordingHost, ScriptedResource};

    fn workflow(host: &Rc<RecordingHost>, source: ScriptedResource) -> ImportWorkflow {
        ImportWorkflow::new(host.clone(), Rc::new(source))
    }

    #[test]
    fn guard_is_exclusive_and_restores_the_trigger() {
        let host = Rc::new(RecordingHost::default());
        let wf = workflow(&host, ScriptedResource::default());

        let mut guard = wf.try_begin().expect("idle");
        assert_eq!(wf.state(), ImportState::Fetching);
        assert!(!host.trigger_enabled());
        assert_eq!(host.trigger_label(), FETCHING_LABEL);
        assert!(wf.try_begin().is_none());

        guard.building();
        assert_eq!(wf.state(), ImportState::Building);
        assert_eq!(host.trigger_label(), BUILDING_LABEL);
        assert!(wf.try_begin().is_none());

        drop(guard);
        assert_eq!(wf.state(), ImportState::Idle);
        assert!(host.trigger_enabled());
        assert_eq!(host.trigger_label(), IDLE_LABEL);
        assert!(wf.try_begin().is_some());
    }

    #[tokio::test]
    async fn fetch_sends_the_overpass_query() {
        let host = Rc::new(RecordingHost::default());
        let source = ScriptedResource::default().with_fallback("<osm/>");
        let calls = source.requests();
        let wf = workflow(&host, source);
        let guard = wf.try_begin().expect("idle");
        let bounds = GeoBounds::new(1.0, 2.0, 3.0, 4.0);

        let raw = wf.fetch(&guard, &bounds).await.expect("fetch");
        assert_eq!(raw, "<osm/>");
        assert_eq!(
            calls.lock().expect("lock").clone(),
            vec!["(nwr(1,2,3,4); node(w)->.x; <;); out meta;".to_string()]
        );
    }

    #[tokio::test]
    async fn fetch_failures_name_the_stage() {
        let host = Rc::new(RecordingHost::default());
        let wf = workflow(&host, ScriptedResource::default());
        let guard = wf.try_begin().expect("idle");
        let err = wf
            .fetch(&guard, &GeoBounds::new(0.0, 0.0, 1.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::Fetch { .. }));
        drop(guard);
        assert!(host.trigger_enabled());
    }
}
