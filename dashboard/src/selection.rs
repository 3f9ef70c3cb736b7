use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use nodewatch_shared::NodeRecord;
use tracing::{debug, info, warn};

use crate::api::TelemetryApi;
use crate::feed::TimeSeriesFeed;
use crate::scheduler::{PollHandle, Scheduler};
use crate::surface::{ChartRenderer, DetailPanel};

/// Identifies one opening of the detail view. A node selected twice gets two
/// different generations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub node_id: String,
    pub generation: u64,
}

/// Outcome of one detail poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailRefresh {
    Applied,
    /// The selection moved on while the request was in flight.
    Stale,
    Failed,
}

struct DetailState {
    current: Option<DetailRequest>,
    generation: u64,
    record: Option<NodeRecord>,
    panel: Box<dyn DetailPanel>,
    feed: TimeSeriesFeed,
}

impl DetailState {
    fn is_current(&self, request: &DetailRequest) -> bool {
        self.current.as_ref() == Some(request)
    }
}

fn lock(state: &Mutex<DetailState>) -> MutexGuard<'_, DetailState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns which node is selected and the detail view's polling lifecycle.
///
/// At most one recurring poll exists at any time, and it only exists while a
/// node is selected.
pub struct SelectionController<A: TelemetryApi> {
    api: Arc<A>,
    state: Arc<Mutex<DetailState>>,
    scheduler: Scheduler,
    poll: Option<PollHandle>,
    interval: Duration,
    history_limit: usize,
}

impl<A: TelemetryApi> SelectionController<A> {
    pub fn new(
        api: Arc<A>,
        panel: Box<dyn DetailPanel>,
        renderer: Arc<dyn ChartRenderer>,
        interval: Duration,
        history_limit: usize,
    ) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(DetailState {
                current: None,
                generation: 0,
                record: None,
                panel,
                feed: TimeSeriesFeed::new(renderer),
            })),
            scheduler: Scheduler::new(),
            poll: None,
            interval,
            history_limit,
        }
    }

    /// Open the detail view for `id`, replacing any current selection.
    ///
    /// Polls immediately and then every interval. Must be called from within
    /// a tokio runtime.
    pub fn select(&mut self, id: &str) {
        self.select_with(id, None);
    }

    /// Like [`select`](Self::select), seeding the snapshot fields from
    /// `record` so the first poll already shows them.
    pub fn select_with(&mut self, id: &str, record: Option<&NodeRecord>) {
        if self.is_polling() && self.selected().as_deref() == Some(id) {
            if let Some(record) = record {
                self.note_record(record);
            }
            return;
        }

        self.stop_polling();
        let request = {
            let mut state = lock(&self.state);
            state.generation += 1;
            let request = DetailRequest {
                node_id: id.to_string(),
                generation: state.generation,
            };
            state.feed.reset();
            state.record = record.filter(|record| record.id == id).cloned();
            state.current = Some(request.clone());
            state.panel.open(id);
            request
        };
        info!(node = %id, generation = request.generation, "opened node detail");

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let limit = self.history_limit;
        self.poll = Some(self.scheduler.every(self.interval, move || {
            let api = Arc::clone(&api);
            let state = Arc::clone(&state);
            let request = request.clone();
            async move {
                refresh_detail(api.as_ref(), &state, &request, limit).await;
            }
        }));
    }

    /// Close the detail view. No-op when nothing is selected.
    pub fn deselect(&mut self) {
        self.stop_polling();
        let mut state = lock(&self.state);
        if let Some(previous) = state.current.take() {
            state.record = None;
            state.feed.reset();
            state.panel.close();
            info!(node = %previous.node_id, "closed node detail");
        }
    }

    /// Keep the latest snapshot entry for the selected node. Entries for any
    /// other node are ignored.
    pub fn note_record(&self, record: &NodeRecord) {
        let mut state = lock(&self.state);
        if state
            .current
            .as_ref()
            .is_some_and(|current| current.node_id == record.id)
        {
            state.record = Some(record.clone());
        }
    }

    pub fn selected(&self) -> Option<String> {
        lock(&self.state)
            .current
            .as_ref()
            .map(|request| request.node_id.clone())
    }

    pub fn current_request(&self) -> Option<DetailRequest> {
        lock(&self.state).current.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(PollHandle::is_active)
    }

    /// Recurring detail polls currently armed by this controller.
    pub fn active_pollers(&self) -> usize {
        self.scheduler.active()
    }

    /// One guarded poll for whatever is selected right now.
    pub fn refresh_once(&self) -> impl Future<Output = DetailRefresh> + Send + use<A> {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let request = self.current_request();
        let limit = self.history_limit;
        async move {
            match request {
                Some(request) => refresh_detail(api.as_ref(), &state, &request, limit).await,
                None => DetailRefresh::Stale,
            }
        }
    }

    fn stop_polling(&mut self) {
        if let Some(mut poll) = self.poll.take() {
            poll.cancel();
        }
    }
}

async fn refresh_detail<A: TelemetryApi>(
    api: &A,
    state: &Mutex<DetailState>,
    request: &DetailRequest,
    limit: usize,
) -> DetailRefresh {
    let result = TimeSeriesFeed::load_history(api, &request.node_id, limit).await;

    let mut state = lock(state);
    if !state.is_current(request) {
        debug!(
            node = %request.node_id,
            generation = request.generation,
            "discarding history for a previous selection"
        );
        return DetailRefresh::Stale;
    }

    match result {
        Ok(points) => {
            let fields = state.feed.render_series(&request.node_id, &points);
            let fields = fields.with_record(state.record.as_ref());
            state.panel.show_fields(&fields);
            DetailRefresh::Applied
        }
        Err(e) => {
            warn!(node = %request.node_id, error = %e, "failed to refresh node detail");
            DetailRefresh::Failed
        }
    }
}
