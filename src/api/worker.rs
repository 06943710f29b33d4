//! Background execution of service requests.
//!
//! The UI thread never awaits: it hands a request to [`ApiWorker`], which
//! runs it on a small tokio runtime and posts the outcome back through a
//! channel drained once per frame by [`ApiWorker::poll`].

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};
use uuid::Uuid;

use super::client::{ApiClient, ResourceHistogram};
use crate::error::{Error, Result};
use crate::model::leveling::{
    AlgorithmComparison, LevelingOptions, LevelingRequest, LevelingResult, LevelingTicket,
};
use crate::model::resource::{AssignmentRecord, Resource};
use crate::model::timeline::DateRange;
use crate::model::utilization::Granularity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourcesKey {
    pub program_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssignmentsKey {
    pub resource_id: Uuid,
    pub range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistogramKey {
    pub resource_id: Uuid,
    pub range: DateRange,
    pub granularity: Granularity,
}

#[derive(Debug)]
pub enum LevelingOutcome {
    Result(LevelingResult),
    Comparison(AlgorithmComparison),
    Applied(usize),
}

/// A finished request, tagged with the parameters it was issued for.
#[derive(Debug)]
pub enum ApiEvent {
    Resources {
        key: ResourcesKey,
        result: Result<Vec<Resource>>,
    },
    Assignments {
        key: AssignmentsKey,
        result: Result<Vec<AssignmentRecord>>,
    },
    Histogram {
        key: HistogramKey,
        result: Result<ResourceHistogram>,
    },
    Leveling {
        ticket: LevelingTicket,
        result: Result<LevelingOutcome>,
    },
    AssignmentDeleted {
        resource_id: Uuid,
        assignment_id: Uuid,
        result: Result<()>,
    },
}

pub struct ApiWorker {
    runtime: Runtime,
    client: Arc<ApiClient>,
    tx: UnboundedSender<ApiEvent>,
    rx: UnboundedReceiver<ApiEvent>,
    repaint: Option<egui::Context>,
}

impl ApiWorker {
    pub fn new(client: ApiClient) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("resource-gantt-io")
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;
        let (tx, rx) = unbounded_channel();
        info!(base_url = client.base_url(), "API worker started");
        Ok(Self {
            runtime,
            client: Arc::new(client),
            tx,
            rx,
            repaint: None,
        })
    }

    /// Wake the UI whenever a response arrives.
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    /// Drain every response that has arrived since the last frame.
    pub fn poll(&mut self) -> Vec<ApiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn spawn<F, Fut>(&self, job: F)
    where
        F: FnOnce(Arc<ApiClient>) -> Fut,
        Fut: Future<Output = ApiEvent> + Send + 'static,
    {
        let fut = job(Arc::clone(&self.client));
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        self.runtime.spawn(async move {
            let event = fut.await;
            if tx.send(event).is_err() {
                debug!("response arrived after the view closed");
            }
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }

    pub fn fetch_resources(&self, key: ResourcesKey) {
        self.spawn(move |client| async move {
            let result = client.list_resources(key.program_id).await;
            ApiEvent::Resources { key, result }
        });
    }

    pub fn fetch_assignments(&self, key: AssignmentsKey) {
        self.spawn(move |client| async move {
            let result = client.list_assignments(key.resource_id).await;
            ApiEvent::Assignments { key, result }
        });
    }

    pub fn fetch_histogram(&self, key: HistogramKey) {
        self.spawn(move |client| async move {
            let result = client
                .get_resource_histogram(
                    key.resource_id,
                    key.range.start(),
                    key.range.end(),
                    key.granularity,
                )
                .await;
            ApiEvent::Histogram { key, result }
        });
    }

    pub fn delete_assignment(&self, resource_id: Uuid, assignment_id: Uuid) {
        self.spawn(move |client| async move {
            let result = client.delete_assignment(assignment_id).await;
            ApiEvent::AssignmentDeleted {
                resource_id,
                assignment_id,
                result,
            }
        });
    }

    /// Run a leveling request; `shift_ids` is only read by [`LevelingRequest::Apply`].
    pub fn leveling(
        &self,
        ticket: LevelingTicket,
        program_id: Uuid,
        options: LevelingOptions,
        shift_ids: Vec<Uuid>,
    ) {
        self.spawn(move |client| async move {
            let result = match ticket.request {
                LevelingRequest::Preview => client
                    .preview_leveling(program_id, &options)
                    .await
                    .map(LevelingOutcome::Result),
                LevelingRequest::RunSerial => client
                    .run_leveling(program_id, &options)
                    .await
                    .map(LevelingOutcome::Result),
                LevelingRequest::RunParallel => client
                    .run_parallel_leveling(program_id, &options)
                    .await
                    .map(LevelingOutcome::Result),
                LevelingRequest::Compare => client
                    .compare_leveling_algorithms(program_id, &options)
                    .await
                    .map(LevelingOutcome::Comparison),
                LevelingRequest::Apply => client
                    .apply_leveling(program_id, &shift_ids)
                    .await
                    .map(|()| LevelingOutcome::Applied(shift_ids.len())),
            };
            ApiEvent::Leveling { ticket, result }
        });
    }
}
