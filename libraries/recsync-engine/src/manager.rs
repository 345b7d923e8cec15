use crate::error::{Result, SyncError};
use crate::importer::{RecordImporter, StoragePaths};
use crate::periods::{non_recorded_periods, BUCKET_LENGTH_MINUTES};
use crate::scanner::{add_mode_filter, gap_filter, replacement_filter, CandidateScanner};
use crate::selector::pick_best;
use crate::server_order::ServerOrder;
use crate::tracker::ImportedSet;
use crate::types::{ImportOutcome, SyncPhase, SyncProgress, SyncSummary, SyncTally};
use crate::window::resolve_window;
use chrono::NaiveDateTime;
use recsync_core::parameters::{
    import_order_key, is_enabled, processing_key, sync_task_type, BAND_PROCESSING, SERVER_NUMBER,
    VIDEO_PROCESSING,
};
use recsync_core::types::{
    Period, Record, RecordColumn, RecordCondition, RecordFilter, RecordFlag, ServerId, StreamId,
    StreamType, SyncRequest, TaskId, TaskOutcome, TaskRegistration,
};
use recsync_core::{FileMover, MetadataService, RecordStore, RemoteServers};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Records shorter than this many minutes are problem records
pub const PROBLEM_DURATION_MINUTES: f64 = 61.0;
/// Records rated below this are problem records
pub const PROBLEM_RATE: f64 = 1.0;

const PROBLEMS_START_PERCENT: f64 = 1.0;
const GAPS_START_PERCENT: f64 = 50.0;
const DONE_PERCENT: f64 = 100.0;

/// Tunables of a sync run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Bound on every remote query; a slow server yields no candidates
    pub remote_query_timeout: Duration,
    /// Gaps shorter than this are not worth a remote round trip
    pub min_gap: Duration,
    /// Pause before the first item, leaving room to abort
    pub start_delay: Duration,
    pub local_root: PathBuf,
    pub remote_root_template: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote_query_timeout: Duration::from_secs(30),
            min_gap: Duration::from_secs(20),
            start_delay: Duration::ZERO,
            local_root: PathBuf::from("/home/neurotime/stream_analyse/recording"),
            remote_root_template: "/mnt/fs_svr{server}/recording".to_string(),
        }
    }
}

/// Problem records of a run: approved, but short or poorly rated
pub fn problem_filter(window: &Period, request: &SyncRequest) -> RecordFilter {
    RecordFilter::new()
        .with(RecordCondition::StartedAfter(window.start))
        .with(RecordCondition::StartedBefore(window.end))
        .with_opt(request.stream_id.map(RecordCondition::StreamIs))
        .with(RecordCondition::StreamTypeIs(request.stream_type))
        .with(RecordCondition::Flag(RecordFlag::Approved, true))
        .with(RecordCondition::AnyOf(vec![
            RecordCondition::DurationBelow(PROBLEM_DURATION_MINUTES),
            RecordCondition::RateBelow(PROBLEM_RATE),
        ]))
        .order_by(RecordColumn::StartedAt, false)
        .order_by(RecordColumn::StreamId, false)
}

/// Local rows imported earlier, which seed the tracker
pub fn history_filter(window: &Period, request: &SyncRequest) -> RecordFilter {
    RecordFilter::new()
        .with(RecordCondition::StartedAfter(window.start))
        .with(RecordCondition::StartedBefore(window.end))
        .with_opt(request.stream_id.map(RecordCondition::StreamIs))
        .with(RecordCondition::StreamTypeIs(request.stream_type))
        .with(RecordCondition::AnyOf(vec![
            RecordCondition::Flag(RecordFlag::Approved, true),
            RecordCondition::Flag(RecordFlag::Checked, true),
        ]))
        .with(RecordCondition::HasImportedRecord)
}

/// Approved coverage of one stream, reaching one bucket back before the
/// window so a record straddling its start counts
pub fn coverage_filter(window: &Period, stream_id: StreamId) -> RecordFilter {
    RecordFilter::new()
        .with(RecordCondition::StreamIs(stream_id))
        .with(RecordCondition::Flag(RecordFlag::Approved, true))
        .with(RecordCondition::StartedAfter(
            window.start - chrono::Duration::minutes(BUCKET_LENGTH_MINUTES),
        ))
        .with(RecordCondition::StartedBefore(window.end))
        .order_by(RecordColumn::StartedAt, false)
}

/// Mutable state of one run
struct RunState {
    task_id: Option<TaskId>,
    tracker: ImportedSet,
    tally: SyncTally,
    processed: usize,
    total: usize,
    cancelled: bool,
    /// Last published completion percentage
    percentage: f64,
    stream_names: HashMap<StreamId, String>,
}

/// Orchestrates a sync run over injected capabilities
pub struct SyncManager {
    store: Arc<dyn RecordStore>,
    remotes: Arc<dyn RemoteServers>,
    metadata: Arc<dyn MetadataService>,
    mover: Arc<dyn FileMover>,
    settings: SyncSettings,
}

impl SyncManager {
    pub fn new(
        store: Arc<dyn RecordStore>,
        remotes: Arc<dyn RemoteServers>,
        metadata: Arc<dyn MetadataService>,
        mover: Arc<dyn FileMover>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            remotes,
            metadata,
            mover,
            settings,
        }
    }

    /// Start a run in the background.
    ///
    /// Progress snapshots arrive on the returned receiver; the handle yields
    /// the summary once the run finishes.
    pub fn start(
        self: Arc<Self>,
        request: SyncRequest,
        now: NaiveDateTime,
        cancel: CancellationToken,
    ) -> (
        mpsc::Receiver<SyncProgress>,
        JoinHandle<Result<SyncSummary>>,
    ) {
        let (tx, rx) = mpsc::channel(100);

        let handle =
            tokio::spawn(async move { self.run(&request, now, &cancel, Some(&tx)).await });

        (rx, handle)
    }

    /// Run to completion.
    ///
    /// Errors only for failures that stop the run as a whole: bad request,
    /// missing configuration, a concurrent run, or a local store failure.
    /// Cancellation still returns a summary, flagged `cancelled`.
    pub async fn run(
        &self,
        request: &SyncRequest,
        now: NaiveDateTime,
        cancel: &CancellationToken,
        progress: Option<&mpsc::Sender<SyncProgress>>,
    ) -> Result<SyncSummary> {
        request.validate()?;
        let window = resolve_window(request.window, now);
        let clock = Instant::now();

        info!(
            window = %window,
            stream_type = %request.stream_type,
            stream_id = ?request.stream_id,
            sync = request.sync,
            add_mode = request.add_mode,
            "Starting records sync"
        );

        let local_server = self.local_server().await?;
        let order = self.resolve_order(request).await?;
        self.check_processing_enabled(request.stream_type).await?;

        let task_id = if request.sync && !request.no_task {
            let task_type = sync_task_type(request.stream_type);
            match self.metadata.create_task(&task_type, true).await? {
                TaskRegistration::Created(id) => {
                    info!(task_id = id, task_type = %task_type, "Task registered");
                    Some(id)
                }
                TaskRegistration::AlreadyRunning => {
                    warn!(task_type = %task_type, "Another records sync is running");
                    return Err(SyncError::AlreadyRunning(request.stream_type));
                }
            }
        } else {
            None
        };

        let mut state = RunState {
            task_id,
            tracker: ImportedSet::new(),
            tally: SyncTally::default(),
            processed: 0,
            total: 0,
            cancelled: false,
            percentage: 0.0,
            stream_names: HashMap::new(),
        };

        let outcome = self
            .process(request, &window, &order, local_server, cancel, &mut state, progress)
            .await;

        if let Some(task_id) = state.task_id {
            let task_outcome = match &outcome {
                Ok(()) if state.cancelled => TaskOutcome::Cancelled,
                Ok(()) => TaskOutcome::Completed,
                Err(_) => TaskOutcome::Failed,
            };
            if let Err(e) = self.metadata.finish_task(task_id, task_outcome).await {
                warn!(task_id, error = %e, "Failed to finish task");
            }
        }

        if let Err(e) = outcome {
            error!(error = %e, "Records sync failed");
            return Err(e);
        }

        let elapsed = clock.elapsed();
        let summary = SyncSummary {
            local_server,
            task_id: state.task_id,
            window,
            stream_id: request.stream_id,
            stream_type: request.stream_type,
            sync: request.sync,
            add_mode: request.add_mode,
            processed_items: state.processed,
            tally: state.tally,
            cancelled: state.cancelled,
            started_at: now,
            finished_at: now
                + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero()),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        };

        info!(
            processed = summary.processed_items,
            updated = summary.tally.updated,
            no_need = summary.tally.no_need,
            no_find = summary.tally.no_find,
            no_success = summary.tally.no_success,
            cancelled = summary.cancelled,
            elapsed_ms = summary.elapsed_ms,
            "Records sync finished"
        );

        let percentage = if state.cancelled {
            state.percentage
        } else {
            DONE_PERCENT
        };
        self.publish(&mut state, SyncPhase::Done, percentage, None, progress)
            .await;

        Ok(summary)
    }

    async fn local_server(&self) -> Result<ServerId> {
        let value = self.metadata.get_parameter(SERVER_NUMBER).await?;
        value
            .as_deref()
            .map(str::trim)
            .and_then(|v| v.parse::<ServerId>().ok())
            .ok_or_else(|| {
                SyncError::configuration(format!(
                    "parameter `{}` is missing or not a number: {:?}",
                    SERVER_NUMBER, value
                ))
            })
    }

    async fn resolve_order(&self, request: &SyncRequest) -> Result<ServerOrder> {
        let default_order = self
            .metadata
            .get_parameter(&import_order_key(request.stream_type))
            .await?
            .unwrap_or_default();
        let streams = self
            .store
            .select_streams(request.stream_type, request.stream_id)
            .await?;

        let order = ServerOrder::resolve(&default_order, &streams);
        if order.is_empty() {
            return Err(SyncError::configuration(format!(
                "no server import order for {} streams",
                request.stream_type
            )));
        }

        for (stream_id, servers) in order.iter() {
            debug!(stream_id, servers = ?servers, "Import order");
        }
        Ok(order)
    }

    async fn check_processing_enabled(&self, stream_type: StreamType) -> Result<()> {
        let enabled = match stream_type {
            StreamType::Video => {
                self.flag(VIDEO_PROCESSING).await? || self.flag(BAND_PROCESSING).await?
            }
            StreamType::Audio => self.flag(&processing_key(stream_type)).await?,
        };

        if enabled {
            Ok(())
        } else {
            Err(SyncError::configuration(format!(
                "this server does not process {} streams",
                stream_type
            )))
        }
    }

    async fn flag(&self, key: &str) -> Result<bool> {
        let value = self.metadata.get_parameter(key).await?;
        Ok(is_enabled(value.as_deref()))
    }

    async fn process(
        &self,
        request: &SyncRequest,
        window: &Period,
        order: &ServerOrder,
        local_server: ServerId,
        cancel: &CancellationToken,
        state: &mut RunState,
        progress: Option<&mpsc::Sender<SyncProgress>>,
    ) -> Result<()> {
        self.publish(state, SyncPhase::Init, PROBLEMS_START_PERCENT, None, progress)
            .await;
        self.publish(
            state,
            SyncPhase::ResolveOrder,
            PROBLEMS_START_PERCENT,
            Some(format!("{} streams", order.len())),
            progress,
        )
        .await;

        if !self.settings.start_delay.is_zero() {
            info!(delay = ?self.settings.start_delay, "Waiting before processing");
            tokio::select! {
                () = tokio::time::sleep(self.settings.start_delay) => {}
                () = cancel.cancelled() => {
                    state.cancelled = true;
                    return Ok(());
                }
            }
        }

        let scanner = CandidateScanner::new(
            Arc::clone(&self.remotes),
            self.settings.remote_query_timeout,
        );
        let importer = RecordImporter::new(
            Arc::clone(&self.store),
            Arc::clone(&self.mover),
            StoragePaths::new(
                self.settings.local_root.clone(),
                self.settings.remote_root_template.clone(),
            )
            .with_local_server(local_server),
            request.sync,
        );

        let history = self
            .store
            .select_records(&history_filter(window, request))
            .await?;
        state.tracker = ImportedSet::from_history(&history);
        debug!(local_server, known_imports = state.tracker.len(), "Import history loaded");

        // Problem records
        let problems = self
            .store
            .select_records(&problem_filter(window, request))
            .await?;
        info!(count = problems.len(), "Problem records found");
        state.total = problems.len();

        for (i, record) in problems.iter().enumerate() {
            if cancel.is_cancelled() {
                state.cancelled = true;
                return Ok(());
            }

            let label = self.item_label(state, record.stream_id, &record.interval()).await;
            let outcome = self
                .process_problem(&scanner, &importer, order, request.stream_type, record, state)
                .await;
            info!(item = %label, record_id = record.id, outcome = %outcome, "Problem record processed");
            state.tally.record(outcome);
            state.processed += 1;

            let percent = span(PROBLEMS_START_PERCENT, GAPS_START_PERCENT, i + 1, problems.len());
            self.publish(state, SyncPhase::ProcessProblems, percent, Some(label), progress)
                .await;
        }

        // Gaps, recomputed after the problem pass
        let gaps = self.collect_gaps(window, order).await;
        info!(count = gaps.len(), "Non-recorded periods found");
        state.total += gaps.len();

        for (i, gap) in gaps.iter().enumerate() {
            if cancel.is_cancelled() {
                state.cancelled = true;
                return Ok(());
            }

            let stream_id = gap.stream_id.unwrap_or_default();
            let label = self.item_label(state, stream_id, gap).await;
            let outcome = self
                .process_gap(&scanner, &importer, order, request, stream_id, gap, state)
                .await;
            info!(item = %label, outcome = %outcome, "Gap processed");
            state.tally.record(outcome);
            state.processed += 1;

            let percent = span(GAPS_START_PERCENT, DONE_PERCENT, i + 1, gaps.len());
            self.publish(state, SyncPhase::ProcessGaps, percent, Some(label), progress)
                .await;
        }

        self.publish(state, SyncPhase::Report, DONE_PERCENT, None, progress)
            .await;
        Ok(())
    }

    async fn process_problem(
        &self,
        scanner: &CandidateScanner,
        importer: &RecordImporter,
        order: &ServerOrder,
        stream_type: StreamType,
        record: &Record,
        state: &mut RunState,
    ) -> ImportOutcome {
        if state.tracker.is_superseded(record.id) {
            return ImportOutcome::NoNeed;
        }

        let servers = order.servers_for(record.stream_id);
        let results = scanner
            .scan_all(servers, &replacement_filter(record, stream_type))
            .await;

        match pick_best(results, &record.interval()) {
            Some(best) => {
                debug!(server_id = best.server_id, remote_id = best.record.id, score = best.score, "Replacement selected");
                importer
                    .import(&mut state.tracker, best.server_id, &best.record, Some(record.id))
                    .await
            }
            None => ImportOutcome::NoFind,
        }
    }

    async fn process_gap(
        &self,
        scanner: &CandidateScanner,
        importer: &RecordImporter,
        order: &ServerOrder,
        request: &SyncRequest,
        stream_id: StreamId,
        gap: &Period,
        state: &mut RunState,
    ) -> ImportOutcome {
        let too_short = gap
            .duration()
            .to_std()
            .map_or(true, |d| d < self.settings.min_gap);
        if too_short {
            return ImportOutcome::NoNeed;
        }

        let servers = order.servers_for(stream_id);
        let results = scanner
            .scan_all(servers, &gap_filter(gap, stream_id, request.stream_type))
            .await;

        if let Some(best) = pick_best(results, gap) {
            debug!(server_id = best.server_id, remote_id = best.record.id, score = best.score, "Gap candidate selected");
            return importer
                .import(&mut state.tracker, best.server_id, &best.record, None)
                .await;
        }

        if !request.add_mode {
            return ImportOutcome::NoFind;
        }

        let filter = add_mode_filter(gap, stream_id, request.stream_type);
        let Some((server_id, records)) = scanner.first_with_rows(servers, &filter).await else {
            return ImportOutcome::NoFind;
        };

        debug!(server_id, count = records.len(), "Add mode importing every match");
        let mut outcome = ImportOutcome::NoFind;
        let mut any_updated = false;
        for record in &records {
            outcome = importer
                .import(&mut state.tracker, server_id, record, None)
                .await;
            any_updated |= outcome == ImportOutcome::Updated;
        }

        if any_updated {
            ImportOutcome::Updated
        } else {
            outcome
        }
    }

    /// Bucketed gaps of every ordered stream, sorted by start then stream.
    ///
    /// A stream whose coverage cannot be read contributes no gaps.
    async fn collect_gaps(&self, window: &Period, order: &ServerOrder) -> Vec<Period> {
        let mut gaps = Vec::new();

        for (stream_id, _) in order.iter() {
            let recorded = match self
                .store
                .select_records(&coverage_filter(window, stream_id))
                .await
            {
                Ok(recorded) => recorded,
                Err(e) => {
                    warn!(stream_id, error = %e, "Failed to read recorded periods, skipping stream");
                    continue;
                }
            };
            let intervals: Vec<Period> = recorded.iter().map(Record::interval).collect();

            gaps.extend(
                non_recorded_periods(&intervals, window.start, window.end)
                    .into_iter()
                    .map(|gap| gap.for_stream(stream_id)),
            );
        }

        gaps.sort_by_key(|gap| (gap.start, gap.stream_id));
        gaps
    }

    async fn item_label(&self, state: &mut RunState, stream_id: StreamId, period: &Period) -> String {
        if !state.stream_names.contains_key(&stream_id) {
            let name = match self.metadata.stream_name(stream_id).await {
                Ok(name) => name,
                Err(e) => {
                    debug!(stream_id, error = %e, "Stream name unavailable");
                    format!("stream {}", stream_id)
                }
            };
            state.stream_names.insert(stream_id, name);
        }

        let name = state
            .stream_names
            .get(&stream_id)
            .map_or("", String::as_str);
        format!("{} ({}) {}", name, stream_id, period)
    }

    /// Report progress to the task (until the run is done) and the channel
    async fn publish(
        &self,
        state: &mut RunState,
        phase: SyncPhase,
        percentage: f64,
        current_item: Option<String>,
        progress: Option<&mpsc::Sender<SyncProgress>>,
    ) {
        state.percentage = percentage;

        if let Some(task_id) = state.task_id.filter(|_| phase != SyncPhase::Done) {
            if let Err(e) = self
                .metadata
                .update_completion_percentage(task_id, percentage)
                .await
            {
                warn!(task_id, error = %e, "Failed to update task progress");
            }
        }

        if let Some(tx) = progress {
            let _ = tx
                .send(SyncProgress {
                    phase,
                    total_items: state.total,
                    processed_items: state.processed,
                    tally: state.tally,
                    current_item,
                    percentage,
                })
                .await;
        }
    }
}

/// Linear progress from `from` to `to` after `done` of `total` items
fn span(from: f64, to: f64, done: usize, total: usize) -> f64 {
    if total == 0 {
        return to;
    }
    from + (to - from) * done as f64 / total as f64
}
