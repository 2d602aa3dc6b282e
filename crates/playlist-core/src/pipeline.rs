//! The provisioning steps that run once a playlist exists.
//!
//! Creation of the playlist and discovery of a screen are the two steps whose
//! failure ends the run; they return errors. Everything after them is
//! best-effort: each step's outcome is logged and recorded and the next step
//! runs regardless.

use crate::config::{Config, PlaylistConfig};
use crate::error::{Result, TransportError};
use crate::locator;
use crate::reconcile::AttachmentKind;
use crate::routes;
use crate::schedule::ScheduleWindow;
use crate::transport::{Body, Session, Transport};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Step / StepOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    AttachFile,
    AttachScreen,
    SetSchedule,
    AddUrlItem,
    Publish,
    PollOverview,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::AttachFile => "attach file",
            Step::AttachScreen => "attach screen",
            Step::SetSchedule => "set schedule",
            Step::AddUrlItem => "add url item",
            Step::Publish => "publish",
            Step::PollOverview => "poll overview",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Succeeded,
    /// Carries the backend's response body verbatim when there was one.
    Failed(String),
}

impl StepOutcome {
    pub fn from_error(e: &TransportError) -> Self {
        StepOutcome::Failed(e.body().map_or_else(|| e.to_string(), str::to_string))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

// ---------------------------------------------------------------------------
// Fatal-class steps
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlaylistRequest<'a> {
    name: &'a str,
    share_of_voice: f64,
    description: Option<&'a str>,
}

/// Create the playlist and return the id the backend assigned.
pub fn create_playlist<T: Transport + ?Sized>(
    session: &Session<'_, T>,
    config: &PlaylistConfig,
) -> Result<Uuid> {
    let request = CreatePlaylistRequest {
        name: &config.name,
        share_of_voice: config.share_of_voice,
        description: config.description.as_deref(),
    };
    let body = session.post(routes::PLAYLISTS, &[], Body::Json(json!(request)))?;
    let id = locator::created_id(&body).ok_or_else(|| TransportError::Decode {
        path: routes::PLAYLISTS.to_string(),
        reason: "response has no playlist id".to_string(),
    })?;
    info!(%id, name = %config.name, "playlist created");
    Ok(id)
}

/// Pick the first screen from the inventory.
pub fn discover_screen<T: Transport + ?Sized>(
    session: &Session<'_, T>,
    page_size: u32,
) -> std::result::Result<Uuid, String> {
    let query = [
        ("skipCount", "0".to_string()),
        ("maxResultCount", page_size.to_string()),
    ];
    let items = locator::list_items(session, routes::SCREENS, &query).map_err(|e| e.to_string())?;
    let id = items
        .iter()
        .find_map(|item| item.id())
        .ok_or_else(|| "no screens returned".to_string())?;
    info!(screen_id = %id, "using screen");
    Ok(id)
}

// ---------------------------------------------------------------------------
// Best-effort steps
// ---------------------------------------------------------------------------

/// Identifiers produced by earlier steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provisioned {
    pub playlist_id: Uuid,
    pub asset_id: Uuid,
    pub screen_id: Uuid,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub steps: Vec<StepRecord>,
    pub overview: Option<Value>,
}

pub struct Pipeline<'r, 'a, T: Transport + ?Sized> {
    session: &'r Session<'a, T>,
    config: &'r Config,
    report: PipelineReport,
}

impl<'r, 'a, T: Transport + ?Sized> Pipeline<'r, 'a, T> {
    pub fn new(session: &'r Session<'a, T>, config: &'r Config) -> Self {
        Self {
            session,
            config,
            report: PipelineReport::default(),
        }
    }

    /// Run every best-effort step in order. `now` opens the schedule window.
    pub fn run(mut self, ids: &Provisioned, now: DateTime<Utc>) -> PipelineReport {
        let playlist_id = ids.playlist_id;

        let r = self.attach(AttachmentKind::File, playlist_id, ids.asset_id);
        self.attempt(Step::AttachFile, r);

        let r = self.attach(AttachmentKind::Screen, playlist_id, ids.screen_id);
        self.attempt(Step::AttachScreen, r);

        match ScheduleWindow::starting_at(now, &self.config.schedule) {
            Ok(window) => {
                let r = self
                    .session
                    .put(&routes::playlist_calendar(playlist_id), &window.calendar_body());
                self.attempt(Step::SetSchedule, r);
            }
            Err(e) => {
                warn!(step = Step::SetSchedule.label(), error = %e, "step failed");
                self.record(Step::SetSchedule, StepOutcome::Failed(e.to_string()));
            }
        }

        let item = &self.config.url_item;
        let r = self.session.post(
            routes::PLAYLIST_URLS,
            &[("playlistId", playlist_id.to_string())],
            Body::Json(json!({
                "name": item.name,
                "value": item.value,
                "duration": item.duration_secs,
            })),
        );
        self.attempt(Step::AddUrlItem, r);

        let r = self
            .session
            .post(&routes::playlist_publish(playlist_id), &[], Body::Empty);
        self.attempt(Step::Publish, r);

        if self.config.poll_delay_secs > 0 {
            info!(secs = self.config.poll_delay_secs, "waiting before overview poll");
            std::thread::sleep(Duration::from_secs(self.config.poll_delay_secs));
        }
        let r = self.poll_overview(ids.screen_id, Utc::now());
        self.report.overview = self.attempt(Step::PollOverview, r);

        self.report
    }

    fn attach(&self, kind: AttachmentKind, playlist_id: Uuid, target: Uuid) -> Result<()> {
        self.session.put(
            &kind.replace_batch_path(playlist_id),
            &json!({ kind.replace_key(): [target] }),
        )
    }

    fn poll_overview(&self, screen_id: Uuid, at: DateTime<Utc>) -> Result<Value> {
        self.session.get_report(
            routes::POP_OVERVIEW,
            &[
                ("ScreenId", screen_id.to_string()),
                ("Year", at.year().to_string()),
                ("Month", at.month().to_string()),
            ],
        )
    }

    fn attempt<R>(&mut self, step: Step, result: Result<R>) -> Option<R> {
        let (outcome, value) = match result {
            Ok(value) => {
                info!(step = step.label(), "step succeeded");
                (StepOutcome::Succeeded, Some(value))
            }
            Err(e) => {
                warn!(step = step.label(), error = %e, "step failed");
                (StepOutcome::from_error(&e), None)
            }
        };
        self.record(step, outcome);
        value
    }

    fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.report.steps.push(StepRecord { step, outcome });
    }
}
