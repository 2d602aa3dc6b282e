//! One end-to-end publish run.
//!
//! ```text
//! input check → authenticate → screen discovery → file (reuse | upload)
//!     → reconcile existing playlists → create playlist → best-effort steps
//! ```
//!
//! Screen discovery runs right after authentication so that an empty
//! inventory ends the run before anything on the backend is created,
//! replaced or deleted.

use crate::asset::{self, Asset};
use crate::config::Config;
use crate::error::FatalError;
use crate::locator;
use crate::pipeline::{self, Pipeline, Provisioned, StepRecord};
use crate::reconcile::{self, ReconcileReport};
use crate::routes;
use crate::transport::{Session, Transport};
use chrono::Utc;
use serde_json::Value;
use std::path::Path;
use tracing::{error, info, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ExitStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    FatalInputMissing,
    FatalAuth,
    FatalAssetAcquisition,
    FatalResourceCreation,
    /// The screen inventory is queried right after authentication, so this
    /// status is reached before any file is uploaded or any playlist is
    /// deleted or created, unlike runs that look for a screen only after
    /// the playlist exists.
    FatalScreenDiscovery,
}

impl ExitStatus {
    /// Process exit code. 1 is left to the CLI for setup errors.
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::FatalInputMissing => 2,
            ExitStatus::FatalAuth => 3,
            ExitStatus::FatalAssetAcquisition => 4,
            ExitStatus::FatalResourceCreation => 5,
            ExitStatus::FatalScreenDiscovery => 6,
        }
    }
}

impl FatalError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            FatalError::InputMissing(_) => ExitStatus::FatalInputMissing,
            FatalError::Auth(_) => ExitStatus::FatalAuth,
            FatalError::AssetAcquisition(_) => ExitStatus::FatalAssetAcquisition,
            FatalError::ResourceCreation(_) => ExitStatus::FatalResourceCreation,
            FatalError::ScreenDiscovery(_) => ExitStatus::FatalScreenDiscovery,
        }
    }
}

// ---------------------------------------------------------------------------
// RunReport / RunOutcome
// ---------------------------------------------------------------------------

/// Everything a run produced, up to the point where it stopped.
#[derive(Debug, Default)]
pub struct RunReport {
    pub screen_id: Option<Uuid>,
    pub asset: Option<Asset>,
    pub reconciled: Vec<ReconcileReport>,
    pub playlist_id: Option<Uuid>,
    pub steps: Vec<StepRecord>,
    pub overview: Option<Value>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub fatal: Option<FatalError>,
}

impl RunOutcome {
    pub fn exit_status(&self) -> ExitStatus {
        self.fatal
            .as_ref()
            .map_or(ExitStatus::Success, FatalError::exit_status)
    }

    pub fn failed_steps(&self) -> usize {
        self.report
            .steps
            .iter()
            .filter(|r| !r.outcome.is_success())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: &'a Config,
}

impl<'a, T: Transport + ?Sized> Orchestrator<'a, T> {
    pub fn new(transport: &'a T, config: &'a Config) -> Self {
        Self { transport, config }
    }

    pub fn run(&self) -> RunOutcome {
        let mut report = RunReport::default();
        let fatal = self.execute(&mut report).err();
        if let Some(e) = &fatal {
            error!(error = %e, "run aborted");
        }
        RunOutcome { report, fatal }
    }

    fn execute(&self, report: &mut RunReport) -> Result<(), FatalError> {
        let media_path = self.config.media_path.as_path();
        let file_name = media_file_name(media_path)
            .ok_or_else(|| FatalError::InputMissing(media_path.to_path_buf()))?;

        let token = self
            .transport
            .authenticate(&self.config.credential)
            .map_err(FatalError::Auth)?;
        let session = Session::new(self.transport, token);
        info!(tenant = %session.token().tenant, "token acquired");

        let screen_id = pipeline::discover_screen(&session, self.config.screen_page_size)
            .map_err(FatalError::ScreenDiscovery)?;
        report.screen_id = Some(screen_id);

        let asset = asset::acquire(&session, file_name, media_path)
            .map_err(FatalError::AssetAcquisition)?;
        report.asset = Some(asset);

        let name = &self.config.playlist.name;
        for existing in self.existing_playlists(&session, name) {
            info!(playlist_id = %existing, name = %name, "playlist exists; cleaning up");
            report
                .reconciled
                .push(reconcile::reconcile(&session, existing));
        }

        let playlist_id = pipeline::create_playlist(&session, &self.config.playlist)
            .map_err(FatalError::ResourceCreation)?;
        report.playlist_id = Some(playlist_id);

        let ids = Provisioned {
            playlist_id,
            asset_id: asset.id,
            screen_id,
        };
        let result = Pipeline::new(&session, self.config).run(&ids, Utc::now());
        report.steps = result.steps;
        report.overview = result.overview;
        Ok(())
    }

    /// Every playlist on the first page whose name matches; a failed query
    /// is treated as none.
    fn existing_playlists(&self, session: &Session<'_, T>, name: &str) -> Vec<Uuid> {
        let query = [
            ("Filter", name.to_string()),
            ("SkipCount", "0".to_string()),
            ("MaxResultCount", "10".to_string()),
        ];
        locator::find_all(session, routes::PLAYLISTS, &query, locator::name_eq(name))
            .unwrap_or_else(|e| {
                warn!(error = %e, "playlist lookup failed; treating as not found");
                Vec::new()
            })
    }
}

/// The upload name of the media file, if it exists as a regular file.
fn media_file_name(path: &Path) -> Option<&str> {
    if !path.is_file() {
        return None;
    }
    path.file_name().and_then(|n| n.to_str())
}
