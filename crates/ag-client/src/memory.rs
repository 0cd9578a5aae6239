//! In-memory backend
//!
//! Holds the four tables in process memory and enforces the same rules the
//! real backend does: unique usernames, foreign keys and the insert-shape
//! invariants. Tests drive it through call counters, one-shot fault
//! injection and hold latches that park a call until released.

use crate::{Backend, FetchError, FetchResult};
use ag_core::contract::{
    AnalysisStatus, AnalyzeImageRequest, AnalyzeImageResponse, PersistAnalysisRequest,
    SignInRequest, SignUpRequest,
};
use ag_core::{
    DiseaseReport, Insertable, NewDiseaseReport, NewPlantAnalysis, NewUser, NewUserFeedback,
    PlantAnalysis, PlantSeverity, ReportSeverity, User, UserFeedback, UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// One backend endpoint, used to address counters, faults and latches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SignIn,
    SignUp,
    SignOut,
    CurrentUser,
    AnalyzeImage,
    PersistAnalysis,
    ListAnalyses,
    ListDiseaseReports,
    CreateDiseaseReport,
    SubmitFeedback,
}

struct Diagnosis {
    name: &'static str,
    confidence: f64,
    status: AnalysisStatus,
    notes: &'static str,
}

const CATALOG: &[Diagnosis] = &[
    Diagnosis {
        name: "Healthy",
        confidence: 94.0,
        status: AnalysisStatus::Good,
        notes: "No signs of disease. Keep watering sparingly.",
    },
    Diagnosis {
        name: "Aloe Rust",
        confidence: 87.0,
        status: AnalysisStatus::Warning,
        notes: "Remove affected leaves and improve air circulation.",
    },
    Diagnosis {
        name: "Leaf Spot",
        confidence: 78.5,
        status: AnalysisStatus::Warning,
        notes: "Avoid overhead watering and apply a copper fungicide.",
    },
    Diagnosis {
        name: "Root Rot",
        confidence: 91.2,
        status: AnalysisStatus::Danger,
        notes: "Repot in dry, well-draining soil and trim soft roots.",
    },
    Diagnosis {
        name: "Sunburn",
        confidence: 82.3,
        status: AnalysisStatus::Warning,
        notes: "Move the plant to bright indirect light.",
    },
];

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    analyses: Vec<PlantAnalysis>,
    reports: Vec<DiseaseReport>,
    feedback: Vec<UserFeedback>,
    next_id: i64,
    session: Option<i64>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn insert_user(
        &mut self,
        new_user: &NewUser,
        created_at: Option<DateTime<Utc>>,
    ) -> FetchResult<User> {
        new_user.check().map_err(rejected)?;
        if self.users.iter().any(|u| u.username == new_user.username) {
            return Err(status(409, "Username already exists"));
        }
        let user = User {
            id: self.allocate_id(),
            username: new_user.username.clone(),
            password: digest(&new_user.password),
            email: new_user.email.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            created_at,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn insert_analysis(
        &mut self,
        new_analysis: &NewPlantAnalysis,
        created_at: Option<DateTime<Utc>>,
    ) -> FetchResult<PlantAnalysis> {
        new_analysis.check().map_err(rejected)?;
        if self.user(new_analysis.user_id).is_none() {
            return Err(status(400, "Unknown user"));
        }
        let analysis = PlantAnalysis {
            id: self.allocate_id(),
            user_id: new_analysis.user_id,
            image_path: new_analysis.image_path.clone(),
            diagnosis: new_analysis.diagnosis.clone(),
            confidence: new_analysis.confidence,
            severity: new_analysis.severity,
            description: new_analysis.description.clone(),
            treatment: new_analysis.treatment.clone(),
            is_healthy: new_analysis.is_healthy,
            created_at,
        };
        self.analyses.push(analysis.clone());
        Ok(analysis)
    }

    fn insert_report(
        &mut self,
        new_report: &NewDiseaseReport,
        created_at: Option<DateTime<Utc>>,
    ) -> FetchResult<DiseaseReport> {
        new_report.check().map_err(rejected)?;
        if self.user(new_report.user_id).is_none() {
            return Err(status(400, "Unknown user"));
        }
        let report = DiseaseReport {
            id: self.allocate_id(),
            user_id: new_report.user_id,
            location: new_report.location.clone(),
            disease: new_report.disease.clone(),
            severity: new_report.severity,
            description: new_report.description.clone(),
            latitude: new_report.latitude,
            longitude: new_report.longitude,
            created_at,
        };
        self.reports.push(report.clone());
        Ok(report)
    }
}

/// Backend held entirely in memory
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    calls: Mutex<HashMap<Operation, usize>>,
    faults: Mutex<HashMap<Operation, u16>>,
    holds: Mutex<HashMap<Operation, Arc<Notify>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with one demo account and a few records
    ///
    /// The account is `demo` with password `aloeguard`.
    pub fn seeded_demo() -> Self {
        let backend = Self::new();
        {
            let mut tables = lock(&backend.tables);
            if let Err(e) = seed(&mut tables) {
                warn!("Failed to seed demo data: {}", e);
            }
        }
        backend
    }

    /// Register a user directly, bypassing the call counters
    pub fn add_user(&self, new_user: &NewUser) -> FetchResult<UserProfile> {
        let mut tables = lock(&self.tables);
        let user = tables.insert_user(new_user, Some(Utc::now()))?;
        Ok(user.profile())
    }

    /// Store an analysis directly, bypassing the call counters
    pub fn add_analysis(&self, new_analysis: &NewPlantAnalysis) -> FetchResult<PlantAnalysis> {
        let mut tables = lock(&self.tables);
        tables.insert_analysis(new_analysis, Some(Utc::now()))
    }

    /// Number of calls made to one operation
    pub fn calls(&self, operation: Operation) -> usize {
        lock(&self.calls).get(&operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).values().sum()
    }

    /// Make the next call to `operation` fail with an HTTP status
    pub fn fail_next(&self, operation: Operation, status: u16) {
        lock(&self.faults).insert(operation, status);
    }

    /// Park the next call to `operation` until the returned latch is notified
    pub fn hold(&self, operation: Operation) -> Arc<Notify> {
        let latch = Arc::new(Notify::new());
        lock(&self.holds).insert(operation, Arc::clone(&latch));
        latch
    }

    pub fn feedback(&self) -> Vec<UserFeedback> {
        lock(&self.tables).feedback.clone()
    }

    pub fn signed_in_user(&self) -> Option<i64> {
        lock(&self.tables).session
    }

    async fn enter(&self, operation: Operation) -> FetchResult<()> {
        *lock(&self.calls).entry(operation).or_insert(0) += 1;
        debug!("memory backend: {:?}", operation);

        let latch = lock(&self.holds).remove(&operation);
        if let Some(latch) = latch {
            latch.notified().await;
        }

        match lock(&self.faults).remove(&operation) {
            Some(code) => Err(status(code, "Injected failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_in(&self, request: &SignInRequest) -> FetchResult<UserProfile> {
        self.enter(Operation::SignIn).await?;
        let mut tables = lock(&self.tables);
        let hashed = digest(&request.password);
        let profile = tables
            .users
            .iter()
            .find(|u| u.username == request.username && u.password == hashed)
            .map(User::profile)
            .ok_or_else(|| status(401, "Invalid credentials"))?;
        tables.session = Some(profile.id);
        Ok(profile)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> FetchResult<UserProfile> {
        self.enter(Operation::SignUp).await?;
        let mut tables = lock(&self.tables);
        let user = tables.insert_user(request, Some(Utc::now()))?;
        tables.session = Some(user.id);
        Ok(user.profile())
    }

    async fn sign_out(&self) -> FetchResult<()> {
        self.enter(Operation::SignOut).await?;
        lock(&self.tables).session = None;
        Ok(())
    }

    async fn current_user(&self) -> FetchResult<UserProfile> {
        self.enter(Operation::CurrentUser).await?;
        let tables = lock(&self.tables);
        tables
            .session
            .and_then(|id| tables.user(id))
            .map(User::profile)
            .ok_or_else(|| status(401, "Not authenticated"))
    }

    async fn analyze_image(&self, request: &AnalyzeImageRequest) -> FetchResult<AnalyzeImageResponse> {
        self.enter(Operation::AnalyzeImage).await?;
        if request.image_name.is_empty() {
            return Err(status(400, "Image name is required"));
        }
        Ok(diagnose(&request.image_name))
    }

    async fn persist_analysis(&self, request: &PersistAnalysisRequest) -> FetchResult<PlantAnalysis> {
        self.enter(Operation::PersistAnalysis).await?;
        let new_analysis = NewPlantAnalysis {
            user_id: request.user_id,
            image_path: request.image_path.clone(),
            diagnosis: request.diagnosis.clone(),
            confidence: request.confidence,
            severity: severity_for(request.status),
            description: if request.notes.is_empty() {
                None
            } else {
                Some(request.notes.clone())
            },
            treatment: None,
            is_healthy: request.status.is_healthy(),
        };
        lock(&self.tables).insert_analysis(&new_analysis, Some(Utc::now()))
    }

    async fn list_analyses(&self, user_id: i64) -> FetchResult<Vec<PlantAnalysis>> {
        self.enter(Operation::ListAnalyses).await?;
        let tables = lock(&self.tables);
        let mut analyses: Vec<_> = tables
            .analyses
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(analyses)
    }

    async fn list_disease_reports(&self) -> FetchResult<Vec<DiseaseReport>> {
        self.enter(Operation::ListDiseaseReports).await?;
        Ok(lock(&self.tables).reports.clone())
    }

    async fn create_disease_report(&self, report: &NewDiseaseReport) -> FetchResult<DiseaseReport> {
        self.enter(Operation::CreateDiseaseReport).await?;
        lock(&self.tables).insert_report(report, Some(Utc::now()))
    }

    async fn submit_feedback(&self, feedback: &NewUserFeedback) -> FetchResult<UserFeedback> {
        self.enter(Operation::SubmitFeedback).await?;
        feedback.check().map_err(rejected)?;

        let mut tables = lock(&self.tables);
        if tables.user(feedback.user_id).is_none() {
            return Err(status(400, "Unknown user"));
        }
        if !tables.analyses.iter().any(|a| a.id == feedback.analysis_id) {
            return Err(status(400, "Unknown analysis"));
        }
        let stored = UserFeedback {
            id: tables.allocate_id(),
            user_id: feedback.user_id,
            analysis_id: feedback.analysis_id,
            rating: feedback.rating,
            comment: feedback.comment.clone(),
            created_at: Some(Utc::now()),
        };
        tables.feedback.push(stored.clone());
        Ok(stored)
    }
}

/// Deterministic mock classification keyed on the image name
pub fn diagnose(image_name: &str) -> AnalyzeImageResponse {
    let hash = Sha256::digest(image_name.as_bytes());
    let entry = &CATALOG[usize::from(hash[0]) % CATALOG.len()];
    AnalyzeImageResponse {
        diagnosis: entry.name.to_string(),
        confidence: entry.confidence,
        status: entry.status,
        notes: entry.notes.to_string(),
    }
}

fn severity_for(status: AnalysisStatus) -> Option<PlantSeverity> {
    match status {
        AnalysisStatus::Good => Some(PlantSeverity::Low),
        AnalysisStatus::Warning => Some(PlantSeverity::Moderate),
        AnalysisStatus::Danger => Some(PlantSeverity::High),
        AnalysisStatus::Unknown => None,
    }
}

fn seed(tables: &mut Tables) -> FetchResult<()> {
    let demo = tables.insert_user(
        &NewUser {
            username: "demo".to_string(),
            password: "aloeguard".to_string(),
            email: Some("demo@aloeguard.app".to_string()),
            first_name: Some("Demo".to_string()),
            last_name: Some("Grower".to_string()),
        },
        day(2024, 1, 15),
    )?;

    for (image, date) in [
        ("kitchen-aloe.jpg", day(2024, 5, 2)),
        ("porch-aloe.jpg", day(2024, 5, 20)),
        ("greenhouse-row3.jpg", day(2024, 6, 11)),
    ] {
        let result = diagnose(image);
        let new_analysis = NewPlantAnalysis {
            user_id: demo.id,
            image_path: image.to_string(),
            diagnosis: result.diagnosis,
            confidence: result.confidence,
            severity: severity_for(result.status),
            description: Some(result.notes),
            treatment: None,
            is_healthy: result.status.is_healthy(),
        };
        tables.insert_analysis(&new_analysis, date)?;
    }

    for (location, disease, severity, lat, lon, date) in [
        ("Nairobi", "Aloe Rust", ReportSeverity::Medium, -1.2921, 36.8219, day(2024, 4, 3)),
        ("Mombasa", "Leaf Spot", ReportSeverity::Low, -4.0435, 39.6682, day(2024, 4, 28)),
        ("Nakuru", "Root Rot", ReportSeverity::High, -0.3031, 36.0800, day(2024, 6, 1)),
    ] {
        let new_report = NewDiseaseReport {
            user_id: demo.id,
            location: location.to_string(),
            disease: disease.to_string(),
            severity,
            description: None,
            latitude: Some(lat),
            longitude: Some(lon),
        };
        tables.insert_report(&new_report, date)?;
    }

    Ok(())
}

fn day(year: i32, month: u32, date: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, date, 9, 0, 0).single()
}

fn digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn status(code: u16, message: &str) -> FetchError {
    FetchError::Status {
        status: code,
        message: message.to_string(),
    }
}

fn rejected(errors: ag_core::ValidationErrors) -> FetchError {
    status(400, &errors.to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
