//! Workflow orchestrator
//!
//! Drives the fixed two-phase dependency graph: freshness and weather
//! concurrently, then market and logistics concurrently against the
//! immutable freshness result, then one synthesis pass. Enforces the
//! per-stage cap and the overall run deadline, retries execution errors
//! once, and degrades instead of blocking when collaborators misbehave.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{validate_request, AssessmentRequest, AssessmentStatus, FinalAssessment, Stage};
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{error, info, warn};

use crate::catalog::CropProfileCatalog;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::external::{DriverRegistry, ForecastProvider, MarketDataSource};
use crate::stages::{
    FreshnessScorer, LogisticsSelector, MarketPricer, StageOutcome, WeatherAssessor,
};
use crate::synthesizer::Synthesizer;
use crate::workflow::{RunStatus, StageReport, StageStatus, WorkflowRun};

/// Pipeline orchestrator
///
/// Shared read-only across runs; each call to [`assess`](Self::assess)
/// owns its private [`WorkflowRun`] context.
#[derive(Clone)]
pub struct Orchestrator {
    catalog: Arc<CropProfileCatalog>,
    freshness: FreshnessScorer,
    market: MarketPricer,
    logistics: LogisticsSelector,
    weather: WeatherAssessor,
    synthesizer: Synthesizer,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Create a new Orchestrator over the given collaborators
    pub fn new(
        catalog: CropProfileCatalog,
        market_source: Arc<dyn MarketDataSource>,
        driver_registry: Arc<dyn DriverRegistry>,
        forecast_provider: Arc<dyn ForecastProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            freshness: FreshnessScorer::new(),
            market: MarketPricer::new(market_source, config.market.clone()),
            logistics: LogisticsSelector::new(driver_registry, config.logistics.clone()),
            weather: WeatherAssessor::new(forecast_provider, config.weather.clone()),
            synthesizer: Synthesizer::new(config.confidence.clone(), config.market.clone()),
            config,
        }
    }

    /// Assess one request
    ///
    /// Synchronous from the caller's perspective, internally concurrent.
    /// Identical inputs against unchanged collaborator state reproduce the
    /// same assessment.
    pub async fn assess(&self, request: AssessmentRequest) -> PipelineResult<FinalAssessment> {
        let mut run = WorkflowRun::new();

        if let Err(err) = validate_request(&request) {
            run.status = RunStatus::Failed;
            warn!(run_id = %run.id, field = %err.field, message = %err.message,
                "request rejected before any stage ran");
            return Err(err.into());
        }

        run.status = RunStatus::Running;
        info!(run_id = %run.id, crop = %request.crop, location = %request.location,
            quantity_kg = request.quantity_kg, "assessment run started");

        let profile = self.catalog.profile_for(&request.crop);
        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.config.run.overall_deadline_ms);

        let request_ref = &request;
        let profile_ref = &profile;

        // Phase A: no mutual dependency between freshness and weather
        let freshness_stage = &self.freshness;
        let weather_stage = &self.weather;
        let (freshness_done, weather_done) = tokio::join!(
            self.run_stage(Stage::Freshness, deadline, move || {
                let result = freshness_stage.score(request_ref, profile_ref);
                async move { Ok(StageOutcome::live(result)) }
            }),
            self.run_stage(Stage::Weather, deadline, move || {
                weather_stage.assess(request_ref, profile_ref)
            }),
        );
        let (freshness_outcome, freshness_report) = freshness_done;
        let (weather_outcome, weather_report) = weather_done;
        run.record(freshness_report);
        run.record(weather_report);

        // Every downstream stage depends on freshness; without it the run
        // is not salvageable.
        let freshness_outcome = match freshness_outcome {
            Some(outcome) => outcome,
            None => {
                run.status = RunStatus::Failed;
                error!(run_id = %run.id, "freshness stage produced no result, run failed");
                return Err(PipelineError::RunFailed {
                    stage: Stage::Freshness,
                    reason: "freshness stage produced no result".to_string(),
                });
            }
        };

        // Phase B: market and logistics read the completed freshness
        // result and never each other's state
        let freshness_value = freshness_outcome.value.clone();
        let freshness_ref = &freshness_value;
        let market_stage = &self.market;
        let logistics_stage = &self.logistics;
        let (market_done, logistics_done) = tokio::join!(
            self.run_stage(Stage::Market, deadline, move || {
                market_stage.price(request_ref, freshness_ref, profile_ref)
            }),
            self.run_stage(Stage::Logistics, deadline, move || {
                logistics_stage.select(request_ref, freshness_ref)
            }),
        );
        let (market_outcome, market_report) = market_done;
        let (logistics_outcome, logistics_report) = logistics_done;
        run.record(market_report);
        run.record(logistics_report);

        // High-value consignments force at least refrigerated transport;
        // applied after both phase-B stages have terminated so the run
        // stays deterministic.
        let premium_threshold = Decimal::from_f64_retain(self.config.market.premium_price_threshold)
            .unwrap_or_else(|| Decimal::new(100, 0));
        let logistics_outcome = match (&market_outcome, logistics_outcome) {
            (Some(market), Some(logistics))
                if market.value.final_price_per_kg > premium_threshold =>
            {
                Some(logistics.map(|result| self.logistics.apply_price_floor(&request, result)))
            }
            (_, logistics) => logistics,
        };

        let deadline_hit = run.any_timeout() || Instant::now() >= deadline;
        let assessment = self.synthesizer.synthesize(
            &request,
            freshness_outcome,
            market_outcome,
            logistics_outcome,
            weather_outcome,
            deadline_hit,
        );

        run.status = match assessment.status {
            AssessmentStatus::Completed => RunStatus::Completed,
            AssessmentStatus::Degraded => RunStatus::Degraded,
        };
        info!(run_id = %run.id, status = ?run.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            fallbacks = run.metrics.fallbacks, retries = run.metrics.retries,
            timeouts = run.metrics.timeouts, confidence = assessment.confidence,
            "assessment run finished");

        Ok(assessment)
    }

    /// Run one stage under the per-attempt cap and the run deadline
    ///
    /// Execution errors are retried once; a retry never extends the
    /// deadline. Timeouts are cancellations, not errors, and are not
    /// retried.
    async fn run_stage<T, F, Fut>(
        &self,
        stage: Stage,
        deadline: Instant,
        attempt: F,
    ) -> (Option<StageOutcome<T>>, StageReport)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = PipelineResult<StageOutcome<T>>>,
    {
        let started = Instant::now();
        let stage_budget = Duration::from_millis(self.config.run.stage_timeout_ms);
        let mut retried = false;

        loop {
            let now = Instant::now();
            if now >= deadline {
                warn!(%stage, retried, "stage abandoned: run deadline reached");
                return (
                    None,
                    StageReport {
                        stage,
                        status: StageStatus::TimedOut,
                        elapsed: started.elapsed(),
                        retried,
                    },
                );
            }

            let cap = std::cmp::min(deadline, now + stage_budget);
            match timeout_at(cap, attempt()).await {
                Ok(Ok(outcome)) => {
                    let status = if outcome.fallback_used {
                        StageStatus::SucceededFallback
                    } else {
                        StageStatus::Succeeded
                    };
                    return (
                        Some(outcome),
                        StageReport {
                            stage,
                            status,
                            elapsed: started.elapsed(),
                            retried,
                        },
                    );
                }
                Ok(Err(err)) if !retried => {
                    warn!(%stage, error = %err, "stage execution error, retrying once");
                    retried = true;
                }
                Ok(Err(err)) => {
                    error!(%stage, error = %err, "stage failed after retry");
                    return (
                        None,
                        StageReport {
                            stage,
                            status: StageStatus::Failed,
                            elapsed: started.elapsed(),
                            retried,
                        },
                    );
                }
                Err(_) => {
                    warn!(%stage, "stage canceled at its time cap");
                    return (
                        None,
                        StageReport {
                            stage,
                            status: StageStatus::TimedOut,
                            elapsed: started.elapsed(),
                            retried,
                        },
                    );
                }
            }
        }
    }
}
