//! Validation run orchestration.

use std::sync::Arc;

use chrono::Utc;
use simcheck_core::{
    emit_case_evaluated, emit_dataset_missing, emit_family_finished, emit_family_started,
    emit_run_finished, emit_run_started, emit_statistics, run_span, AutotestSuite, Dataset,
    DatasetHandle, EngineConfig, QualitativeCase, QualitativeVerdict, QuantitativeCase,
    QuantitativeVerdict, ResultFile, TestKind, TimeSeries, ValidationReport, METRICS,
};
use simcheck_store::{AutotestSource, DatasetStore, ReportSink, StoreError};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::error::{EngineError, EvalError, Result};
use crate::linkage::{self, Comparator};
use crate::locator::ResultSetLocator;
use crate::statistics::summarize;
use crate::suite::suite_digest;
use crate::{quantity, trend};

/// Shared, read-only inputs of one test family.
#[derive(Clone)]
struct FamilyContext {
    kind: TestKind,
    execution_id: String,
    store: Arc<dyn DatasetStore>,
    universe: Arc<Vec<ResultFile>>,
    config: Arc<EngineConfig>,
}

impl FamilyContext {
    fn locator(&self) -> ResultSetLocator<'_> {
        ResultSetLocator::new(&self.universe)
    }

    fn eval_error(&self, experiment_id: &str, source: EvalError) -> EngineError {
        EngineError::Eval {
            kind: self.kind,
            experiment_id: experiment_id.to_string(),
            source,
        }
    }

    async fn load_base(&self) -> Result<TimeSeries> {
        let handle = self
            .locator()
            .find_base(&self.execution_id)
            .ok_or_else(|| EngineError::BaseDatasetMissing {
                execution_id: self.execution_id.clone(),
            })?;
        let dataset = self.store.load(&handle).await.map_err(|e| match e {
            StoreError::DatasetNotFound(_) => EngineError::BaseDatasetMissing {
                execution_id: self.execution_id.clone(),
            },
            other => EngineError::Store(other),
        })?;
        METRICS.inc_datasets_loaded();
        Ok(dataset.series())
    }

    /// Load an experiment's dataset; `None` when it has no result file.
    async fn load_experiment(&self, experiment_id: &str) -> Result<Option<Dataset>> {
        let Some(handle) = self.locator().find(&self.execution_id, experiment_id) else {
            return Ok(self.dataset_missing(experiment_id));
        };
        self.load_handle(&handle).await
    }

    async fn load_handle(&self, handle: &DatasetHandle) -> Result<Option<Dataset>> {
        match self.store.load(handle).await {
            Ok(dataset) => {
                METRICS.inc_datasets_loaded();
                Ok(Some(dataset))
            }
            Err(StoreError::DatasetNotFound(_)) => Ok(self.dataset_missing(&handle.experiment_id)),
            Err(e) => Err(e.into()),
        }
    }

    fn dataset_missing(&self, experiment_id: &str) -> Option<Dataset> {
        METRICS.inc_datasets_missing();
        emit_dataset_missing(self.kind, &self.execution_id, experiment_id);
        None
    }
}

/// Runs both test families and assembles the report.
pub struct ValidationPipeline;

impl ValidationPipeline {
    /// Evaluate every case of `suite` against the result files in `universe`.
    ///
    /// Execution ids are resolved before anything is loaded. The qualitative
    /// and quantitative families run as two tasks that only share read-only
    /// inputs; within a family cases are evaluated in order. A case whose
    /// result file is missing fails on its own; any other error aborts the
    /// run and no report is produced.
    pub async fn run(
        store: Arc<dyn DatasetStore>,
        universe: Arc<Vec<ResultFile>>,
        config: Arc<EngineConfig>,
        suite: &AutotestSuite,
    ) -> Result<ValidationReport> {
        config.validate()?;
        let quality_execution = config.execution_for(TestKind::Quality)?.to_string();
        let quantity_execution = config.execution_for(TestKind::Quantity)?.to_string();

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let digest = suite_digest(suite, &config);
        let span = run_span(&run_id.to_string());

        METRICS.reset();
        emit_run_started(
            &run_id.to_string(),
            &digest,
            suite.qualitative.len(),
            suite.quantitative.len(),
        );

        let quality = FamilyContext {
            kind: TestKind::Quality,
            execution_id: quality_execution,
            store: store.clone(),
            universe: universe.clone(),
            config: config.clone(),
        };
        let quantity = FamilyContext {
            kind: TestKind::Quantity,
            execution_id: quantity_execution,
            store,
            universe,
            config,
        };

        let qualitative_task = tokio::spawn(
            run_qualitative(quality, suite.qualitative.clone()).instrument(span.clone()),
        );
        let quantitative_task = tokio::spawn(
            run_quantitative(quantity, suite.quantitative.clone()).instrument(span.clone()),
        );
        let (qualitative, quantitative) = tokio::join!(qualitative_task, quantitative_task);

        let qualitative = qualitative.map_err(|e| EngineError::Join {
            kind: TestKind::Quality,
            message: e.to_string(),
        })??;
        let quantitative = quantitative.map_err(|e| EngineError::Join {
            kind: TestKind::Quantity,
            message: e.to_string(),
        })??;

        let _guard = span.enter();
        let statistics = summarize(&qualitative, &quantitative);
        emit_statistics(&statistics);

        let report = ValidationReport {
            run_id,
            suite_digest: digest,
            started_at,
            finished_at: Utc::now(),
            qualitative,
            quantitative,
            statistics,
        };
        emit_run_finished(
            &run_id.to_string(),
            report.duration_ms(),
            report.passed_count(),
            report.failed_count(),
        );
        METRICS.flush();
        Ok(report)
    }

    /// Load definitions, run, then hand the report to `sink`.
    ///
    /// The sink is only called when the run completed.
    pub async fn run_and_report(
        source: &dyn AutotestSource,
        store: Arc<dyn DatasetStore>,
        sink: &dyn ReportSink,
        universe: Arc<Vec<ResultFile>>,
        config: Arc<EngineConfig>,
    ) -> Result<ValidationReport> {
        config.validate()?;
        config.execution_for(TestKind::Quality)?;
        config.execution_for(TestKind::Quantity)?;

        let suite = source.load_suite().await?;
        let report = Self::run(store, universe, config, &suite).await?;
        sink.write(&suite, &report).await?;
        Ok(report)
    }
}

async fn run_qualitative(
    ctx: FamilyContext,
    cases: Vec<QualitativeCase>,
) -> Result<Vec<QualitativeVerdict>> {
    emit_family_started(ctx.kind, &ctx.execution_id, cases.len());
    let base = ctx.load_base().await?;

    let mut verdicts = Vec::with_capacity(cases.len());
    for case in &cases {
        let verdict = evaluate_qualitative(&ctx, &base, case).await?;
        METRICS.inc_cases_evaluated();
        emit_case_evaluated(ctx.kind, &case.experiment_id, verdict.passed);
        verdicts.push(verdict);
    }

    let passed = verdicts.iter().filter(|v| v.passed).count();
    emit_family_finished(ctx.kind, verdicts.len(), passed);
    Ok(verdicts)
}

async fn evaluate_qualitative(
    ctx: &FamilyContext,
    base: &TimeSeries,
    case: &QualitativeCase,
) -> Result<QualitativeVerdict> {
    let experiment_id = case.experiment_id.as_str();
    let Some(dataset) = ctx.load_experiment(experiment_id).await? else {
        return Ok(QualitativeVerdict::dataset_missing(&ctx.execution_id, experiment_id));
    };

    let linkage_passed = match &case.linkage {
        None => true,
        // The comparator is checked before the linked dataset is read.
        Some(spec) => match Comparator::from_symbol(spec.comparator) {
            Err(e) => {
                warn!(experiment_id, linkage = %spec, "{e}");
                false
            }
            Ok(_) => match ctx.load_experiment(&spec.linked_experiment_id).await? {
                None => {
                    warn!(experiment_id, linkage = %spec, "linked experiment has no result file");
                    false
                }
                Some(linked) => {
                    let (current_sum, linked_sum) = (dataset.total(), linked.total());
                    let holds = linkage::evaluate(current_sum, linked_sum, spec.comparator)
                        .map_err(|e| ctx.eval_error(experiment_id, e))?;
                    info!(experiment_id, linkage = %spec, current_sum, linked_sum, passed = holds, "linkage checked");
                    holds
                }
            },
        },
    };

    let outcome = trend::evaluate(
        base,
        &dataset.series(),
        &case.conditions,
        ctx.config.trend_permissible_error,
    )
    .map_err(|e| ctx.eval_error(experiment_id, e))?;

    Ok(QualitativeVerdict {
        execution_id: ctx.execution_id.clone(),
        experiment_id: experiment_id.to_string(),
        passed: linkage_passed && outcome.passed,
        trend_passed: Some(outcome.passed),
        linkage_passed: Some(linkage_passed),
        trend_checks: outcome.checks,
    })
}

async fn run_quantitative(
    ctx: FamilyContext,
    cases: Vec<QuantitativeCase>,
) -> Result<Vec<QuantitativeVerdict>> {
    emit_family_started(ctx.kind, &ctx.execution_id, cases.len());
    let base = ctx.load_base().await?;

    let mut verdicts = Vec::with_capacity(cases.len());
    for case in &cases {
        let verdict = evaluate_quantitative(&ctx, &base, case).await?;
        METRICS.inc_cases_evaluated();
        emit_case_evaluated(ctx.kind, &case.experiment_id, verdict.passed);
        verdicts.push(verdict);
    }

    let passed = verdicts.iter().filter(|v| v.passed).count();
    emit_family_finished(ctx.kind, verdicts.len(), passed);
    Ok(verdicts)
}

async fn evaluate_quantitative(
    ctx: &FamilyContext,
    base: &TimeSeries,
    case: &QuantitativeCase,
) -> Result<QuantitativeVerdict> {
    let experiment_id = case.experiment_id.as_str();
    let Some(dataset) = ctx.load_experiment(experiment_id).await? else {
        return Ok(QuantitativeVerdict::dataset_missing(&ctx.execution_id, experiment_id));
    };

    let outcome = quantity::evaluate(
        base,
        &dataset.series(),
        case,
        &ctx.config.years_of_interest,
        ctx.config.relative_error,
    )
    .map_err(|e| ctx.eval_error(experiment_id, e))?;

    if !outcome.passed {
        info!(
            experiment_id,
            mean_relative_error = outcome.mean_relative_error,
            limit = ctx.config.relative_error,
            "mean relative error over the limit"
        );
    }

    Ok(QuantitativeVerdict {
        execution_id: ctx.execution_id.clone(),
        experiment_id: experiment_id.to_string(),
        passed: outcome.passed,
        year_errors: outcome.year_errors,
        mean_relative_error: Some(outcome.mean_relative_error),
    })
}
