//! Sales-commission calculation for a closing period.
//!
//! A run flows through the modules in order: [`parameters`] merges defaults with the
//! month's goal, [`aggregator`] folds sales per salesperson, [`tiers`] and [`calculator`]
//! price each aggregate, [`bonus`] evaluates the company goal and splits the pools, and
//! [`service`] replaces the persisted rows for the period.

pub mod aggregator;
pub mod auth;
pub mod bonus;
pub mod calculator;
pub mod classifier;
pub mod domain;
pub mod engine;
pub mod fixture;
pub mod memory;
pub mod parameters;
pub mod repository;
pub mod router;
pub mod service;
pub mod statement;
pub mod tiers;

pub use aggregator::{CompanyTotals, SalespersonAggregate};
pub use auth::{AuthError, CallerAuthenticator, CallerIdentity, StaticTokenAuthenticator};
pub use bonus::{BonusPools, GoalEvaluation};
pub use classifier::{classify_sale, BillingInterval};
pub use domain::{
    CalculatedCommission, ClosingPeriod, ClosingPeriodId, CommissionTier, ConfigurationParameter,
    ImportedSale, MonthlyGoal, ParameterKey, PeriodSummary, SaleEligibility, SaleKind, SaleRecord,
    SalespersonKey,
};
pub use engine::{CommissionEngine, CommissionRun, RunStage};
pub use fixture::{CommissionFixture, FixtureError};
pub use memory::InMemoryCommissionStore;
pub use parameters::ResolvedParameters;
pub use repository::{
    CalculatedCommissionRepository, ClosingPeriodRepository, CommissionSettingsRepository,
    RepositoryError, SaleRecordRepository,
};
pub use router::{commission_router, CalculateRequest, CalculationSummaryView, CommissionApi};
pub use service::{CommissionRunError, CommissionService, CommissionStores, RunSummary};
pub use statement::{write_statement, StatementError};
pub use tiers::TierTable;
