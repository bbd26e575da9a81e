//! Background thread that runs API calls for the TUI.
//!
//! Jobs run one at a time in submission order. Every job carries the session
//! it should use; the worker itself holds no login state.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use anyhow::{Context, Result};

use crate::aggregate::Change;
use crate::api::{ApiError, BudgetApi};
use crate::models::{
    Budget, BudgetPatch, Expense, NewBudget, NewExpense, ProfileUpdate, Registration, User,
};
use crate::session::Session;

pub(crate) enum Job {
    Login { email: String, password: String },
    Register(Registration),
    /// Profile, budgets and expenses in one go.
    Refresh(Session),
    CreateBudget {
        session: Session,
        budget: NewBudget,
        image: Option<PathBuf>,
    },
    UpdateBudget {
        session: Session,
        id: i64,
        patch: BudgetPatch,
    },
    SetBudgetImage {
        session: Session,
        id: i64,
        path: PathBuf,
    },
    DeleteBudget { session: Session, id: i64 },
    CreateExpense { session: Session, expense: NewExpense },
    UpdateExpense {
        session: Session,
        id: i64,
        expense: NewExpense,
    },
    DeleteExpense { session: Session, id: i64 },
    UpdateProfile {
        session: Session,
        id: i64,
        update: ProfileUpdate,
    },
    DeleteAccount { session: Session, id: i64 },
}

impl Job {
    /// Verb phrase for notifications, e.g. "Failed to add budget".
    pub(crate) fn action(&self) -> &'static str {
        match self {
            Self::Login { .. } => "log in",
            Self::Register(_) => "register",
            Self::Refresh(_) => "refresh",
            Self::CreateBudget { .. } => "add budget",
            Self::UpdateBudget { .. } => "update budget",
            Self::SetBudgetImage { .. } => "upload image",
            Self::DeleteBudget { .. } => "delete budget",
            Self::CreateExpense { .. } => "add expense",
            Self::UpdateExpense { .. } => "update expense",
            Self::DeleteExpense { .. } => "delete expense",
            Self::UpdateProfile { .. } => "update profile",
            Self::DeleteAccount { .. } => "delete account",
        }
    }
}

#[derive(Debug)]
pub(crate) enum Outcome {
    LoggedIn(Session),
    Refreshed {
        user: Option<User>,
        budgets: Vec<Budget>,
        expenses: Vec<Expense>,
    },
    Budget(Change<Budget>),
    Expense(Change<Expense>),
    ProfileUpdated(User),
    AccountDeleted,
    Failed {
        action: &'static str,
        error: ApiError,
    },
}

/// Run one job against the API. Never panics; every error becomes
/// `Outcome::Failed`.
pub(crate) fn execute<A: BudgetApi>(api: &A, job: Job) -> Outcome {
    let action = job.action();
    tracing::debug!(action, "running job");
    match run_job(api, job) {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::warn!(action, error = %error, "job failed");
            Outcome::Failed { action, error }
        }
    }
}

fn run_job<A: BudgetApi>(api: &A, job: Job) -> Result<Outcome, ApiError> {
    let outcome = match job {
        Job::Login { email, password } => Outcome::LoggedIn(api.login(&email, &password)?),
        Job::Register(registration) => Outcome::LoggedIn(api.register(&registration)?),
        Job::Refresh(session) => {
            let user = match api.current_user(&session) {
                Ok(user) => Some(user),
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "profile refresh failed");
                    None
                }
            };
            Outcome::Refreshed {
                user,
                budgets: api.get_budgets(&session)?,
                expenses: api.get_expenses(&session)?,
            }
        }
        Job::CreateBudget {
            session,
            mut budget,
            image,
        } => {
            if let Some(path) = image {
                budget = budget.with_image(api.upload_image(&session, &path)?);
            }
            Outcome::Budget(Change::Added(api.create_budget(&session, &budget)?))
        }
        Job::UpdateBudget { session, id, patch } => {
            Outcome::Budget(Change::Updated(api.update_budget(&session, id, &patch)?))
        }
        Job::SetBudgetImage { session, id, path } => {
            let url = api.upload_image(&session, &path)?;
            let patch = BudgetPatch::image(url);
            Outcome::Budget(Change::Updated(api.update_budget(&session, id, &patch)?))
        }
        Job::DeleteBudget { session, id } => {
            api.delete_budget(&session, id)?;
            Outcome::Budget(Change::Removed(id))
        }
        Job::CreateExpense { session, expense } => {
            Outcome::Expense(Change::Added(api.create_expense(&session, &expense)?))
        }
        Job::UpdateExpense {
            session,
            id,
            expense,
        } => Outcome::Expense(Change::Updated(api.update_expense(&session, id, &expense)?)),
        Job::DeleteExpense { session, id } => {
            api.delete_expense(&session, id)?;
            Outcome::Expense(Change::Removed(id))
        }
        Job::UpdateProfile {
            session,
            id,
            update,
        } => Outcome::ProfileUpdated(api.update_user(&session, id, &update)?),
        Job::DeleteAccount { session, id } => {
            api.delete_user(&session, id)?;
            Outcome::AccountDeleted
        }
    };
    Ok(outcome)
}

/// Handle to the worker thread. Dropping it closes the job channel, which
/// ends the thread after its current job.
///
/// Each job travels with an opaque epoch that comes back unchanged with its
/// outcome, so the caller can tell which session a result belongs to.
pub(crate) struct Worker {
    jobs: Sender<(u64, Job)>,
    outcomes: Receiver<(u64, Outcome)>,
    pending: usize,
}

impl Worker {
    pub(crate) fn spawn<A: BudgetApi>(api: A) -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<(u64, Job)>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<(u64, Outcome)>();

        thread::Builder::new()
            .name("api-worker".into())
            .spawn(move || {
                for (epoch, job) in job_rx {
                    if outcome_tx.send((epoch, execute(&api, job))).is_err() {
                        break;
                    }
                }
                tracing::debug!("api worker stopped");
            })
            .context("Failed to start the request worker")?;

        Ok(Self {
            jobs: job_tx,
            outcomes: outcome_rx,
            pending: 0,
        })
    }

    pub(crate) fn submit(&mut self, epoch: u64, job: Job) -> Result<()> {
        self.jobs
            .send((epoch, job))
            .map_err(|_| anyhow::anyhow!("The request worker has stopped"))?;
        self.pending += 1;
        Ok(())
    }

    /// Next finished job, if any. Never blocks.
    pub(crate) fn poll(&mut self) -> Result<Option<(u64, Outcome)>> {
        match self.outcomes.try_recv() {
            Ok(outcome) => {
                self.pending = self.pending.saturating_sub(1);
                Ok(Some(outcome))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                anyhow::bail!("The request worker stopped unexpectedly")
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn wait(&mut self, timeout: std::time::Duration) -> Option<(u64, Outcome)> {
        let outcome = self.outcomes.recv_timeout(timeout).ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(outcome)
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.pending > 0
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod worker_tests;
