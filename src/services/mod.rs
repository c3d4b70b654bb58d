/// Business logic services layer
use crate::clients::{departure_params, DepartureSource};
use crate::domain::{Board, Panel, QuickTime, QuickTimes, Settings};
use crate::errors::{ApiError, ApiResult};
use crate::lookup::Lookup;
use crate::repo::RuleRepo;
use crate::resolver::{resolve, uk_local_now};
use crate::utils::{normalize_days, validate_crs, validate_dest, validate_time, DayInput};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

/// Quick time as submitted by a user, before validation and id assignment
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDraft {
    pub start: String,
    pub end: String,
    pub org: String,
    pub dest: String,
    pub days: Vec<DayInput>,
}

impl RuleDraft {
    pub fn into_rule(self, id: i64, lookup: &Lookup) -> ApiResult<QuickTime> {
        validate_time(&self.start)?;
        validate_time(&self.end)?;
        validate_crs(&self.org, lookup)?;
        validate_dest(&self.dest, lookup)?;
        let days = normalize_days(&self.days)?;

        Ok(QuickTime {
            id,
            start: self.start,
            end: self.end,
            org: self.org,
            dest: self.dest,
            days,
        })
    }
}

/// Owns the quick time list and keeps `qtt.json` in step with it
pub struct RuleStore {
    repo: RuleRepo,
    lookup: Arc<Lookup>,
    rules: RwLock<QuickTimes>,
}

impl RuleStore {
    pub fn new(repo: RuleRepo, lookup: Arc<Lookup>, rules: QuickTimes) -> Self {
        Self {
            repo,
            lookup,
            rules: RwLock::new(rules),
        }
    }

    /// Load the rule file (creating it on first run)
    pub async fn open(repo: RuleRepo, lookup: Arc<Lookup>) -> ApiResult<Self> {
        let rules = repo.load().await?;
        info!(
            "Loaded {} quick times from {}",
            rules.quick_times.len(),
            repo.path().display()
        );
        Ok(Self::new(repo, lookup, rules))
    }

    pub async fn list(&self) -> Vec<QuickTime> {
        self.rules.read().await.quick_times.clone()
    }

    pub async fn get(&self, id: i64) -> ApiResult<QuickTime> {
        self.rules
            .read()
            .await
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("quick time {}", id)))
    }

    pub async fn create(&self, draft: RuleDraft) -> ApiResult<QuickTime> {
        let mut guard = self.rules.write().await;
        let id = guard
            .fresh_id()
            .ok_or_else(|| ApiError::InvalidInput("no free quick time ids left".to_string()))?;
        let rule = draft.into_rule(id, &self.lookup)?;

        let mut next = guard.clone();
        next.insert(rule.clone());
        self.repo.save(&next).await?;
        *guard = next;

        info!("Created quick time {}", id);
        Ok(rule)
    }

    pub async fn replace(&self, id: i64, draft: RuleDraft) -> ApiResult<QuickTime> {
        let rule = draft.into_rule(id, &self.lookup)?;
        let mut guard = self.rules.write().await;

        let mut next = guard.clone();
        if !next.replace_by_id(id, rule.clone()) {
            return Err(ApiError::NotFound(format!("quick time {}", id)));
        }
        self.repo.save(&next).await?;
        *guard = next;

        info!("Updated quick time {}", id);
        Ok(rule)
    }

    pub async fn delete(&self, id: i64) -> ApiResult<QuickTime> {
        let mut guard = self.rules.write().await;

        let mut next = guard.clone();
        let removed = next
            .remove_by_id(id)
            .ok_or_else(|| ApiError::NotFound(format!("quick time {}", id)))?;
        self.repo.save(&next).await?;
        *guard = next;

        info!("Deleted quick time {}", id);
        Ok(removed)
    }
}

/// Resolves the active quick times and fetches their departures
pub struct BoardService {
    rules: Arc<RuleStore>,
    source: Arc<dyn DepartureSource>,
    settings: Settings,
    latest: RwLock<Board>,
    refresh_lock: Mutex<()>,
}

impl BoardService {
    pub fn new(rules: Arc<RuleStore>, source: Arc<dyn DepartureSource>, settings: Settings) -> Self {
        let now = Utc::now();
        Self {
            rules,
            source,
            settings,
            latest: RwLock::new(Board::empty(now, uk_local_now(now))),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Last completed board
    pub async fn latest(&self) -> Board {
        self.latest.read().await.clone()
    }

    pub async fn refresh(&self) -> ApiResult<Board> {
        self.refresh_at(Utc::now()).await
    }

    /// One refresh pass evaluated at `now`. A pass already in flight wins;
    /// the caller gets the previous board.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> ApiResult<Board> {
        let Ok(_pass) = self.refresh_lock.try_lock() else {
            info!("Refresh already running, serving the board from the previous pass");
            return Ok(self.latest().await);
        };

        let rules = self.rules.list().await;
        let windows = resolve(&rules, now).checked()?;
        let mut board = Board::empty(now, windows.local_time);

        match windows.count() {
            0 => debug!("No quick times active at {}", windows.local_time),
            n => info!("{} quick time(s) active at {}", n, windows.local_time),
        }

        // Sequential on purpose: at most two requests, in rule order
        for rule in windows.rules {
            board.panels.push(self.build_panel(rule).await);
        }

        *self.latest.write().await = board.clone();
        Ok(board)
    }

    async fn build_panel(&self, rule: QuickTime) -> Panel {
        let rows = self.settings.desired_len;
        let fetched = match departure_params(&rule.dest, rows) {
            Ok(params) => {
                self.source
                    .fetch_departures(&rule.org, &params, &self.settings.key)
                    .await
            }
            Err(e) => Err(e),
        };

        match fetched {
            Ok(mut services) => {
                services.truncate(rows);
                Panel {
                    rule,
                    services,
                    error: None,
                }
            }
            Err(e) => {
                error!("Departure fetch for quick time {} failed: {}", rule.id, e);
                Panel {
                    rule,
                    services: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
