//! TTL cache for report filter dropdowns, one snapshot per scope.
//!
//! Stores typed `Arc<FiltersResponse>` so reads never re-serialize.
//! A single-flight claim per scope keeps concurrent misses from all hitting
//! the database; waiters poll briefly and then build on their own.

use dashmap::{DashMap, DashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::web::filters::FiltersResponse;

/// How long a caller that lost the claim waits for the winner's result.
const CLAIM_WAIT: Duration = Duration::from_millis(250);
const CLAIM_POLL: Duration = Duration::from_millis(25);
/// Above this many scopes, expired entries are swept on insert.
const SWEEP_THRESHOLD: usize = 256;

/// Whose dropdowns these are: staff see the whole catalog, students only
/// the courses they are enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterScope {
    Catalog,
    Student(i32),
}

#[derive(Clone)]
pub struct FilterCache {
    ttl: Duration,
    entries: Arc<DashMap<FilterScope, (Instant, Arc<FiltersResponse>)>>,
    /// Scopes currently being built; a scope leaves the set when its claim drops.
    inflight: Arc<DashSet<FilterScope>>,
}

impl FilterCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::default(),
            inflight: Arc::default(),
        }
    }

    /// Return a cached entry if it exists and is fresh.
    pub fn get(&self, scope: FilterScope) -> Option<Arc<FiltersResponse>> {
        let entry = self.entries.get(&scope)?;
        let (cached_at, ref value) = *entry;
        (cached_at.elapsed() < self.ttl).then(|| value.clone())
    }

    pub fn insert(&self, scope: FilterScope, value: FiltersResponse) -> Arc<FiltersResponse> {
        let value = Arc::new(value);
        self.entries.insert(scope, (Instant::now(), value.clone()));
        if self.entries.len() > SWEEP_THRESHOLD {
            let ttl = self.ttl;
            self.entries.retain(|_, (cached_at, _)| cached_at.elapsed() < ttl);
        }
        value
    }

    /// Try to claim the single-flight slot for a scope.
    ///
    /// The returned guard releases the slot when dropped, including when the
    /// build fails or the request is cancelled.
    fn try_claim(&self, scope: FilterScope) -> Option<ClaimGuard> {
        self.inflight.insert(scope).then(|| ClaimGuard {
            inflight: self.inflight.clone(),
            scope,
        })
    }

    /// Serve from cache, or build with `build` and cache the result.
    pub async fn get_or_build<F, Fut>(
        &self,
        scope: FilterScope,
        build: F,
    ) -> anyhow::Result<Arc<FiltersResponse>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<FiltersResponse>>,
    {
        if let Some(cached) = self.get(scope) {
            return Ok(cached);
        }

        let guard = match self.try_claim(scope) {
            Some(guard) => Some(guard),
            None => {
                let deadline = Instant::now() + CLAIM_WAIT;
                while Instant::now() < deadline {
                    tokio::time::sleep(CLAIM_POLL).await;
                    if let Some(cached) = self.get(scope) {
                        return Ok(cached);
                    }
                }
                debug!(?scope, "filter cache claim wait expired, building anyway");
                None
            }
        };

        let value = build().await?;
        let value = self.insert(scope, value);
        drop(guard);
        Ok(value)
    }
}

struct ClaimGuard {
    inflight: Arc<DashSet<FilterScope>>,
    scope: FilterScope,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.inflight.remove(&self.scope);
        debug!(scope = ?self.scope, "filter cache slot released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::filters::{CompetencyOption, CourseOption};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn response(course: &str) -> FiltersResponse {
        FiltersResponse {
            competencies: vec![CompetencyOption {
                id: 1,
                name: "Lectura Crítica".into(),
                is_icfes: true,
            }],
            courses: vec![CourseOption {
                id: 10,
                title: course.into(),
            }],
        }
    }

    #[tokio::test]
    async fn caches_until_ttl() {
        let cache = FilterCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value = cache
                .get_or_build(FilterScope::Catalog, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(response("Matemáticas 11"))
                })
                .await
                .unwrap();
            assert_eq!(value.courses[0].title, "Matemáticas 11");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_rebuilt() {
        let cache = FilterCache::new(Duration::ZERO);
        cache.insert(FilterScope::Catalog, response("old"));
        assert!(cache.get(FilterScope::Catalog).is_none());
        let value = cache
            .get_or_build(FilterScope::Catalog, || async { Ok(response("new")) })
            .await
            .unwrap();
        assert_eq!(value.courses[0].title, "new");
    }

    #[tokio::test]
    async fn scopes_are_independent() {
        let cache = FilterCache::new(Duration::from_secs(60));
        cache.insert(FilterScope::Student(1), response("Inglés"));
        assert!(cache.get(FilterScope::Student(2)).is_none());
        assert!(cache.get(FilterScope::Catalog).is_none());
        assert_eq!(
            cache.get(FilterScope::Student(1)).unwrap().courses[0].title,
            "Inglés"
        );
    }

    #[tokio::test]
    async fn failed_build_releases_claim() {
        let cache = FilterCache::new(Duration::from_secs(60));
        let err = cache
            .get_or_build(FilterScope::Catalog, || async {
                Err(anyhow::anyhow!("database down"))
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database down"));
        assert!(cache.try_claim(FilterScope::Catalog).is_some());
    }

    #[tokio::test]
    async fn waiter_receives_winner_result() {
        let cache = FilterCache::new(Duration::from_secs(60));
        let held = cache.try_claim(FilterScope::Catalog).unwrap();

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_build(FilterScope::Catalog, || async { Ok(response("waiter")) })
                    .await
                    .unwrap()
            })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.insert(FilterScope::Catalog, response("winner"));
        drop(held);

        assert_eq!(waiter.await.unwrap().courses[0].title, "winner");
    }

    #[tokio::test]
    async fn finished_builds_leave_no_claims_behind() {
        let cache = FilterCache::new(Duration::from_secs(60));
        for student in 1..=50 {
            cache
                .get_or_build(FilterScope::Student(student), || async { Ok(response("x")) })
                .await
                .unwrap();
        }
        assert!(cache.inflight.is_empty());

        let held = cache.try_claim(FilterScope::Student(7)).unwrap();
        assert!(cache.try_claim(FilterScope::Student(7)).is_none());
        assert_eq!(cache.inflight.len(), 1);
        drop(held);
        assert!(cache.inflight.is_empty());
    }
}
