//! In-memory doubles for the like store and the posts counter
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use likes_service::clients::{Adjusted, CounterError, PostsCounter};
use likes_service::models::{Like, LikeFilter};
use likes_service::repository::{LikeStore, StoreResult};
use likes_service::services::LikeService;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

fn store_down() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}

/// Like store with a uniqueness check under one lock, like the unique index
#[derive(Default)]
pub struct InMemoryLikeStore {
    likes: Mutex<Vec<Like>>,
    pub fail_inserts: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl InMemoryLikeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.likes.lock().len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.likes.lock().iter().any(|l| l.id == id)
    }

    pub fn count_for(&self, post_id: Uuid) -> i64 {
        self.likes.lock().iter().filter(|l| l.post_id == post_id).count() as i64
    }

    pub fn set_failing_deletes(&self, failing: bool) {
        self.fail_deletes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl LikeStore for InMemoryLikeStore {
    async fn insert_if_absent(&self, user_id: &str, post_id: Uuid) -> StoreResult<Option<Like>> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(store_down());
        }

        let mut likes = self.likes.lock();
        if likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id)
        {
            return Ok(None);
        }

        let like = Like {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            post_id,
            created_at: Utc::now(),
        };
        likes.push(like.clone());
        Ok(Some(like))
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Like>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(store_down());
        }
        Ok(self.likes.lock().iter().find(|l| l.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Like>> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(store_down());
        }

        let mut likes = self.likes.lock();
        let idx = likes.iter().position(|l| l.id == id);
        Ok(idx.map(|idx| likes.remove(idx)))
    }

    async fn list(&self, filter: &LikeFilter) -> StoreResult<Vec<Like>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(store_down());
        }

        let mut likes: Vec<Like> = self
            .likes
            .lock()
            .iter()
            .filter(|l| filter.user_id.as_deref().map_or(true, |u| l.user_id == u))
            .filter(|l| filter.post_id.map_or(true, |p| l.post_id == p))
            .cloned()
            .collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(likes)
    }

    async fn count_by_posts(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(store_down());
        }

        let mut counts = HashMap::new();
        for like in self.likes.lock().iter() {
            if post_ids.contains(&like.post_id) {
                *counts.entry(like.post_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(store_down());
        }
        Ok(())
    }
}

/// How the fake posts-service answers adjustments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustMode {
    Healthy,
    /// Times out without applying anything
    Down,
    /// Applies the adjustment, then the response is lost
    ApplyThenFail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Applied,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Increment(String),
    Decrement(String),
    Revert(String),
}

struct CounterState {
    counts: HashMap<Uuid, i64>,
    ledger: HashMap<String, (KeyState, i64)>,
    calls: Vec<Call>,
    mode: AdjustMode,
    revert_fails: bool,
}

/// Posts counter with the same ledger rules as posts-service: one effect per
/// key, clamped at zero, reverts undo the recorded effect or tombstone the key
pub struct FakePosts {
    state: Mutex<CounterState>,
}

impl FakePosts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(CounterState {
                counts: HashMap::new(),
                ledger: HashMap::new(),
                calls: Vec::new(),
                mode: AdjustMode::Healthy,
                revert_fails: false,
            }),
        })
    }

    pub fn add_post(&self, likes_count: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().counts.insert(id, likes_count);
        id
    }

    pub fn remove_post(&self, id: Uuid) {
        self.state.lock().counts.remove(&id);
    }

    pub fn likes_count(&self, id: Uuid) -> Option<i64> {
        self.state.lock().counts.get(&id).copied()
    }

    pub fn set_mode(&self, mode: AdjustMode) {
        self.state.lock().mode = mode;
    }

    pub fn set_revert_fails(&self, fails: bool) {
        self.state.lock().revert_fails = fails;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    fn adjust(&self, post_id: Uuid, key: &str, delta: i64) -> Result<Adjusted, CounterError> {
        let mut state = self.state.lock();
        let mode = state.mode;
        if mode == AdjustMode::Down {
            return Err(CounterError::Unavailable("timed out".into()));
        }

        let current = *state
            .counts
            .get(&post_id)
            .ok_or(CounterError::PostNotFound)?;

        let adjusted = match state.ledger.get(key) {
            Some((KeyState::Applied, _)) => Adjusted::Replayed,
            Some((KeyState::Reverted, _)) => Adjusted::Reverted,
            None => {
                let next = (current + delta).max(0);
                state.counts.insert(post_id, next);
                state
                    .ledger
                    .insert(key.to_string(), (KeyState::Applied, next - current));
                Adjusted::Applied
            }
        };

        match mode {
            AdjustMode::ApplyThenFail => Err(CounterError::Unavailable("response lost".into())),
            _ => Ok(adjusted),
        }
    }
}

#[async_trait]
impl PostsCounter for FakePosts {
    async fn increment(&self, post_id: Uuid, key: &str) -> Result<Adjusted, CounterError> {
        self.state.lock().calls.push(Call::Increment(key.to_string()));
        self.adjust(post_id, key, 1)
    }

    async fn decrement(&self, post_id: Uuid, key: &str) -> Result<Adjusted, CounterError> {
        self.state.lock().calls.push(Call::Decrement(key.to_string()));
        self.adjust(post_id, key, -1)
    }

    async fn revert(&self, post_id: Uuid, key: &str) -> Result<(), CounterError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Revert(key.to_string()));
        if state.revert_fails {
            return Err(CounterError::Unavailable("timed out".into()));
        }

        let current = *state
            .counts
            .get(&post_id)
            .ok_or(CounterError::PostNotFound)?;

        let undo = match state.ledger.get(key).copied() {
            Some((KeyState::Applied, effect)) => effect,
            Some((KeyState::Reverted, _)) => return Ok(()),
            None => 0,
        };
        state
            .ledger
            .insert(key.to_string(), (KeyState::Reverted, 0));
        state.counts.insert(post_id, (current - undo).max(0));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<InMemoryLikeStore>,
    pub posts: Arc<FakePosts>,
    pub service: LikeService,
}

pub fn harness() -> Harness {
    let store = InMemoryLikeStore::new();
    let posts = FakePosts::new();
    let service = LikeService::new(store.clone(), posts.clone());
    Harness {
        store,
        posts,
        service,
    }
}
