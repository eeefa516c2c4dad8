//! 인메모리 cache 구현 (테스트용).
//!
//! Redis와 같은 TTL/INCR 의미를 따르며, 만료 시각은 `tokio::time::Instant`
//! 기준이라 `tokio::time::pause`/`advance`로 윈도우 경과를 재현할 수 있습니다.
//! 장애 주입 플래그로 저장소 연결 실패를 흉내낼 수 있습니다.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::CacheStore;
use crate::error::{DataError, Result};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// 인메모리 캐시 저장소.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
    fail_writes: AtomicBool,
    fail_expire: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 명령이 연결 오류를 반환하도록 설정합니다.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// `set_string`만 실패하도록 설정합니다.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// `expire`만 실패하도록 설정합니다.
    pub fn set_fail_expire(&self, fail: bool) {
        self.fail_expire.store(fail, Ordering::SeqCst);
    }

    /// 키의 남은 TTL. 만료 없는 키는 `None`.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock().expect("memory cache lock poisoned");
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    /// 살아 있는 키 존재 여부.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        let entries = self.entries.lock().expect("memory cache lock poisoned");
        entries.get(key).is_some_and(|e| e.is_live(now))
    }

    /// 값을 직접 기록합니다 (만료 없음).
    pub fn insert_raw(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().expect("memory cache lock poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DataError::CacheError("connection refused".to_string()));
        }
        Ok(())
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("memory cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.live_value(key))
    }

    async fn set_string(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.check_available()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DataError::CacheError("write rejected".to_string()));
        }

        let mut entries = self.entries.lock().expect("memory cache lock poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(())
    }

    async fn get_counter(&self, key: &str) -> Result<i64> {
        self.check_available()?;
        match self.live_value(key) {
            Some(value) => value
                .parse()
                .map_err(|_| DataError::CacheError(format!("value at '{}' is not an integer", key))),
            None => Ok(0),
        }
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        self.check_available()?;

        let now = Instant::now();
        let mut entries = self.entries.lock().expect("memory cache lock poisoned");
        let entry = entries
            .entry(key.to_string())
            .and_modify(|e| {
                if !e.is_live(now) {
                    *e = Entry {
                        value: "0".to_string(),
                        expires_at: None,
                    };
                }
            })
            .or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: None,
            });

        let current: i64 = entry
            .value
            .parse()
            .map_err(|_| DataError::CacheError(format!("value at '{}' is not an integer", key)))?;
        let next = current + 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool> {
        self.check_available()?;
        if self.fail_expire.load(Ordering::SeqCst) {
            return Err(DataError::CacheError("expire rejected".to_string()));
        }

        let now = Instant::now();
        let mut entries = self.entries.lock().expect("memory cache lock poisoned");
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + Duration::from_secs(ttl_secs));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        self.check_available()?;
        Ok(true)
    }
}
