//! 분석 잠금 (TTL 리스) repository.
//!
//! 여러 워커 프로세스가 같은 뉴스 아이템을 동시에 분석하지 않도록
//! 아이템별 리스를 제공합니다. 프로세스 간 공유 메모리가 없으므로
//! `news_id` 기본 키의 유니크 제약이 유일한 상호 배제 메커니즘입니다.
//!
//! # 동작 방식
//!
//! 1. 만료된 리스를 베스트 에포트로 삭제 (크래시한 홀더 회수)
//! 2. 유니크 키 INSERT 시도
//! 3. 유니크 제약 위반이면 다른 홀더가 활성 → `Locked` (에러 아님)
//!
//! 잠금 해제는 id와 홀더가 모두 일치할 때만 수행되므로, 워커는
//! 더 이상 소유하지 않는 리스를 해제할 수 없습니다.

use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

/// 잠금 획득 시도 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// 리스 획득 성공. `attempts`는 이 아이템에 대한 누적 시도 횟수.
    Acquired { attempts: i32 },
    /// 다른 홀더의 리스가 활성 상태. 호출자는 건너뛰고 재시도하지 않음.
    Locked,
}

impl AcquireOutcome {
    /// 획득 성공 여부.
    pub fn is_acquired(&self) -> bool {
        matches!(self, AcquireOutcome::Acquired { .. })
    }
}

/// 잠금 행 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct LockRecord {
    pub news_id: i64,
    pub holder: Uuid,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
}

/// 분석 잠금 repository.
#[derive(Clone)]
pub struct LockRepository {
    pool: PgPool,
    ttl_secs: i64,
}

impl LockRepository {
    /// 새 repository를 생성합니다.
    ///
    /// TTL은 파이프라인 1회 실행 + 여유를 덮을 만큼 길고, 크래시한
    /// 워커의 아이템이 수집 윈도우 안에 재시도 가능해질 만큼 짧아야
    /// 합니다.
    pub fn new(pool: PgPool, ttl_secs: i64) -> Self {
        Self { pool, ttl_secs }
    }

    /// 아이템 리스 획득을 시도합니다.
    ///
    /// K개의 동시 호출 중 정확히 하나만 `Acquired`를 받습니다.
    #[instrument(skip(self))]
    pub async fn acquire(&self, news_id: i64, holder: Uuid) -> Result<AcquireOutcome> {
        // 만료된 리스 회수 (크래시한 홀더). 이전 시도 횟수를 이어받는다.
        let reclaimed: Option<(i32,)> = sqlx::query_as(
            r#"
            DELETE FROM analysis_locks
            WHERE news_id = $1 AND expires_at < NOW()
            RETURNING attempts
            "#,
        )
        .bind(news_id)
        .fetch_optional(&self.pool)
        .await?;

        let attempts = reclaimed.map(|(prev,)| prev + 1).unwrap_or(1);

        let inserted = sqlx::query(
            r#"
            INSERT INTO analysis_locks (news_id, holder, acquired_at, expires_at, attempts)
            VALUES ($1, $2, NOW(), NOW() + $3 * INTERVAL '1 second', $4)
            "#,
        )
        .bind(news_id)
        .bind(holder)
        .bind(self.ttl_secs)
        .bind(attempts)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                debug!(news_id, %holder, attempts, "분석 잠금 획득");
                Ok(AcquireOutcome::Acquired { attempts })
            }
            Err(e) => match DataError::from(e) {
                // 다른 홀더의 활성 리스
                DataError::DuplicateError(_) => Ok(AcquireOutcome::Locked),
                other => Err(other),
            },
        }
    }

    /// 자신이 보유한 리스를 해제합니다.
    ///
    /// id와 홀더가 모두 일치하는 행만 삭제됩니다. 이미 만료되어
    /// 다른 워커가 회수한 리스는 삭제되지 않습니다.
    #[instrument(skip(self))]
    pub async fn release(&self, news_id: i64, holder: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM analysis_locks
            WHERE news_id = $1 AND holder = $2
            "#,
        )
        .bind(news_id)
        .bind(holder)
        .execute(&self.pool)
        .await?;

        let released = result.rows_affected() > 0;
        if released {
            debug!(news_id, %holder, "분석 잠금 해제");
        }
        Ok(released)
    }

    /// 특정 아이템의 잠금 행을 조회합니다 (진단용).
    pub async fn find(&self, news_id: i64) -> Result<Option<LockRecord>> {
        let record = sqlx::query_as::<_, LockRecord>(
            r#"
            SELECT news_id, holder, acquired_at, expires_at, attempts
            FROM analysis_locks
            WHERE news_id = $1
            "#,
        )
        .bind(news_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
