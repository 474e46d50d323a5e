//! Serialized allocation of collision-free short codes.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{OsRandom, RandomSource, generate_code_with};

/// Default length of generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default number of candidates tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Why no code could be allocated.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// Every candidate collided or could not be drawn.
    #[error(
        "failed to generate unique short code after {attempts} attempts ({random_failures} random source failures)"
    )]
    Exhausted {
        attempts: usize,
        random_failures: usize,
    },

    /// The existence check or the persist step failed.
    #[error(transparent)]
    Store(AppError),
}

/// Allocates short codes that are not yet present in the link store.
///
/// Allocation runs under a single async mutex held across the whole
/// draw-and-check loop, existence-check round trips included. Code creation is
/// therefore serialized; redirects never touch this lock.
///
/// Candidates are `code_length` characters drawn uniformly from `[a-zA-Z0-9]`
/// using a cryptographically secure source. A source failure burns the
/// attempt; nothing ever falls back to a predictable generator.
pub struct CodeAllocator<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    source: Arc<dyn RandomSource>,
    code_length: usize,
    max_attempts: usize,
    lock: Mutex<()>,
}

impl<L: LinkRepository + ?Sized> CodeAllocator<L> {
    /// Creates an allocator drawing from the operating system CSPRNG.
    pub fn new(repository: Arc<L>, code_length: usize, max_attempts: usize) -> Self {
        Self::with_source(repository, Arc::new(OsRandom), code_length, max_attempts)
    }

    pub fn with_source(
        repository: Arc<L>,
        source: Arc<dyn RandomSource>,
        code_length: usize,
        max_attempts: usize,
    ) -> Self {
        Self {
            repository,
            source,
            code_length,
            max_attempts,
            lock: Mutex::new(()),
        }
    }

    /// Returns a code the repository reports as unused.
    ///
    /// The lock is released on return, so a caller that persists the code
    /// afterwards can race another allocation that draws the same candidate.
    /// Use [`CodeAllocator::allocate_with`] when the persist step must be
    /// covered too.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::Exhausted`] after `max_attempts` unusable candidates
    /// - [`AllocationError::Store`] if the existence check fails
    pub async fn allocate_unique_code(&self) -> Result<String, AllocationError> {
        let _guard = self.lock.lock().await;
        self.find_free_code().await
    }

    /// Allocates a code and runs `persist` with it before releasing the lock.
    ///
    /// Allocate, check and persist form one critical section, so two
    /// concurrent creations can never be handed the same code.
    ///
    /// # Errors
    ///
    /// As [`CodeAllocator::allocate_unique_code`]; an error from `persist` is
    /// returned as [`AllocationError::Store`].
    pub async fn allocate_with<T, F, Fut>(&self, persist: F) -> Result<T, AllocationError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let _guard = self.lock.lock().await;
        let code = self.find_free_code().await?;
        persist(code).await.map_err(AllocationError::Store)
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Draw-and-check loop. Caller must hold `self.lock`.
    async fn find_free_code(&self) -> Result<String, AllocationError> {
        let mut random_failures = 0;

        for _ in 0..self.max_attempts {
            let Ok(candidate) = generate_code_with(self.source.as_ref(), self.code_length) else {
                random_failures += 1;
                continue;
            };

            let taken = self
                .repository
                .exists(&candidate)
                .await
                .map_err(AllocationError::Store)?;

            if !taken {
                return Ok(candidate);
            }
        }

        Err(AllocationError::Exhausted {
            attempts: self.max_attempts,
            random_failures,
        })
    }
}
