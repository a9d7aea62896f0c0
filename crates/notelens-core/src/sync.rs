//! Lock helpers that ignore poisoning.
//!
//! A poisoned lock means some thread panicked while holding it; the panic is
//! the interesting failure, not the poison flag. These extension traits
//! acquire the guard regardless, which keeps handle-map bookkeeping and the
//! JSON store usable after a worker panic.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Extension trait for `Mutex` that ignores lock poisoning.
pub trait IgnoreLock<T> {
    /// Locks the mutex, clearing any poison error.
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnoreLock<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Extension trait for `RwLock` that ignores lock poisoning.
pub trait IgnoreRwLock<T> {
    /// Acquires a read guard, clearing any poison error.
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T>;
    /// Acquires a write guard, clearing any poison error.
    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> IgnoreRwLock<T> for RwLock<T> {
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T> {
        match self.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T> {
        match self.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutex_guard_after_normal_use() {
        let lock = Mutex::new(5);
        *lock.lock_ignore_poison() = 7;
        assert_eq!(*lock.lock_ignore_poison(), 7);
    }

    #[test]
    fn rwlock_read_write() {
        let lock = RwLock::new(vec![1, 2]);
        lock.write_ignore_poison().push(3);
        assert_eq!(lock.read_ignore_poison().len(), 3);
    }
}
