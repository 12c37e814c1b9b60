use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::SqlMapperError;
use crate::queries::QueryAccessor;

type Entry = Arc<dyn Any + Send + Sync>;

/// One lazily built instance per `QueryAccessor` type.
#[derive(Default)]
pub(crate) struct QueryRegistry {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl QueryRegistry {
    pub(crate) fn get<Q: QueryAccessor>(&self, variant: &str) -> Result<Arc<Q>, SqlMapperError> {
        let key = TypeId::of::<Q>();
        if let Some(found) = read(&self.entries).get(&key) {
            return downcast(found);
        }

        let mut entries = write(&self.entries);
        if let Some(found) = entries.get(&key) {
            return downcast(found);
        }
        let created = Arc::new(Q::create(variant)?);
        debug!(
            accessor = std::any::type_name::<Q>(),
            variant, "Created query accessor"
        );
        entries.insert(key, Arc::clone(&created) as Entry);
        Ok(created)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        read(&self.entries).len()
    }
}

fn downcast<Q: QueryAccessor>(entry: &Entry) -> Result<Arc<Q>, SqlMapperError> {
    Arc::clone(entry).downcast::<Q>().map_err(|_| {
        SqlMapperError::ConfigError(format!(
            "query accessor registered under the wrong type: {}",
            std::any::type_name::<Q>()
        ))
    })
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Counted(String);

    impl QueryAccessor for Counted {
        fn create(variant: &str) -> Result<Self, SqlMapperError> {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(Counted(variant.to_string()))
        }
    }

    struct Broken;

    impl QueryAccessor for Broken {
        fn create(_variant: &str) -> Result<Self, SqlMapperError> {
            Err(SqlMapperError::ConfigError("no texts".into()))
        }
    }

    #[test]
    fn builds_each_type_once() {
        let registry = QueryRegistry::default();
        let first = registry.get::<Counted>("mysql").unwrap();
        let second = registry.get::<Counted>("ignored").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.0, "mysql");
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    static SHARED_BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Shared;

    impl QueryAccessor for Shared {
        fn create(_variant: &str) -> Result<Self, SqlMapperError> {
            SHARED_BUILT.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Shared)
        }
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        const THREADS: usize = 8;
        let registry = QueryRegistry::default();
        let barrier = Barrier::new(THREADS);

        let built: Vec<Arc<Shared>> = thread::scope(|s| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        registry.get::<Shared>("").unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(SHARED_BUILT.load(Ordering::SeqCst), 1);
        assert_eq!(built.len(), THREADS);
        assert!(built.iter().all(|a| Arc::ptr_eq(a, &built[0])));
    }

    #[test]
    fn failed_construction_is_not_cached() {
        let registry = QueryRegistry::default();
        assert!(registry.get::<Broken>("").is_err());
        assert_eq!(registry.len(), 0);
    }
}
