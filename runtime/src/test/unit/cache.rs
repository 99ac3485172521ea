use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::Error;
use crate::cache::KernelCache;

#[test]
fn test_build_once_then_hit() {
    let cache: KernelCache<String, usize> = KernelCache::new("test");
    let calls = AtomicUsize::new(0);

    for _ in 0..5 {
        let value = cache
            .get_or_try_build(&"k".to_string(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .unwrap();
        assert_eq!(*value, 42);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.builds(), 1);
    assert_eq!(cache.hits(), 4);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_failed_build_not_cached() {
    let cache: KernelCache<u32, u32> = KernelCache::new("test");

    let result = cache.get_or_try_build(&1, || Err(Error::Compilation { reason: "boom".into() }));
    assert!(matches!(result, Err(Error::Compilation { .. })));
    assert!(cache.is_empty());

    assert_eq!(*cache.get_or_try_build(&1, || Ok(7)).unwrap(), 7);
    assert_eq!(cache.builds(), 1);
}

#[test]
fn test_failed_builds_release_gates() {
    let cache: KernelCache<u32, u32> = KernelCache::new("test");

    for key in 0..16 {
        let result = cache.get_or_try_build(&key, || Err(Error::Compilation { reason: "boom".into() }));
        assert!(result.is_err());
    }
    assert_eq!(cache.pending(), 0);

    cache.get_or_try_build(&3, || Ok(3)).unwrap();
    assert_eq!(cache.pending(), 0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_failure_with_waiters_builds_again() {
    let cache: KernelCache<u32, u32> = KernelCache::new("test");
    let attempts = AtomicUsize::new(0);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let _ = cache.get_or_try_build(&5, || {
                    std::thread::sleep(Duration::from_millis(10));
                    match attempts.fetch_add(1, Ordering::SeqCst) {
                        0 => Err(Error::Compilation { reason: "first attempt".into() }),
                        _ => Ok(50),
                    }
                });
            });
        }
    });

    assert_eq!(*cache.get(&5).unwrap(), 50);
    assert_eq!(cache.builds(), 1);
    assert_eq!(cache.pending(), 0);
}

#[test]
fn test_reentrant_build_rejected() {
    let cache: KernelCache<u32, u32> = KernelCache::new("test");

    let result = cache.get_or_try_build(&1, || {
        let inner = cache.get_or_try_build(&1, || Ok(0))?;
        Ok(*inner + 1)
    });

    assert!(matches!(result, Err(Error::ReentrantBuild { .. })));
    assert!(cache.get(&1).is_none());
}

#[test]
fn test_nested_distinct_keys() {
    let cache: KernelCache<u32, u32> = KernelCache::new("test");

    let outer = cache.get_or_try_build(&1, || Ok(*cache.get_or_try_build(&2, || Ok(20))? + 1)).unwrap();

    assert_eq!(*outer, 21);
    assert_eq!(cache.builds(), 2);
}

#[test]
fn test_concurrent_first_use_builds_once() {
    let cache: KernelCache<u32, u32> = KernelCache::new("test");
    let calls = AtomicUsize::new(0);

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let value = cache
                    .get_or_try_build(&9, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(20));
                        Ok(99)
                    })
                    .unwrap();
                assert_eq!(*value, 99);
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.builds(), 1);
    assert_eq!(cache.hits(), 7);
}

#[test]
fn test_debug_reports_counters() {
    let cache: KernelCache<String, usize> = KernelCache::new("render");
    cache.get_or_try_build(&"k".to_string(), || Ok(1)).unwrap();
    cache.get_or_try_build(&"k".to_string(), || Ok(1)).unwrap();

    let text = format!("{cache:?}");
    assert!(text.contains("\"render\""), "{text}");
    assert!(text.contains("hits: 1"), "{text}");
    assert!(text.contains("builds: 1"), "{text}");
    assert!(text.contains("pending: 0"), "{text}");
}
