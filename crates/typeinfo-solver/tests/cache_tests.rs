use super::*;
use rayon::prelude::*;
use std::sync::atomic::AtomicUsize;
use typeinfo_host::{DeclSpec, TypeLoader};

fn module(name: &str) -> TypeLoader {
    TypeLoader::builder(name)
        .declare(DeclSpec::class("Person").field("name", "String"))
        .declare(DeclSpec::class("Box<X>").field("value", "X"))
        .declare(DeclSpec::interface("Repository<T, ID>").method("findAll", "List<T>", &[]))
        .build()
        .expect("module loader builds")
}

#[test]
fn test_get_is_idempotent() {
    let cache = TypeCache::new();
    let loader = module("app");
    let boxed = loader.get("Box").unwrap();

    let first = cache.get(&boxed);
    let second = cache.get(&boxed);
    assert_eq!(first, second);
    // While a handle is held, the stored node is shared.
    assert!(first.ptr_eq(&second));
    assert_eq!(first, resolve(&TypeHandle::class(&boxed), None));

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_foundational_types_are_pinned() {
    let cache = TypeCache::new();
    let wk = well_known();
    let pinned = wk.foundational().len();
    assert_eq!(cache.len(), pinned);

    for raw in wk.foundational() {
        assert!(cache.contains(raw));
        let descriptor = cache.get(raw);
        assert_eq!(descriptor.raw_type(), raw);
    }
    assert_eq!(cache.stats().misses, 0);

    // Dropping every handle does not evict them.
    assert_eq!(cache.reclaim(), 0);
    assert!(cache.contains(&wk.list));
    assert_eq!(cache.len(), pinned);
}

#[test]
fn test_entries_outlive_dropped_descriptors() {
    let cache = TypeCache::new();
    let loader = module("app");
    let person = loader.get("Person").unwrap();
    let builds = AtomicUsize::new(0);
    let build = |raw: &RawType| {
        builds.fetch_add(1, Ordering::SeqCst);
        resolve(&TypeHandle::class(raw), None)
    };

    for _ in 0..3 {
        let descriptor = cache.get_or_build(&person, build);
        assert_eq!(descriptor.raw_type(), &person);
    }
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(cache.contains(&person));
    assert_eq!(cache.reclaim(), 0);

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.reclaimed, 0);
}

#[test]
fn test_rebuilt_descriptor_is_shared_while_held() {
    let cache = TypeCache::new();
    let loader = module("app");
    let repository = loader.get("Repository").unwrap();
    let expected = resolve(&TypeHandle::class(&repository), None);

    drop(cache.get(&repository));
    let again = cache.get(&repository);
    assert_eq!(again, expected);
    assert!(again.argument(0).unwrap().is_placeholder());
    assert!(again.ptr_eq(&cache.get(&repository)));
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_entries_do_not_retain_loaders() {
    let cache = TypeCache::new();
    let weak = {
        let loader = module("redeployed");
        let person = loader.get("Person").unwrap();
        let descriptor = cache.get(&person);
        assert!(cache.contains(&person));
        descriptor.raw_type().downgrade()
    };

    // Loader, raw type and descriptor are all gone.
    assert!(!weak.is_live());
    assert!(weak.upgrade().is_none());
    assert_eq!(cache.reclaim(), 1);
}

#[test]
fn test_eviction_only_after_unload() {
    let cache = TypeCache::new();
    let loader = module("v1");
    let repository = loader.get("Repository").unwrap();
    let expected = resolve(&TypeHandle::class(&repository), None).to_string();

    drop(cache.get(&repository));
    assert_eq!(cache.reclaim(), 0);
    drop(repository);
    assert_eq!(cache.reclaim(), 0);

    drop(loader);
    assert_eq!(cache.reclaim(), 1);
    assert_eq!(cache.stats().reclaimed, 1);
    assert_eq!(cache.len(), well_known().foundational().len());

    let redeployed = module("v2");
    let after = cache.get(&redeployed.get("Repository").unwrap());
    assert_eq!(after.to_string(), expected);
    assert_eq!(cache.stats().misses, 2);
}

#[test]
fn test_builder_for_another_type_falls_back_to_declared() {
    let cache = TypeCache::new();
    let loader = module("app");
    let person = loader.get("Person").unwrap();

    let described = cache.get_or_build(&person, |_| TypeDescriptor::object());
    assert_eq!(described.raw_type(), &person);
    assert_eq!(cache.get(&person), resolve(&TypeHandle::class(&person), None));
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_builder_runs_only_on_miss() {
    let cache = TypeCache::new();
    let loader = module("app");
    let person = loader.get("Person").unwrap();
    let builds = AtomicUsize::new(0);
    let build = |raw: &RawType| {
        builds.fetch_add(1, Ordering::SeqCst);
        resolve(&TypeHandle::class(raw), None)
    };

    let held = cache.get_or_build(&person, build);
    let again = cache.get_or_build(&person, build);
    assert!(held.ptr_eq(&again));
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    // Pinned types never reach the builder.
    cache.get_or_build(&well_known().map, build);
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_get_stores_one_result() {
    let cache = TypeCache::new();
    let loader = module("app");
    let boxed = loader.get("Box").unwrap();

    let results: Vec<TypeDescriptor> = (0..64)
        .into_par_iter()
        .map(|_| cache.get(&boxed))
        .collect();

    let first = &results[0];
    assert!(results.iter().all(|d| d == first));
    assert_eq!(cache.len(), well_known().foundational().len() + 1);
    // Whatever the race, the stored descriptor is one of the returned ones.
    let stored = cache.get(&boxed);
    assert!(results.iter().any(|d| d.ptr_eq(&stored)));
}

#[test]
fn test_concurrent_get_across_loaders() {
    let cache = TypeCache::new();
    let loaders: Vec<TypeLoader> = (0..8).map(|i| module(&format!("app-{i}"))).collect();

    let descriptors: Vec<TypeDescriptor> = loaders
        .par_iter()
        .flat_map_iter(|loader| loader.types().collect::<Vec<_>>())
        .map(|raw| cache.get(&raw))
        .collect();

    assert_eq!(descriptors.len(), 8 * 3);
    assert_eq!(cache.len(), well_known().foundational().len() + 8 * 3);
}

#[test]
fn test_periodic_sweep_reclaims_unloaded_entries() {
    let cache = TypeCache::new();
    for i in 0..CACHE_SWEEP_INTERVAL {
        let loader = module(&format!("generation-{i}"));
        drop(cache.get(&loader.get("Person").unwrap()));
    }
    // The last insertion swept every earlier generation; its own loader was
    // still loaded at the time.
    assert_eq!(cache.stats().reclaimed, CACHE_SWEEP_INTERVAL - 1);
    assert_eq!(cache.len(), well_known().foundational().len() + 1);
    assert_eq!(cache.reclaim(), 1);
}

#[test]
fn test_global_cache_is_shared() {
    assert!(std::ptr::eq(TypeCache::global(), TypeCache::global()));
    let list = TypeCache::global().get(&well_known().list);
    assert_eq!(list.to_string(), "List<E>");
}

#[test]
fn test_query_tracing_under_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let cache = TypeCache::new();
        let loader = module("traced");
        let repository = loader.get("Repository").unwrap();
        let declared = cache.get(&repository);
        let again = cache.get(&repository);
        assert_eq!(declared, again);
        assert_eq!(cache.stats().hits, 1);
    });
}
