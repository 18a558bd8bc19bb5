//! Resolution and cache benchmarks.
//!
//! Compares uncached resolution of declared types against cache hits, and
//! measures specialization and assignability on repository-shaped types.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use typeinfo::{
    DeclSpec, RepositoryMetadata, Specializer, TypeCache, TypeDescriptor, TypeHandle, TypeLoader,
    resolve, well_known,
};

fn application() -> TypeLoader {
    TypeLoader::builder("bench")
        .declare(DeclSpec::class("Person").extends("Comparable<Person>"))
        .declare(
            DeclSpec::interface("Repository<T, ID>")
                .method("findAll", "List<T>", &[])
                .method("findById", "Optional<T>", &["ID"])
                .generic_method("saveAll", "S extends T", "List<S>", &["Iterable<S>"]),
        )
        .declare(DeclSpec::interface("PersonRepository").extends("Repository<Person, Long>"))
        .declare(
            DeclSpec::class("Index<K extends Comparable<K>, V>")
                .extends("HashMap<K, List<V>>")
                .field("entries", "Map<K, Set<Optional<V>>>"),
        )
        .build()
        .expect("bench loader builds")
}

/// Benchmark resolving declared types, with and without the cache.
fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let loader = application();
    let cases = [
        ("person", loader.get("Person").unwrap()),
        ("repository", loader.get("Repository").unwrap()),
        ("index", loader.get("Index").unwrap()),
        ("enum", well_known().enumeration.clone()),
    ];

    for (name, raw) in &cases {
        group.bench_with_input(BenchmarkId::new("uncached", name), raw, |b, raw| {
            b.iter(|| black_box(resolve(&TypeHandle::class(raw), None)))
        });

        let cache = TypeCache::new();
        let _held = cache.get(raw);
        group.bench_with_input(BenchmarkId::new("cached", name), raw, |b, raw| {
            b.iter(|| black_box(cache.get(raw)))
        });
    }

    group.finish();
}

/// Benchmark method return resolution in a repository context.
fn bench_repository(c: &mut Criterion) {
    let mut group = c.benchmark_group("repository");
    let loader = application();
    let interface = loader.get("PersonRepository").unwrap();
    let root = loader.get("Repository").unwrap();

    group.bench_function("metadata", |b| {
        b.iter(|| black_box(RepositoryMetadata::new(&interface, &root).map(|m| m.domain_type())))
    });

    let metadata = RepositoryMetadata::new(&interface, &root).unwrap();
    for method in ["findAll", "findById", "saveAll"] {
        group.bench_with_input(BenchmarkId::new("returned_domain_type", method), method, |b, m| {
            b.iter(|| black_box(metadata.returned_domain_type(m)))
        });
    }

    group.finish();
}

/// Benchmark specialization and assignability.
fn bench_relations(c: &mut Criterion) {
    let mut group = c.benchmark_group("relations");
    let loader = application();
    let wk = well_known();
    let specializer = Specializer::new();

    let index = loader.get("Index").unwrap();
    let entries = resolve(&TypeHandle::field(&index, "entries").unwrap(), None);
    let person = TypeDescriptor::erased_of(&loader.get("Person").unwrap());
    let concrete =
        TypeDescriptor::parameterized(&index, [person.clone(), person.clone()]).unwrap();

    group.bench_function("specialize_field", |b| {
        b.iter(|| black_box(specializer.specialize(&entries, &concrete)))
    });

    let target = TypeDescriptor::parameterized(
        &wk.map,
        [person.clone(), TypeDescriptor::parameterized(&wk.list, [person]).unwrap()],
    )
    .unwrap();
    group.bench_function("assignable_through_supertypes", |b| {
        b.iter(|| black_box(specializer.is_assignable_from(&concrete, &target)))
    });

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_repository, bench_relations);
criterion_main!(benches);
