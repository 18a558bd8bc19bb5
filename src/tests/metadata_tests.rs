use super::*;
use typeinfo_host::{DeclSpec, TypeLoader};

fn application() -> TypeLoader {
    TypeLoader::builder("application")
        .declare(DeclSpec::class("Person").field("name", "String"))
        .declare(
            DeclSpec::interface("Repository<T, ID>")
                .method("findAll", "List<T>", &[])
                .method("findById", "Optional<T>", &["ID"])
                .method("count", "Long", &[]),
        )
        .declare(
            DeclSpec::interface("PagingRepository<T, ID>")
                .extends("Repository<T, ID>")
                .method("findPage", "Optional<List<T>>", &["Integer"]),
        )
        .declare(
            DeclSpec::interface("PersonRepository")
                .extends("PagingRepository<Person, Long>")
                .method("findByName", "Person[]", &["String"])
                .method("indexByName", "Map<String, Person>", &[]),
        )
        .declare(DeclSpec::interface("RawRepository").extends("Repository"))
        .declare(DeclSpec::interface("Unrelated"))
        .build()
        .expect("application loader builds")
}

fn metadata(loader: &TypeLoader, name: &str) -> Result<RepositoryMetadata> {
    RepositoryMetadata::new(
        &loader.get(name).unwrap(),
        &loader.get("Repository").unwrap(),
    )
}

#[test]
fn test_domain_and_id_types() {
    let loader = application();
    let metadata = metadata(&loader, "PersonRepository").unwrap();

    assert_eq!(metadata.repository_interface().name(), "PersonRepository");
    assert_eq!(metadata.root().to_string(), "Repository<Person, Long>");
    assert_eq!(metadata.domain_type().raw_type(), &loader.get("Person").unwrap());
    assert_eq!(metadata.id_type().raw_type(), &well_known().long);
}

#[test]
fn test_return_types_bound_to_repository() {
    let loader = application();
    let metadata = metadata(&loader, "PersonRepository").unwrap();

    assert_eq!(metadata.return_type("findAll").unwrap().to_string(), "List<Person>");
    assert_eq!(
        metadata.return_type("findById").unwrap().to_string(),
        "Optional<Person>"
    );
    assert_eq!(
        metadata.return_type("findPage").unwrap().to_string(),
        "Optional<List<Person>>"
    );
    assert_eq!(metadata.return_type("findByName").unwrap().to_string(), "Person[]");
}

#[test]
fn test_returned_domain_type_unwraps_containers() {
    let loader = application();
    let metadata = metadata(&loader, "PersonRepository").unwrap();
    let person = loader.get("Person").unwrap();

    for method in ["findAll", "findById", "findPage", "findByName", "indexByName"] {
        let returned = metadata.returned_domain_type(method).unwrap();
        assert_eq!(returned.raw_type(), &person, "{method}");
    }
    assert_eq!(
        metadata.returned_domain_type("count").unwrap().raw_type(),
        &well_known().long
    );
}

#[test]
fn test_raw_repository_falls_back_to_object() {
    let loader = application();
    let metadata = metadata(&loader, "RawRepository").unwrap();

    assert_eq!(metadata.domain_type(), TypeDescriptor::object());
    assert_eq!(metadata.id_type(), TypeDescriptor::object());
    let find_all = metadata.return_type("findAll").unwrap();
    assert!(find_all.argument(0).unwrap().is_placeholder());
    assert_eq!(
        metadata.returned_domain_type("findAll").unwrap().raw_type(),
        &well_known().object
    );
}

#[test]
fn test_not_a_repository() {
    let loader = application();
    assert_eq!(
        metadata(&loader, "Unrelated").unwrap_err(),
        TypeInfoError::NotARepository {
            interface: "Unrelated".to_string(),
            root: "Repository".to_string(),
        }
    );
}

#[test]
fn test_unknown_method() {
    let loader = application();
    let metadata = metadata(&loader, "PersonRepository").unwrap();
    assert!(matches!(
        metadata.return_type("deleteAll"),
        Err(TypeInfoError::UnknownMember { .. })
    ));
}
