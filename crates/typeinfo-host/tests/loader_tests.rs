use super::*;

fn domain_loader() -> TypeLoader {
    TypeLoader::builder("domain")
        .declare(
            DeclSpec::class("Person")
                .field("name", "String")
                .field("addresses", "List<Address>"),
        )
        .declare(DeclSpec::class("Address").field("city", "String"))
        .declare(DeclSpec::class("PersonList").extends("ArrayList<Person>"))
        .declare(DeclSpec::class("Directory").extends("HashMap<String, Person>"))
        .build()
        .expect("domain loader builds")
}

#[test]
fn test_loader_ids_are_unique() {
    let a = TypeLoader::builder("a").build().unwrap();
    let b = TypeLoader::builder("b").build().unwrap();
    assert_ne!(a.id(), b.id());
    assert!(a.is_empty());
    assert!(!a.is_bootstrap());
    assert!(well_known().loader.is_bootstrap());
}

#[test]
fn test_forward_references_resolve_locally() {
    let loader = domain_loader();
    let person = loader.get("Person").unwrap();
    let address = loader.get("Address").unwrap();

    let field = person.field("addresses").unwrap();
    let TypeExpr::Class { target, arguments } = &field.ty else {
        panic!("expected class signature");
    };
    assert_eq!(person.resolve(target), well_known().list);
    let TypeExpr::Class { target, .. } = &arguments[0] else {
        panic!("expected class argument");
    };
    assert!(matches!(target, DeclRef::Local(_)));
    assert_eq!(person.resolve(target), address);
}

#[test]
fn test_raw_type_identity() {
    let loader = domain_loader();
    let first = loader.get("Person").unwrap();
    let second = loader.lookup("Person").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.key(), second.key());
    assert_eq!(first.to_string(), "Person");

    // Same name, different loader: different identity.
    let other = domain_loader();
    assert_ne!(first, other.get("Person").unwrap());
}

#[test]
fn test_lookup_falls_back_to_parents_and_well_known() {
    let domain = domain_loader();
    let app = TypeLoader::builder("app")
        .parent(&domain)
        .declare(DeclSpec::interface("People").method("all", "List<Person>", &[]))
        .build()
        .unwrap();

    assert_eq!(app.lookup("Person"), domain.get("Person"));
    assert_eq!(app.lookup("String"), Some(well_known().string.clone()));
    assert!(app.get("Person").is_none());
    assert!(app.lookup("Missing").is_none());
}

#[test]
fn test_raw_subtyping() {
    let loader = domain_loader();
    let wk = well_known();
    let person_list = loader.get("PersonList").unwrap();

    assert!(person_list.is_subtype_of(&wk.array_list));
    assert!(person_list.is_subtype_of(&wk.list));
    assert!(person_list.is_subtype_of(&wk.iterable));
    assert!(person_list.is_subtype_of(&wk.object));
    assert!(!person_list.is_subtype_of(&wk.map));
    assert!(!wk.list.is_subtype_of(&person_list));
    assert!(wk.array.is_subtype_of(&wk.object));
    assert!(wk.long.is_subtype_of(&wk.number));
}

#[test]
fn test_shapes() {
    let loader = domain_loader();
    let wk = well_known();

    assert_eq!(loader.get("Person").unwrap().shape(), Shape::Aggregate);
    assert_eq!(loader.get("PersonList").unwrap().shape(), Shape::Sequence);
    assert_eq!(loader.get("Directory").unwrap().shape(), Shape::Map);
    assert_eq!(wk.string.shape(), Shape::Scalar);
    assert_eq!(wk.set.shape(), Shape::Sequence);
    assert_eq!(wk.hash_map.shape(), Shape::Map);
    assert_eq!(wk.array.shape(), Shape::Array);
    assert_eq!(wk.object.shape(), Shape::Aggregate);
}

#[test]
fn test_self_referential_bound_lowers_without_cycle() {
    let enumeration = &well_known().enumeration;
    let bound = enumeration.bound_of(0).expect("E has a bound");
    let TypeExpr::Class { target, arguments } = bound else {
        panic!("expected class bound");
    };
    assert_eq!(enumeration.resolve(target), *enumeration);
    assert!(matches!(arguments[0], TypeExpr::Variable(VarRef::Type(0))));
}

#[test]
fn test_method_type_params_shadow_type_params() {
    let loader = TypeLoader::builder("repo")
        .declare(
            DeclSpec::interface("Repository<T, ID>")
                .generic_method("save", "S extends T", "S", &["S"])
                .generic_method("map", "T", "T", &[])
                .method("findById", "Optional<T>", &["ID"]),
        )
        .build()
        .unwrap();
    let repository = loader.get("Repository").unwrap();

    let save = repository.method("save").unwrap();
    assert!(matches!(save.return_type, TypeExpr::Variable(VarRef::Method(0))));
    assert!(matches!(
        save.type_params[0].bound(),
        Some(TypeExpr::Variable(VarRef::Type(0)))
    ));

    let map = repository.method("map").unwrap();
    assert!(matches!(map.return_type, TypeExpr::Variable(VarRef::Method(0))));

    let find = repository.method("findById").unwrap();
    assert!(matches!(find.parameters[0], TypeExpr::Variable(VarRef::Type(1))));
    assert!(find.return_type.mentions_variables());
}

#[test]
fn test_build_errors() {
    let unknown = TypeLoader::builder("bad")
        .declare(DeclSpec::class("Person").field("pet", "Dog"))
        .build();
    assert!(matches!(unknown, Err(HostError::UnknownType { ref name, .. }) if name == "Dog"));

    let duplicate = TypeLoader::builder("bad")
        .declare(DeclSpec::class("Person"))
        .declare(DeclSpec::class("Person"))
        .build();
    assert!(matches!(duplicate, Err(HostError::DuplicateType { .. })));

    let arity = TypeLoader::builder("bad")
        .declare(DeclSpec::class("Person").field("tags", "List<String, String>"))
        .build();
    assert!(matches!(
        arity,
        Err(HostError::ArityMismatch {
            expected: 1,
            found: 2,
            ..
        })
    ));

    let variable_args = TypeLoader::builder("bad")
        .declare(DeclSpec::class("Box<T>").field("inner", "T<String>"))
        .build();
    assert!(matches!(variable_args, Err(HostError::ArityMismatch { .. })));

    let supertype = TypeLoader::builder("bad")
        .declare(DeclSpec::class("Box<T>").extends("T"))
        .build();
    assert!(matches!(supertype, Err(HostError::InvalidSupertype { .. })));

    let member = TypeLoader::builder("bad")
        .declare(
            DeclSpec::class("Person")
                .field("name", "String")
                .field("name", "String"),
        )
        .build();
    assert!(matches!(member, Err(HostError::DuplicateMember { .. })));
}

#[test]
fn test_raw_usage_is_allowed() {
    let loader = TypeLoader::builder("raw")
        .declare(DeclSpec::class("Legacy").field("items", "List"))
        .build()
        .unwrap();
    let field = loader.get("Legacy").unwrap().field("items").cloned().unwrap();
    assert!(matches!(field.ty, TypeExpr::Class { ref arguments, .. } if arguments.is_empty()));
}

#[test]
fn test_weak_raw_type_follows_loader_lifetime() {
    let loader = domain_loader();
    let weak = loader.get("Person").unwrap().downgrade();
    assert!(weak.is_live());
    assert_eq!(weak.upgrade().unwrap().name(), "Person");

    drop(loader);
    assert!(!weak.is_live());
    assert!(weak.upgrade().is_none());
}
