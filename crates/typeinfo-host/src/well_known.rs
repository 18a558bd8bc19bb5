//! The bootstrap loader and the well-known types it declares.
//!
//! Created once per process on first use and never unloaded. Every other
//! loader sees these types by name without declaring them as a parent.

use crate::decl::DeclSpec;
use crate::loader::{RawType, TypeLoader};
use std::sync::OnceLock;

pub struct WellKnownTypes {
    pub loader: TypeLoader,
    /// The top type, the bound of every unbounded type variable.
    pub object: RawType,
    pub string: RawType,
    pub boolean: RawType,
    pub number: RawType,
    pub integer: RawType,
    pub long: RawType,
    pub double: RawType,
    pub comparable: RawType,
    pub enumeration: RawType,
    pub iterable: RawType,
    pub collection: RawType,
    pub list: RawType,
    pub set: RawType,
    pub array_list: RawType,
    pub hash_set: RawType,
    pub map: RawType,
    pub hash_map: RawType,
    pub optional: RawType,
    /// The built-in array type behind `T[]`.
    pub array: RawType,
}

/// Process-wide well-known types.
pub fn well_known() -> &'static WellKnownTypes {
    static WELL_KNOWN: OnceLock<WellKnownTypes> = OnceLock::new();
    WELL_KNOWN.get_or_init(WellKnownTypes::bootstrap)
}

impl WellKnownTypes {
    fn bootstrap() -> Self {
        let loader = TypeLoader::builder("bootstrap")
            .bootstrap()
            .declare(DeclSpec::class("Object"))
            .declare(DeclSpec::scalar("String").extends("Comparable<String>"))
            .declare(DeclSpec::scalar("Boolean").extends("Comparable<Boolean>"))
            .declare(DeclSpec::class("Number"))
            .declare(
                DeclSpec::scalar("Integer")
                    .extends("Number")
                    .extends("Comparable<Integer>"),
            )
            .declare(
                DeclSpec::scalar("Long")
                    .extends("Number")
                    .extends("Comparable<Long>"),
            )
            .declare(
                DeclSpec::scalar("Double")
                    .extends("Number")
                    .extends("Comparable<Double>"),
            )
            .declare(DeclSpec::interface("Comparable<T>"))
            .declare(DeclSpec::class("Enum<E extends Enum<E>>").extends("Comparable<E>"))
            .declare(DeclSpec::interface("Iterable<T>"))
            .declare(DeclSpec::interface("Collection<E>").extends("Iterable<E>"))
            .declare(DeclSpec::interface("List<E>").extends("Collection<E>"))
            .declare(DeclSpec::interface("Set<E>").extends("Collection<E>"))
            .declare(DeclSpec::class("ArrayList<E>").extends("List<E>"))
            .declare(DeclSpec::class("HashSet<E>").extends("Set<E>"))
            .declare(DeclSpec::interface("Map<K, V>"))
            .declare(DeclSpec::class("HashMap<K, V>").extends("Map<K, V>"))
            .declare(DeclSpec::class("Optional<T>").field("value", "T"))
            .declare(DeclSpec::array("Array<E>"))
            .build()
            .expect("bootstrap declarations are well-formed");

        let get = |name: &str| {
            loader
                .get(name)
                .expect("bootstrap type is declared by the bootstrap loader")
        };

        Self {
            object: get("Object"),
            string: get("String"),
            boolean: get("Boolean"),
            number: get("Number"),
            integer: get("Integer"),
            long: get("Long"),
            double: get("Double"),
            comparable: get("Comparable"),
            enumeration: get("Enum"),
            iterable: get("Iterable"),
            collection: get("Collection"),
            list: get("List"),
            set: get("Set"),
            array_list: get("ArrayList"),
            hash_set: get("HashSet"),
            map: get("Map"),
            hash_map: get("HashMap"),
            optional: get("Optional"),
            array: get("Array"),
            loader,
        }
    }

    /// The raw types whose descriptors are pinned in every descriptor cache.
    pub fn foundational(&self) -> [&RawType; 6] {
        [
            &self.object,
            &self.iterable,
            &self.collection,
            &self.list,
            &self.set,
            &self.map,
        ]
    }
}
