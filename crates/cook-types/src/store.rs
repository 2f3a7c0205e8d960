use std::collections::HashMap;

use crate::{ClassDef, ClassId, ClassKind, Type, TypeEnv, TypeParamDef, TypeParamId, WellKnownTypes};

/// In-memory class environment.
///
/// Class ids are allocated densely in declaration order, so `class_ids()` iterates classes in
/// the order they were added. A class id may be reserved with [`TypeStore::intern_class_id`]
/// before its definition is known, which allows self-referential declarations.
#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<Option<ClassDef>>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl TypeStore {
    /// A store containing only the classes every resolution needs: `Object`, `Cloneable`,
    /// `Serializable`, `String` and `Integer`.
    pub fn new() -> Self {
        Self::bootstrap().0
    }

    /// Builds the base store and returns it with the ids of `Number` and `Comparable`.
    fn bootstrap() -> (Self, ClassId, ClassId) {
        let mut store = TypeStore {
            classes: Vec::new(),
            class_by_name: HashMap::new(),
            type_params: Vec::new(),
            well_known: WellKnownTypes {
                object: ClassId(0),
                cloneable: ClassId(0),
                serializable: ClassId(0),
                string: ClassId(0),
                integer: ClassId(0),
            },
        };

        let object = store.add_class(ClassDef {
            name: "java.lang.Object".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
        });
        let object_ty = Type::class(object, vec![]);
        let cloneable = store.add_interface("java.lang.Cloneable", vec![], vec![]);
        let serializable = store.add_interface("java.io.Serializable", vec![], vec![]);

        let comparable_t = store.add_type_param("T", vec![object_ty.clone()]);
        let comparable =
            store.add_interface("java.lang.Comparable", vec![comparable_t], vec![]);
        let char_sequence = store.add_interface("java.lang.CharSequence", vec![], vec![]);

        let string = store.intern_class_id("java.lang.String");
        store.define_class(
            string,
            ClassDef {
                name: "java.lang.String".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(object_ty.clone()),
                interfaces: vec![
                    Type::class(serializable, vec![]),
                    Type::class(comparable, vec![Type::class(string, vec![])]),
                    Type::class(char_sequence, vec![]),
                ],
            },
        );

        let number = store.add_class(ClassDef {
            name: "java.lang.Number".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(object_ty),
            interfaces: vec![Type::class(serializable, vec![])],
        });
        let integer = store.add_boxed_number("java.lang.Integer", number, comparable);

        store.well_known = WellKnownTypes {
            object,
            cloneable,
            serializable,
            string,
            integer,
        };
        (store, number, comparable)
    }

    /// A small slice of the JDK that covers the common generification targets.
    pub fn with_minimal_jdk() -> Self {
        let (mut store, number, comparable) = Self::bootstrap();
        let object_ty = Type::class(store.well_known.object, vec![]);

        store.add_boxed_number("java.lang.Long", number, comparable);
        store.add_boxed_number("java.lang.Double", number, comparable);

        let boolean = store.intern_class_id("java.lang.Boolean");
        store.define_class(
            boolean,
            ClassDef {
                name: "java.lang.Boolean".to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(object_ty.clone()),
                interfaces: vec![
                    Type::class(store.well_known.serializable, vec![]),
                    Type::class(comparable, vec![Type::class(boolean, vec![])]),
                ],
            },
        );

        let iterable_t = store.add_type_param("T", vec![object_ty.clone()]);
        let iterable = store.add_interface("java.lang.Iterable", vec![iterable_t], vec![]);

        let collection_e = store.add_type_param("E", vec![object_ty.clone()]);
        let collection = store.add_interface(
            "java.util.Collection",
            vec![collection_e],
            vec![Type::class(iterable, vec![Type::TypeParam(collection_e)])],
        );

        let list_e = store.add_type_param("E", vec![object_ty.clone()]);
        let list = store.add_interface(
            "java.util.List",
            vec![list_e],
            vec![Type::class(collection, vec![Type::TypeParam(list_e)])],
        );

        let set_e = store.add_type_param("E", vec![object_ty.clone()]);
        let set = store.add_interface(
            "java.util.Set",
            vec![set_e],
            vec![Type::class(collection, vec![Type::TypeParam(set_e)])],
        );

        let array_list_e = store.add_type_param("E", vec![object_ty.clone()]);
        store.add_collection_impl("java.util.ArrayList", array_list_e, list);
        let linked_list_e = store.add_type_param("E", vec![object_ty.clone()]);
        store.add_collection_impl("java.util.LinkedList", linked_list_e, list);
        let hash_set_e = store.add_type_param("E", vec![object_ty.clone()]);
        store.add_collection_impl("java.util.HashSet", hash_set_e, set);

        let map_k = store.add_type_param("K", vec![object_ty.clone()]);
        let map_v = store.add_type_param("V", vec![object_ty.clone()]);
        let map = store.add_interface("java.util.Map", vec![map_k, map_v], vec![]);

        let hash_map_k = store.add_type_param("K", vec![object_ty.clone()]);
        let hash_map_v = store.add_type_param("V", vec![object_ty.clone()]);
        store.add_class(ClassDef {
            name: "java.util.HashMap".to_string(),
            kind: ClassKind::Class,
            type_params: vec![hash_map_k, hash_map_v],
            super_class: Some(object_ty),
            interfaces: vec![
                Type::class(
                    map,
                    vec![Type::TypeParam(hash_map_k), Type::TypeParam(hash_map_v)],
                ),
                Type::class(store.well_known.cloneable, vec![]),
                Type::class(store.well_known.serializable, vec![]),
            ],
        });

        store
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    /// Reserve (or look up) the id for `name` without defining it yet.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_by_name.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(None);
        self.class_by_name.insert(name.to_string(), id);
        id
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        if let Some(old) = self.classes.get(id.0 as usize).and_then(|c| c.as_ref()) {
            if old.name != def.name {
                self.class_by_name.remove(&old.name);
            }
        }
        self.class_by_name.insert(def.name.clone(), id);
        let slot = id.0 as usize;
        if slot >= self.classes.len() {
            self.classes.resize(slot + 1, None);
        }
        self.classes[slot] = Some(def);
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)?.as_mut()
    }

    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeParamId {
        let id = TypeParamId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.to_string(),
            upper_bounds,
        });
        id
    }

    /// Convenience for `class Name<params> extends Object implements interfaces`.
    pub fn add_simple_class(
        &mut self,
        name: &str,
        type_params: Vec<TypeParamId>,
        super_class: Option<Type>,
        interfaces: Vec<Type>,
    ) -> ClassId {
        let super_class =
            super_class.unwrap_or_else(|| Type::class(self.well_known.object, vec![]));
        self.add_class(ClassDef {
            name: name.to_string(),
            kind: ClassKind::Class,
            type_params,
            super_class: Some(super_class),
            interfaces,
        })
    }

    pub fn add_interface(
        &mut self,
        name: &str,
        type_params: Vec<TypeParamId>,
        interfaces: Vec<Type>,
    ) -> ClassId {
        self.add_class(ClassDef {
            name: name.to_string(),
            kind: ClassKind::Interface,
            type_params,
            super_class: None,
            interfaces,
        })
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.lookup_class(name)
    }

    fn add_boxed_number(&mut self, name: &str, number: ClassId, comparable: ClassId) -> ClassId {
        let id = self.intern_class_id(name);
        self.define_class(
            id,
            ClassDef {
                name: name.to_string(),
                kind: ClassKind::Class,
                type_params: vec![],
                super_class: Some(Type::class(number, vec![])),
                interfaces: vec![Type::class(comparable, vec![Type::class(id, vec![])])],
            },
        );
        id
    }

    fn add_collection_impl(&mut self, name: &str, elem: TypeParamId, iface: ClassId) -> ClassId {
        let object = Type::class(self.well_known.object, vec![]);
        let cloneable = Type::class(self.well_known.cloneable, vec![]);
        let serializable = Type::class(self.well_known.serializable, vec![]);
        self.add_class(ClassDef {
            name: name.to_string(),
            kind: ClassKind::Class,
            type_params: vec![elem],
            super_class: Some(object),
            interfaces: vec![
                Type::class(iface, vec![Type::TypeParam(elem)]),
                cloneable,
                serializable,
            ],
        })
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)?.as_ref()
    }

    fn type_param(&self, id: TypeParamId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    fn class_ids(&self) -> Vec<ClassId> {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, def)| def.is_some())
            .map(|(idx, _)| ClassId(idx as u32))
            .collect()
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}
