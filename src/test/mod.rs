//! Shared type factories for unit tests.
//!
//! Every factory builds fresh descriptors, so tests never share type identity unless they
//! go through the [`corelib`].

use strum::IntoEnumIterator;

use crate::typesystem::{
    corelib, Constructor, PrimitiveKind, SlotAttributes, SlotType, TypeAttributes, TypeBuilder,
    TypeRef, TypeRegistry, TypeShape, Visibility,
};

/// Shape with freely chosen attributes, for checks that need no real descriptor.
#[derive(Debug, Clone)]
pub struct MockShape {
    name: String,
    attributes: TypeAttributes,
    interface: bool,
}

impl MockShape {
    pub fn new(name: &str) -> Self {
        MockShape {
            name: name.to_string(),
            attributes: TypeAttributes::empty(),
            interface: false,
        }
    }

    pub fn with_attributes(mut self, attributes: TypeAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn as_interface(mut self) -> Self {
        self.interface = true;
        self.attributes |= TypeAttributes::ABSTRACT;
        self
    }
}

impl TypeShape for MockShape {
    fn simple_name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> TypeAttributes {
        self.attributes
    }

    fn is_primitive(&self) -> bool {
        false
    }

    fn is_array(&self) -> bool {
        false
    }

    fn is_enum(&self) -> bool {
        false
    }

    fn is_composite(&self) -> bool {
        false
    }

    fn is_interface(&self) -> bool {
        self.interface
    }
}

// `A { a: i32, c: i32 }` and `B extends A { a: i32, b: i32 }`, B shadowing `a`
pub fn shadowing_pair() -> (TypeRef, TypeRef) {
    let parent = TypeBuilder::class("shadow", "A")
        .slot("a", PrimitiveKind::I32)
        .slot("c", PrimitiveKind::I32)
        .build()
        .unwrap();
    let child = TypeBuilder::class("shadow", "B")
        .extends(&parent)
        .slot("a", PrimitiveKind::I32)
        .slot("b", PrimitiveKind::I32)
        .build()
        .unwrap();

    (parent, child)
}

// Abstract `Animal`, concrete `Dog` and the `Pet` interface Dog implements
pub fn animal_hierarchy() -> (TypeRef, TypeRef, TypeRef) {
    let animal = TypeBuilder::class("zoo", "Animal")
        .visibility(Visibility::Public)
        .with_flags(TypeAttributes::ABSTRACT)
        .slot("legs", PrimitiveKind::I32)
        .build()
        .unwrap();
    let pet = TypeBuilder::interface("zoo", "Pet").build().unwrap();
    let dog = TypeBuilder::class("zoo", "Dog")
        .visibility(Visibility::Public)
        .extends(&animal)
        .implements(&pet)
        .slot("good", PrimitiveKind::Bool)
        .constructor(Constructor::new([
            ("legs", SlotType::Primitive(PrimitiveKind::I32)),
            ("good", SlotType::Primitive(PrimitiveKind::Bool)),
        ]))
        .constructor(Constructor::new([(
            "good",
            SlotType::Primitive(PrimitiveKind::Bool),
        )]))
        .build()
        .unwrap();

    (animal, dog, pet)
}

// A class with a private final slot, a reference slot and several primitives
pub fn person_type() -> TypeRef {
    TypeBuilder::class("people", "Person")
        .visibility(Visibility::Public)
        .slot_with_attrs(
            "id",
            PrimitiveKind::I64,
            SlotAttributes::PRIVATE | SlotAttributes::FINAL,
        )
        .slot("name", &corelib().string())
        .slot("age", PrimitiveKind::I32)
        .slot("initial", PrimitiveKind::Char)
        .slot_with_attrs("active", PrimitiveKind::Bool, SlotAttributes::PUBLIC)
        .build()
        .unwrap()
}

// A composite with one component of every primitive kind plus an object reference
pub fn everything_composite() -> TypeRef {
    TypeBuilder::composite("shapes", "Everything")
        .component("tiny", PrimitiveKind::I8)
        .component("small", PrimitiveKind::I16)
        .component("medium", PrimitiveKind::I32)
        .component("large", PrimitiveKind::I64)
        .component("single", PrimitiveKind::F32)
        .component("double", PrimitiveKind::F64)
        .component("flag", PrimitiveKind::Bool)
        .component("letter", PrimitiveKind::Char)
        .component("object", &corelib().object())
        .build()
        .unwrap()
}

/// One descriptor per distinguishable shape, each carrying a unique name.
///
/// Contains all primitives and wrappers, `i32[]`, `Object[]`, the enum `Color`, the
/// composite `Point`, the interface `Drawable` and one class per modifier
/// (`AbstractShape`, `FinalShape`, `PublicShape`, `PrivateShape`, `ProtectedShape`,
/// `StaticShape`, `SealedShape`) plus `PlainShape` without any.
pub fn shape_matrix() -> Vec<TypeRef> {
    let registry = TypeRegistry::new();
    let mut shapes = Vec::new();

    for kind in PrimitiveKind::iter() {
        shapes.push(corelib().primitive(kind));
        shapes.push(corelib().wrapper(kind));
    }

    shapes.push(
        registry
            .array_of(&corelib().primitive(PrimitiveKind::I32))
            .unwrap(),
    );
    shapes.push(registry.array_of(&corelib().object()).unwrap());
    shapes.push(TypeBuilder::enumeration("shapes", "Color").build().unwrap());
    shapes.push(
        TypeBuilder::composite("shapes", "Point")
            .component("x", PrimitiveKind::I32)
            .component("y", PrimitiveKind::I32)
            .build()
            .unwrap(),
    );
    shapes.push(TypeBuilder::interface("shapes", "Drawable").build().unwrap());

    let modifiers = [
        ("AbstractShape", TypeAttributes::ABSTRACT),
        ("FinalShape", TypeAttributes::FINAL),
        ("StaticShape", TypeAttributes::STATIC),
        ("SealedShape", TypeAttributes::SEALED),
        ("PlainShape", TypeAttributes::empty()),
    ];
    for (name, flags) in modifiers {
        shapes.push(
            TypeBuilder::class("shapes", name)
                .with_flags(flags)
                .build()
                .unwrap(),
        );
    }

    let visibilities = [
        ("PublicShape", Visibility::Public),
        ("PrivateShape", Visibility::Private),
        ("ProtectedShape", Visibility::Protected),
    ];
    for (name, visibility) in visibilities {
        shapes.push(
            TypeBuilder::class("shapes", name)
                .visibility(visibility)
                .build()
                .unwrap(),
        );
    }

    shapes
}
