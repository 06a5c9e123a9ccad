//! Integration tests for raw instantiation.
//!
//! These tests drive the public API end to end: types are described with the builder,
//! instantiated through the engine and inspected through the resulting objects.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use bareforge::{
    gateway::{read_privileged_static, PrivilegedToken, RawInstance},
    prelude::*,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

fn account_type() -> Result<TypeRef> {
    let entity = TypeBuilder::class("bank", "Entity")
        .visibility(Visibility::Public)
        .with_flags(TypeAttributes::ABSTRACT)
        .slot_with_attrs(
            "id",
            PrimitiveKind::I64,
            SlotAttributes::PRIVATE | SlotAttributes::FINAL,
        )
        .build()?;

    TypeBuilder::class("bank", "Account")
        .visibility(Visibility::Public)
        .extends(&entity)
        .slot("owner", &corelib().string())
        .slot("balance", PrimitiveKind::F64)
        .slot_with_attrs(
            "number",
            PrimitiveKind::I32,
            SlotAttributes::PRIVATE | SlotAttributes::FINAL,
        )
        .slot("currency", PrimitiveKind::Char)
        .constructor(
            Constructor::new([("owner", SlotType::reference(&corelib().string()))])
                .with_body(|_| Err("accounts are opened by the bank".to_string())),
        )
        .build()
}

fn ineligible<T: std::fmt::Debug>(result: Result<T>) -> String {
    match result {
        Err(Error::Ineligible(message)) => message,
        other => panic!("expected an eligibility error, got {:?}", other),
    }
}

/// A bare instance has every slot zeroed, inherited ones included, and no constructor ran.
#[test]
fn test_create_bare_bypasses_constructor() -> Result<()> {
    let account = account_type()?;
    let engine = InstantiationEngine::new();

    assert!(matches!(
        TypeDescriptor::construct(&account, vec![Value::from("Ada")]),
        Err(Error::ConstructorRejected { .. })
    ));

    let bare = engine.create_bare(&account)?;
    let object = bare.as_object().expect("bare instance is an object");
    let instance = object.as_instance().expect("bare instance is a class instance");

    assert_eq!(instance.type_descriptor().token(), account.token());
    assert_eq!(instance.slots().len(), 5);
    assert_eq!(instance.get("id"), Some(Value::I64(0)));
    assert_eq!(instance.get("owner"), Some(Value::Null));
    assert_eq!(instance.get("balance"), Some(Value::F64(0.0)));
    assert_eq!(instance.get("number"), Some(Value::I32(0)));
    assert_eq!(instance.get("currency"), Some(Value::Char('\0')));
    Ok(())
}

/// Interfaces, abstract classes and enums are refused; interfaces fail the abstract check.
#[test]
fn test_create_bare_refuses_unallocatable_shapes() -> Result<()> {
    let engine = InstantiationEngine::new();
    let closeable = TypeBuilder::interface("io", "Closeable").build()?;
    let entity = account_type()?
        .base()
        .cloned()
        .expect("account extends entity");
    let weekday = TypeBuilder::enumeration("time", "Weekday").build()?;

    assert_eq!(
        ineligible(engine.create_bare(&closeable)),
        "Closeable is abstract."
    );
    assert_eq!(
        ineligible(engine.force_populate(&closeable, NO_MAPPER)),
        "Closeable is abstract."
    );
    assert_eq!(ineligible(engine.create_bare(&entity)), "Entity is abstract.");
    assert_eq!(ineligible(engine.create_bare(&weekday)), "Weekday is an enum.");
    Ok(())
}

/// Every primitive creates its zero value; wrappers create a zero-boxing instance.
#[test]
fn test_create_bare_primitives_and_wrappers() -> Result<()> {
    let engine = InstantiationEngine::new();
    let registry = TypeRegistry::new();

    for kind in [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::I8,
        PrimitiveKind::I16,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
    ] {
        let primitive = corelib().primitive(kind);
        assert_eq!(engine.create_bare(&primitive)?, kind.zero());

        let wrapper = registry.force_wrapper_type(&primitive);
        assert_eq!(wrapper.name(), kind.wrapper_name());
        let boxed = engine.create_bare(&wrapper)?;
        assert_eq!(boxed.unbox(), Some(kind.zero()));
    }

    let object = corelib().object();
    assert!(Arc::ptr_eq(&registry.force_wrapper_type(&object), &object));
    Ok(())
}

/// Forced population writes private and final slots and leaves inherited slots at zero.
#[test]
fn test_force_populate_random_values() -> Result<()> {
    let account = account_type()?;
    let engine = InstantiationEngine::with_config(EngineConfig::strict());
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..32 {
        let balance: f64 = rng.gen();
        let number: i32 = rng.gen();
        let currency: char = rng.gen();
        let owner = format!("owner-{}", rng.gen_range(0..1000));

        let mut values = HashMap::new();
        values.insert("owner", Value::from(owner.as_str()));
        values.insert("balance", Value::F64(balance));
        values.insert("number", Value::I32(number));
        values.insert("currency", Value::Char(currency));

        let first = engine.force_populate(&account, Some(map_by_name(values.clone())))?;
        let second = engine.force_populate(&account, Some(map_by_name(values)))?;
        assert!(!Arc::ptr_eq(&first, &second));

        let repeated = second.as_instance().expect("class instance").slots();
        for ((slot, value), (_, again)) in first
            .as_instance()
            .expect("class instance")
            .slots()
            .iter()
            .zip(&repeated)
        {
            assert_eq!(value, again, "slot {}", slot);
        }

        let instance = first.as_instance().expect("class instance");
        assert_eq!(
            instance.get("owner").as_ref().and_then(Value::as_str),
            Some(owner.as_str())
        );
        assert_eq!(instance.get("balance"), Some(Value::F64(balance)));
        assert_eq!(instance.get("number"), Some(Value::I32(number)));
        assert_eq!(instance.get("currency"), Some(Value::Char(currency)));
        assert_eq!(instance.get("id"), Some(Value::I64(0)));
    }
    Ok(())
}

/// The mapper sees every own slot exactly once, in declaration order.
#[test]
fn test_force_populate_mapper_order() -> Result<()> {
    let account = account_type()?;
    let engine = InstantiationEngine::new();
    let mut seen = Vec::new();

    engine.force_populate(
        &account,
        Some(|slot: &SlotDescriptor| {
            seen.push((slot.index(), slot.name().to_string()));
            Some(slot.slot_type().zero())
        }),
    )?;

    assert_eq!(
        seen,
        vec![
            (0, "owner".to_string()),
            (1, "balance".to_string()),
            (2, "number".to_string()),
            (3, "currency".to_string()),
        ]
    );
    Ok(())
}

/// A mapper that misses a slot fails before anything is allocated.
#[test]
fn test_force_populate_unmapped_slot() -> Result<()> {
    let account = account_type()?;
    let engine = InstantiationEngine::new();

    let mut values = HashMap::new();
    values.insert("owner".to_string(), Value::Null);
    match engine.force_populate(&account, Some(map_by_name(values))) {
        Err(Error::UnmappedSlot { type_name, slot }) => {
            assert_eq!(type_name, "Account");
            assert_eq!(slot, "balance");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert!(matches!(
        engine.force_populate(&account, NO_MAPPER),
        Err(Error::MissingMapper { .. })
    ));
    Ok(())
}

/// Canonical construction through the engine equals direct construction.
#[test]
fn test_construct_canonical_equals_direct() -> Result<()> {
    let range = TypeBuilder::composite("math", "Range")
        .component("low", PrimitiveKind::I32)
        .component("high", PrimitiveKind::I32)
        .component("label", &corelib().string())
        .validator(|args| match (&args[0], &args[1]) {
            (Value::I32(low), Value::I32(high)) if low > high => {
                Err(format!("{} > {}", low, high))
            }
            _ => Ok(()),
        })
        .build()?;
    let engine = InstantiationEngine::new();

    let mut values = HashMap::new();
    values.insert("low", Value::I32(-3));
    values.insert("high", Value::I32(9));
    values.insert("label", Value::from("digits"));

    let via_engine = engine.construct_canonical(&range, Some(map_by_name(values)))?;
    let direct = TypeDescriptor::construct(
        &range,
        vec![Value::I32(-3), Value::I32(9), Value::from("digits")],
    )?;

    assert!(!Arc::ptr_eq(&via_engine, &direct));
    assert_eq!(via_engine, direct);
    assert_eq!(
        via_engine.to_string(),
        "Range { low: -3, high: 9, label: \"digits\" }"
    );

    match engine.construct_canonical(
        &range,
        Some(|slot: &SlotDescriptor| match slot.name() {
            "low" => Some(Value::I32(5)),
            "high" => Some(Value::I32(1)),
            _ => Some(Value::Null),
        }),
    ) {
        Err(Error::ConstructorRejected { type_name, message }) => {
            assert_eq!(type_name, "Range");
            assert_eq!(message, "5 > 1");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

/// The canonical constructor may normalize component values.
#[test]
fn test_construct_canonical_normalizes() -> Result<()> {
    let percent = TypeBuilder::composite("math", "Percent")
        .component("value", PrimitiveKind::F64)
        .validator(|args| {
            if let Value::F64(value) = args[0] {
                args[0] = Value::F64(value.clamp(0.0, 100.0));
            }
            Ok(())
        })
        .build()?;
    let engine = InstantiationEngine::new();

    let object = engine.construct_canonical(
        &percent,
        Some(|_: &SlotDescriptor| Some(Value::F64(140.0))),
    )?;
    assert_eq!(
        object.as_instance().and_then(|i| i.get("value")),
        Some(Value::F64(100.0))
    );
    Ok(())
}

/// A composite covering every primitive kind and a reference builds from zero values.
#[test]
fn test_construct_canonical_all_zero_components() -> Result<()> {
    let everything = TypeBuilder::composite("shapes", "Everything")
        .component("tiny", PrimitiveKind::I8)
        .component("small", PrimitiveKind::I16)
        .component("medium", PrimitiveKind::I32)
        .component("large", PrimitiveKind::I64)
        .component("single", PrimitiveKind::F32)
        .component("double", PrimitiveKind::F64)
        .component("flag", PrimitiveKind::Bool)
        .component("letter", PrimitiveKind::Char)
        .component("object", &corelib().object())
        .build()?;
    let engine = InstantiationEngine::new();

    let built = engine.construct_canonical(
        &everything,
        Some(|slot: &SlotDescriptor| Some(slot.slot_type().zero())),
    )?;
    let bare = engine.create_bare(&everything)?;

    assert_eq!(Value::Ref(built.clone()), bare);
    let instance = built.as_instance().expect("composite instance");
    assert_eq!(instance.slots().len(), 9);
    assert!(instance
        .slots()
        .iter()
        .all(|(slot, value)| *value == slot.slot_type().zero()));
    Ok(())
}

/// Generic slots report their type arguments; plain slots report none.
#[test]
fn test_generic_slot_type_arguments() -> Result<()> {
    let list = TypeBuilder::interface("collections", "List")
        .visibility(Visibility::Public)
        .build()?;
    let roster = TypeBuilder::class("school", "Roster")
        .slot("names", SlotType::generic(&list, [corelib().string()]))
        .slot("size", PrimitiveKind::I32)
        .build()?;

    let names = roster.slot_by_name("names").expect("declared slot");
    let arguments = names.actual_type_arguments().expect("parameterized slot");
    assert_eq!(arguments.len(), 1);
    assert_eq!(arguments[0].token(), corelib().string().token());
    assert_eq!(names.slot_type().name(), "List<String>");

    let size = roster.slot_by_name("size").expect("declared slot");
    assert!(size.actual_type_arguments().is_none());
    Ok(())
}

/// A shared engine instantiates concurrently without sharing identities.
#[test]
fn test_concurrent_instantiation() -> Result<()> {
    let account = account_type()?;
    let engine = InstantiationEngine::new();
    let calls = AtomicUsize::new(0);

    let objects = (0..512)
        .into_par_iter()
        .map(|n| {
            engine.force_populate(
                &account,
                Some(|slot: &SlotDescriptor| {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Some(match slot.name() {
                        "number" => Value::I32(n),
                        _ => slot.slot_type().zero(),
                    })
                }),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(calls.load(Ordering::Relaxed), 512 * 4);
    for (n, object) in objects.iter().enumerate() {
        let instance = object.as_instance().expect("class instance");
        assert_eq!(instance.get("number"), Some(Value::I32(n as i32)));
    }
    for pair in objects.windows(2) {
        assert!(!Arc::ptr_eq(&pair[0], &pair[1]));
    }
    Ok(())
}

/// Arrays are created default-filled within the configured limits.
#[test]
fn test_arrays() -> Result<()> {
    let registry = TypeRegistry::new();
    let strings = registry.array_of(&corelib().string())?;
    let engine = InstantiationEngine::with_config(
        EngineConfig::default().with_limits(EngineLimits::new().with_max_array_length(3)),
    );

    let array = engine.create_array(&strings, 3)?;
    let array = array.as_array().expect("array object");
    assert_eq!(array.len(), 3);
    assert!(array.elements().iter().all(Value::is_null));

    assert!(matches!(
        engine.create_array(&strings, 4),
        Err(Error::ArrayTooLong { length: 4, limit: 3, .. })
    ));
    let empty = engine.create_bare(&strings)?;
    assert!(empty
        .as_object()
        .and_then(|object| object.as_array())
        .is_some_and(ArrayObject::is_empty));
    Ok(())
}

/// Counts every allocation and write while allocating through the raw-memory capability.
struct CountingGateway {
    allocations: AtomicUsize,
    writes: AtomicUsize,
}

static COUNTING_GATEWAY: CountingGateway = CountingGateway {
    allocations: AtomicUsize::new(0),
    writes: AtomicUsize::new(0),
};

// SAFETY: storage comes from `RawMemory::alloc_zeroed` with the type's layout and writes are
// checked by the heap gateway before they are stored.
unsafe impl MemoryGateway for CountingGateway {
    fn allocate_bare(&self, ty: &TypeRef) -> RawInstance {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        // SAFETY: the capability is only used to allocate storage for `ty`.
        let memory = read_privileged_static(unsafe { PrivilegedToken::new() });
        let storage = memory.alloc_zeroed(ty.layout());
        // SAFETY: the storage was just allocated with the layout of `ty`.
        unsafe { RawInstance::from_raw_parts(ty, storage, memory) }
    }

    unsafe fn write_slot(&self, instance: &mut RawInstance, slot: &SlotDescriptor, value: Value) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        heap_gateway().write_slot(instance, slot, value);
    }

    fn new_array(&self, ty: &TypeRef, length: usize) -> ObjectRef {
        heap_gateway().new_array(ty, length)
    }
}

/// A gateway implemented outside the crate serves every engine operation.
#[test]
fn test_custom_gateway() -> Result<()> {
    let account = account_type()?;
    let engine = InstantiationEngine::with_gateway(&COUNTING_GATEWAY, EngineConfig::default());

    let bare = engine.create_bare(&account)?;
    let populated = engine.force_populate(
        &account,
        Some(|slot: &SlotDescriptor| Some(slot.slot_type().zero())),
    )?;

    assert_eq!(COUNTING_GATEWAY.allocations.load(Ordering::SeqCst), 2);
    assert_eq!(COUNTING_GATEWAY.writes.load(Ordering::SeqCst), 4);
    let bare = bare
        .as_object()
        .and_then(|object| object.as_instance())
        .expect("class instance")
        .slots();
    let populated = populated.as_instance().expect("class instance").slots();
    assert_eq!(bare.len(), 5);
    for ((slot, zero), (_, written)) in bare.iter().zip(&populated) {
        assert_eq!(zero, written, "slot {}", slot);
    }
    Ok(())
}
