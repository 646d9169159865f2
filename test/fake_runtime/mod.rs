//! In-process Objective-C runtime stand-in.
//!
//! Classes and objects are `#[repr(C)]` structs whose first field is an
//! `isa` pointer, like real Objective-C objects, and methods are real
//! `extern "C"` functions, so the bridge's function-pointer calls run
//! exactly as they would against libobjc.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{c_void, CStr};
use std::ptr;

use nightshift::ffi::{
    Bridge, ClassPtr, LibraryHandle, ObjcBool, ObjcRuntime, ObjectPtr, RawId, RawImp, RawSel,
    Selector, StatusRecord,
};

pub const CLIENT_CLASS: &str = "CBBlueLightClient";

#[repr(C)]
pub struct FakeClass {
    isa: *mut FakeClass,
    name: String,
    superclass: *const FakeClass,
    methods: RefCell<HashMap<String, RawImp>>,
}

/// Instance state the fake methods read and write.
#[repr(C)]
pub struct FakeClient {
    isa: *mut FakeClass,
    pub enabled: Cell<bool>,
    pub strength: Cell<f32>,
    pub reject_reads: Cell<bool>,
    pub set_enabled_calls: Cell<u32>,
    pub override_calls: Cell<u32>,
}

#[derive(Default)]
pub struct FakeRuntime {
    classes: Vec<Box<FakeClass>>,
    objects: RefCell<Vec<Box<FakeClient>>>,
    selectors: RefCell<Vec<String>>,
    instance_class: HashMap<ClassPtr, ClassPtr>,
    pub initially_enabled: bool,
    pub initial_strength: f32,
    pub fail_instantiation: bool,
    pub class_lookups: Cell<usize>,
    pub method_lookups: Cell<usize>,
    pub instantiations: Cell<usize>,
}

fn fake_class<'a>(class: ClassPtr) -> &'a FakeClass {
    unsafe { &*(class.as_ptr() as *const FakeClass) }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class (and its metaclass) under `name`.
    pub fn define_class(&mut self, name: &str, superclass: Option<ClassPtr>) -> ClassPtr {
        let (super_ptr, super_meta) = match superclass {
            Some(class) => {
                let parent = fake_class(class);
                (parent as *const FakeClass, parent.isa as *const FakeClass)
            }
            None => (ptr::null(), ptr::null()),
        };

        let mut meta = Box::new(FakeClass {
            isa: ptr::null_mut(),
            name: format!("meta:{}", name),
            superclass: super_meta,
            methods: RefCell::default(),
        });
        let mut class = Box::new(FakeClass {
            isa: &mut *meta,
            name: name.to_string(),
            superclass: super_ptr,
            methods: RefCell::default(),
        });

        let class_ptr = ClassPtr::new(&mut *class as *mut FakeClass as *mut c_void)
            .expect("boxed class is non-null");
        self.classes.push(meta);
        self.classes.push(class);
        class_ptr
    }

    pub fn add_method(&mut self, class: ClassPtr, selector: &str, imp: *const ()) {
        let imp = RawImp::new(imp as *mut c_void).expect("null method");
        fake_class(class)
            .methods
            .borrow_mut()
            .insert(selector.to_string(), imp);
    }

    pub fn add_class_method(&mut self, class: ClassPtr, selector: &str, imp: *const ()) {
        let meta = self.metaclass_of(class);
        self.add_method(meta, selector, imp);
    }

    /// Make `[[nominal alloc] init]` return an instance of `actual`, the
    /// way class clusters do.
    pub fn instantiate_as(&mut self, nominal: ClassPtr, actual: ClassPtr) {
        self.instance_class.insert(nominal, actual);
    }

    pub fn metaclass_of(&self, class: ClassPtr) -> ClassPtr {
        ClassPtr::new(fake_class(class).isa as *mut c_void).expect("class without metaclass")
    }

    fn selector_name(&self, selector: Selector) -> Option<String> {
        let index = (selector.as_ptr() as usize).checked_sub(1)?;
        self.selectors.borrow().get(index).cloned()
    }
}

impl ObjcRuntime for FakeRuntime {
    fn class_named(&self, name: &CStr) -> Option<ClassPtr> {
        self.class_lookups.set(self.class_lookups.get() + 1);
        let name = name.to_str().ok()?;
        self.classes
            .iter()
            .find(|class| class.name == name)
            .and_then(|class| ClassPtr::new(&**class as *const FakeClass as *mut c_void))
    }

    fn selector(&self, name: &CStr) -> Selector {
        let name = name.to_string_lossy().into_owned();
        let mut selectors = self.selectors.borrow_mut();
        let index = match selectors.iter().position(|s| *s == name) {
            Some(index) => index,
            None => {
                selectors.push(name);
                selectors.len() - 1
            }
        };
        Selector::from_raw((index + 1) as RawSel)
    }

    fn class_of(&self, object: ObjectPtr) -> Option<ClassPtr> {
        let isa = unsafe { *(object.as_ptr() as *const *mut FakeClass) };
        ClassPtr::new(isa as *mut c_void)
    }

    fn method_implementation(&self, class: ClassPtr, selector: Selector) -> Option<RawImp> {
        self.method_lookups.set(self.method_lookups.get() + 1);
        let name = self.selector_name(selector)?;

        let mut current = class.as_ptr() as *const FakeClass;
        while !current.is_null() {
            let class = unsafe { &*current };
            if let Some(imp) = class.methods.borrow().get(&name) {
                return Some(*imp);
            }
            current = class.superclass;
        }
        None
    }

    fn instantiate(&self, class: ClassPtr) -> Option<ObjectPtr> {
        self.instantiations.set(self.instantiations.get() + 1);
        if self.fail_instantiation {
            return None;
        }

        let actual = self.instance_class.get(&class).copied().unwrap_or(class);
        let object = Box::new(FakeClient {
            isa: actual.as_ptr() as *mut FakeClass,
            enabled: Cell::new(self.initially_enabled),
            strength: Cell::new(self.initial_strength),
            reject_reads: Cell::new(false),
            set_enabled_calls: Cell::new(0),
            override_calls: Cell::new(0),
        });
        let raw = &*object as *const FakeClient as *mut c_void;
        self.objects.borrow_mut().push(object);
        ObjectPtr::new(raw)
    }
}

// Method implementations.

unsafe fn client<'a>(this: RawId) -> &'a FakeClient {
    &*(this as *const FakeClient)
}

pub unsafe extern "C" fn get_status(this: RawId, _cmd: RawSel, out: *mut StatusRecord) -> ObjcBool {
    let client = client(this);
    if client.reject_reads.get() {
        return ObjcBool::NO;
    }
    *out = StatusRecord {
        enabled: client.enabled.get().into(),
        sun_schedule_permitted: ObjcBool::YES,
        available: ObjcBool::YES,
        active: client.enabled.get().into(),
        mode: 1,
        schedule: 0,
        disable_flags: 0,
        available_options: 0x3,
    };
    ObjcBool::YES
}

pub unsafe extern "C" fn set_enabled(this: RawId, _cmd: RawSel, value: ObjcBool) -> ObjcBool {
    let client = client(this);
    client.enabled.set(value.is_true());
    client.set_enabled_calls.set(client.set_enabled_calls.get() + 1);
    ObjcBool::YES
}

pub unsafe extern "C" fn override_set_enabled(
    this: RawId,
    cmd: RawSel,
    value: ObjcBool,
) -> ObjcBool {
    let client = client(this);
    client.override_calls.set(client.override_calls.get() + 1);
    set_enabled(this, cmd, value)
}

pub unsafe extern "C" fn get_strength(this: RawId, _cmd: RawSel, out: *mut f32) -> ObjcBool {
    let client = client(this);
    if client.reject_reads.get() {
        return ObjcBool::NO;
    }
    *out = client.strength.get();
    ObjcBool::YES
}

pub unsafe extern "C" fn set_strength(
    this: RawId,
    _cmd: RawSel,
    value: f32,
    commit: ObjcBool,
) -> ObjcBool {
    if commit.is_true() {
        client(this).strength.set(value);
    }
    ObjcBool::YES
}

pub unsafe extern "C" fn supports_blue_light(_class: RawId, _cmd: RawSel) -> ObjcBool {
    ObjcBool::YES
}

/// A runtime defining `CBBlueLightClient` with every method the bridge uses.
pub fn night_shift_runtime() -> (FakeRuntime, ClassPtr) {
    let mut runtime = FakeRuntime::new();
    let class = runtime.define_class(CLIENT_CLASS, None);
    runtime.add_method(class, "getBlueLightStatus:", get_status as *const ());
    runtime.add_method(class, "setEnabled:", set_enabled as *const ());
    runtime.add_method(class, "getStrength:", get_strength as *const ());
    runtime.add_method(class, "setStrength:commit:", set_strength as *const ());
    runtime.add_class_method(class, "supportsBlueLightReduction", supports_blue_light as *const ());
    (runtime, class)
}

pub fn connect(runtime: FakeRuntime) -> Bridge<FakeRuntime> {
    let library = LibraryHandle::current_process().expect("Failed to open own image");
    Bridge::connect(runtime, library, CLIENT_CLASS).expect("Failed to connect bridge")
}

/// The fake object behind the bridge's instance.
pub fn state(bridge: &Bridge<FakeRuntime>) -> &FakeClient {
    unsafe { &*(bridge.instance().object().as_ptr() as *const FakeClient) }
}
