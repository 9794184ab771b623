#![no_main]

use ferrous_autowire::{AnyArc, Container, ErrorKind, Implementation, Lifetime, Resolver};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const IDS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

fn pick(byte: u8) -> &'static str {
    IDS[usize::from(byte) % IDS.len()]
}

fuzz_target!(|data: &[u8]| {
    let mut container = Container::new();

    // Two bytes per operation: opcode, operand
    for op in data.chunks_exact(2) {
        let id = pick(op[1]);
        match op[0] % 10 {
            0 => {
                let value = op[1];
                let _ = container.bind(id, Implementation::typed(move |_, _| Ok(value)), Lifetime::Singleton, op[0] & 0x80 != 0);
            }
            1 => {
                let value = op[1];
                let _ = container.factory(id, move |_, _| Ok(value));
            }
            2 => {
                let _ = container.instance(id, Arc::new(op[1]));
            }
            3 => {
                let _ = container.unbind(id);
                assert!(!container.has_binding(id));
            }
            4 => {
                let merge = op[0] & 0x80 != 0;
                let _ = container.tag("group", [id, pick(op[1].wrapping_add(1))], merge);
            }
            5 => {
                let _ = container.extend(id, |value: AnyArc, _: &Container| Ok(value));
            }
            6 => match container.resolve(id) {
                Ok(value) => {
                    assert!(value.downcast_ref::<u8>().is_some());
                    if container.is_shared(id) {
                        assert!(container.is_resolved(id));
                    }
                }
                Err(err) => assert_eq!(err.kind(), ErrorKind::ServiceNotFound),
            },
            7 => {
                if let Ok(values) = container.tagged::<u8>("group") {
                    assert_eq!(values.len(), container.tagged_ids("group").len());
                }
            }
            8 => {
                container.forget_instance(id);
            }
            _ => {
                container.reset();
                assert!(container.descriptors().is_empty());
                assert!(container.tags().is_empty());
            }
        }
        assert!(container.resolution_chain().is_empty());
    }
});
