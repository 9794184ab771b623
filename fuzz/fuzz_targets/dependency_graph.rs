#![no_main]

use ferrous_autowire::{Container, ErrorKind, Params, ServiceId};
use libfuzzer_sys::fuzz_target;

const NODES: u8 = 8;

fn node(n: u8) -> ServiceId {
    ServiceId::from(format!("node{}", n % NODES))
}

fuzz_target!(|data: &[u8]| {
    let mut container = Container::new();
    let mut edges: Vec<Vec<ServiceId>> = vec![Vec::new(); usize::from(NODES)];

    // Each byte is an edge: high nibble depends on low nibble
    for byte in data.iter().take(64) {
        let from = usize::from((byte >> 4) % NODES);
        edges[from].push(node(byte & 0x0f));
    }

    for (n, deps) in edges.into_iter().enumerate() {
        let shared = n % 2 == 0;
        let id = node(n as u8);
        let build = move |c: &Container, _: &Params| {
            for dep in &deps {
                c.resolve(dep)?;
            }
            Ok(n)
        };
        let result = if shared {
            container.singleton_factory(id, build)
        } else {
            container.factory(id, build)
        };
        assert!(result.is_ok());
    }

    for n in 0..NODES {
        match container.resolve(node(n)) {
            Ok(_) => {}
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::CircularDependency);
                let cycle = err.cycle();
                assert!(cycle.len() >= 2);
                assert_eq!(cycle.first(), cycle.last());
            }
        }
        assert!(container.resolution_chain().is_empty());
    }
});
