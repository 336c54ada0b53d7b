//! Property-based tests for the composite-instance fold.
//!
//! These tests generate random fragment lists and check that the merge
//! rules hold for every input.

#[cfg(test)]
mod proptest_tests {
    use crate::fragment::Fragment;
    use crate::instance::build;
    use proptest::prelude::*;

    fn arb_fragment() -> impl Strategy<Value = Fragment> {
        (
            "[a-z]{1,6}",
            proptest::option::of("[a-z]{1,4}"),
            proptest::collection::vec("/[a-z]{1,4}", 0..4),
            proptest::collection::vec(("[A-C]", "[0-9]{1,2}"), 0..4),
            proptest::collection::vec(1000u16..1010, 0..3),
            proptest::collection::vec("[a-z]{1,3}", 0..3),
        )
            .prop_map(|(role, image, volumes, env, ports, hosts)| {
                let mut fragment = Fragment::new(role);
                if let Some(image) = image {
                    fragment = fragment.image(image);
                }
                for volume in volumes {
                    fragment = fragment.volume_spec(volume);
                }
                for (key, value) in env {
                    fragment = fragment.env(key, value);
                }
                for port in ports {
                    fragment = fragment.port(port, port);
                }
                for host in hosts {
                    fragment = fragment.host(host);
                }
                fragment
            })
    }

    fn arb_fragments() -> impl Strategy<Value = Vec<Fragment>> {
        proptest::collection::vec(arb_fragment(), 0..6)
    }

    proptest! {
        /// Property: the fold is deterministic
        #[test]
        fn build_is_deterministic(fragments in arb_fragments()) {
            prop_assert_eq!(build("node", &fragments), build("node", &fragments));
        }

        /// Property: folding every fragment twice changes nothing
        #[test]
        fn build_is_idempotent(fragments in arb_fragments()) {
            let once = build("node", &fragments);
            let doubled: Vec<Fragment> = fragments.iter().chain(fragments.iter()).cloned().collect();
            let twice = build("node", &doubled);
            prop_assert_eq!(once.volumes(), twice.volumes());
            prop_assert_eq!(once.ports(), twice.ports());
            prop_assert_eq!(once.hosts(), twice.hosts());
            prop_assert_eq!(once.environment(), twice.environment());
            prop_assert_eq!(once.image(), twice.image());
        }

        /// Property: list fields are the duplicate-free union of every fragment
        #[test]
        fn lists_are_unions(fragments in arb_fragments()) {
            let instance = build("node", &fragments);
            for fragment in &fragments {
                for volume in fragment.volumes() {
                    prop_assert!(instance.volumes().contains(volume));
                }
                for port in fragment.ports() {
                    prop_assert!(instance.ports().contains(port));
                }
            }
            let mut sorted = instance.volumes().to_vec();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), instance.volumes().len());
        }

        /// Property: the first declared image wins
        #[test]
        fn image_is_first_declaration(fragments in arb_fragments()) {
            let instance = build("node", &fragments);
            let first = fragments.iter().find_map(|f| f.declared_image());
            prop_assert_eq!(instance.image(), first);
        }

        /// Property: every environment key holds the value of its last writer
        #[test]
        fn environment_is_last_wins(fragments in arb_fragments()) {
            let instance = build("node", &fragments);
            for (key, value) in instance.environment() {
                let last = fragments
                    .iter()
                    .rev()
                    .find_map(|f| f.environment().get(key))
                    .cloned();
                prop_assert_eq!(Some(value.clone()), last);
            }
        }
    }
}
